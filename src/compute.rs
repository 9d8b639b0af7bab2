//! Numeric engine
//!
//! The pure function the server applies to every valid request.

/// Real cube root of `n`
pub fn cube_root(n: i32) -> f64 {
    f64::from(n).cbrt()
}
