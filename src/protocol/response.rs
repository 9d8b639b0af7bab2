//! Response formatting

/// Format a computed cube root the way the server replies
///
/// The value always carries six fractional digits, e.g.
/// `The cube root of 8 is 2.000000.`
pub fn format_cube_root(n: i32, value: f64) -> String {
    format!("The cube root of {} is {:.6}.", n, value)
}
