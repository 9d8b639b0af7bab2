//! Request Tests
//!
//! Tests for request validation and response formatting.

use tabwire::compute::cube_root;
use tabwire::error::ValidationError;
use tabwire::protocol::{format_cube_root, parse_request};

// =============================================================================
// Validation Tests
// =============================================================================

#[test]
fn test_parse_valid_integer() {
    assert_eq!(parse_request("42"), Ok(42));
    assert_eq!(parse_request("-8"), Ok(-8));
    assert_eq!(parse_request("0"), Ok(0));
}

#[test]
fn test_parse_i32_bounds() {
    assert_eq!(parse_request("2147483647"), Ok(i32::MAX));
    assert_eq!(parse_request("-2147483648"), Ok(i32::MIN));
}

#[test]
fn test_parse_not_integer() {
    let err = parse_request("abc").unwrap_err();
    assert_eq!(err, ValidationError::NotInteger("abc".to_string()));
    assert_eq!(err.to_string(), "\"abc\" is not integer");
}

#[test]
fn test_parse_empty_and_whitespace() {
    assert!(matches!(parse_request(""), Err(ValidationError::NotInteger(_))));
    assert!(matches!(parse_request(" 1"), Err(ValidationError::NotInteger(_))));
    assert!(matches!(parse_request("1.5"), Err(ValidationError::NotInteger(_))));
}

#[test]
fn test_parse_out_of_range() {
    let err = parse_request("99999999999").unwrap_err();
    assert_eq!(err, ValidationError::OutOfRange(99_999_999_999));
    assert_eq!(err.to_string(), "99999999999 is not 32-bit integer");

    assert_eq!(
        parse_request("2147483648"),
        Err(ValidationError::OutOfRange(2_147_483_648))
    );
    assert_eq!(
        parse_request("-2147483649"),
        Err(ValidationError::OutOfRange(-2_147_483_649))
    );
}

#[test]
fn test_parse_beyond_i64_is_not_integer() {
    let err = parse_request("99999999999999999999").unwrap_err();
    assert!(matches!(err, ValidationError::NotInteger(_)));
}

// =============================================================================
// Response Formatting Tests
// =============================================================================

#[test]
fn test_format_positive_cube() {
    let text = format_cube_root(8, cube_root(8));
    assert_eq!(text, "The cube root of 8 is 2.000000.");
}

#[test]
fn test_format_negative_cube() {
    let text = format_cube_root(-8, cube_root(-8));
    assert_eq!(text, "The cube root of -8 is -2.000000.");
}

#[test]
fn test_format_non_perfect_cube() {
    let text = format_cube_root(2, cube_root(2));
    assert_eq!(text, "The cube root of 2 is 1.259921.");
}
