//! Object level of an allocation code
//!
//! A BSMI code is a 4-digit number whose trailing zeros encode its depth in
//! the breakdown: `1000` is level 1, `1200` level 2, `1230` level 3 and
//! `1234` level 4.

use crate::error::{BsmiError, Result};

/// Computes the object level of a 4-digit allocation code
///
/// The level is `4 - <number of trailing zeros>`, so `"0000"` yields `"0"`.
pub fn compute_object_level(code: &str) -> Result<String> {
    if code.len() != 4 || !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(BsmiError::InvalidCodeFormat(code.to_string()));
    }

    let trailing_zeros = code.bytes().rev().take_while(|b| *b == b'0').count();

    Ok((4 - trailing_zeros).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels() {
        assert_eq!(compute_object_level("1000").unwrap(), "1");
        assert_eq!(compute_object_level("1200").unwrap(), "2");
        assert_eq!(compute_object_level("1230").unwrap(), "3");
        assert_eq!(compute_object_level("1234").unwrap(), "4");
    }

    #[test]
    fn test_inner_zeros_do_not_count() {
        assert_eq!(compute_object_level("1004").unwrap(), "4");
        assert_eq!(compute_object_level("1020").unwrap(), "3");
    }

    #[test]
    fn test_all_zeros_is_level_zero() {
        // boundary case: four trailing zeros gives level 0, outside 1..=4
        assert_eq!(compute_object_level("0000").unwrap(), "0");
    }

    #[test]
    fn test_every_nonzero_code_is_in_range() {
        for n in 1..10_000 {
            let code = format!("{:04}", n);
            let level = compute_object_level(&code).unwrap();
            assert!(["1", "2", "3", "4"].contains(&level.as_str()), "{code} -> {level}");
        }
    }

    #[test]
    fn test_invalid_codes() {
        for code in ["123", "12345", "", "12a4", " 123", "-100", "１２３４"] {
            let err = compute_object_level(code).unwrap_err();
            assert!(matches!(err, BsmiError::InvalidCodeFormat(ref c) if c == code));
        }
    }
}
