//! Conversions from the string values reported in simulator telemetry.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::num::ParseFloatError;

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Parse a float from a telemetry string, accepting either a decimal point or a decimal comma.
///
/// The simulator formats numbers using the host locale, so `"0,25"` and `"0.25"` must both parse
/// to the same value.
pub fn telem_str_to_f64(s: &str) -> Result<f64, ParseFloatError> {
    let s = s.trim();

    if s.contains(',') {
        s.replace(',', ".").parse()
    }
    else {
        s.parse()
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_decimal_comma() {
        assert_eq!(telem_str_to_f64("0,25").unwrap(), 0.25);
        assert_eq!(telem_str_to_f64(" 0.25 ").unwrap(), 0.25);
        assert_eq!(telem_str_to_f64("-12").unwrap(), -12.0);
        assert!(telem_str_to_f64("inf").unwrap().is_infinite());
        assert!(telem_str_to_f64("abc").is_err());
    }
}
