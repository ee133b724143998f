//! Token amount conversion
//!
//! Amounts travel through the workflow as `U256` smallest units. Only user
//! input and final display use decimal strings, scaled by the decimals the
//! token contract itself reports.

use alloy::primitives::U256;

use crate::error::AmountError;

/// Largest precision whose scaling factor fits in a `U256`
pub const MAX_DECIMALS: u8 = 77;

/// `10^decimals` as a `U256`
pub fn pow10(decimals: u8) -> Result<U256, AmountError> {
    if decimals > MAX_DECIMALS {
        return Err(AmountError::Precision(decimals));
    }
    Ok(U256::from(10u8).pow(U256::from(decimals)))
}

/// Number of digits after the decimal point in `amount`
pub fn fraction_digits(amount: &str) -> usize {
    amount
        .trim()
        .split_once('.')
        .map(|(_, fraction)| fraction.len())
        .unwrap_or(0)
}

/// Convert a decimal string such as `"100.5"` into smallest units.
///
/// Fractional digits beyond `decimals` are truncated, not rounded.
pub fn parse_units(amount: &str, decimals: u8) -> Result<U256, AmountError> {
    if decimals > MAX_DECIMALS {
        return Err(AmountError::Precision(decimals));
    }

    let trimmed = amount.trim();
    if trimmed.is_empty() {
        return Err(AmountError::Empty);
    }

    let (whole, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));
    let is_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty()) || !is_digits(whole) || !is_digits(fraction) {
        return Err(AmountError::Malformed(amount.to_string()));
    }

    let precision = decimals as usize;
    let mut digits = String::with_capacity(whole.len() + precision);
    digits.push_str(whole);
    digits.push_str(&fraction[..fraction.len().min(precision)]);
    digits.extend(std::iter::repeat('0').take(precision.saturating_sub(fraction.len())));

    if digits.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(&digits, 10).map_err(|_| AmountError::Overflow(amount.to_string()))
}

/// Render smallest units as a decimal string, e.g. `10050` with 2 decimals
/// becomes `"100.5"`. At least one fractional digit is always shown.
pub fn format_units(value: U256, decimals: u8) -> String {
    let digits = value.to_string();
    let precision = decimals as usize;

    let padded = if digits.len() <= precision {
        format!("{}{}", "0".repeat(precision - digits.len() + 1), digits)
    } else {
        digits
    };

    let (whole, fraction) = padded.split_at(padded.len() - precision);
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        format!("{whole}.0")
    } else {
        format!("{whole}.{fraction}")
    }
}

//-----------------------------------------------------------------------------
// Tests
//-----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_units() {
        assert_eq!(parse_units("100.5", 2), Ok(U256::from(10050)));
        assert_eq!(parse_units("100", 0), Ok(U256::from(100)));
        assert_eq!(parse_units(" 1 ", 6), Ok(U256::from(1_000_000)));
        assert_eq!(parse_units(".5", 1), Ok(U256::from(5)));
        assert_eq!(parse_units("5.", 1), Ok(U256::from(50)));
        assert_eq!(parse_units("0", 18), Ok(U256::ZERO));
        assert_eq!(
            parse_units("1", 18),
            Ok(U256::from(1_000_000_000_000_000_000u128))
        );
    }

    #[test]
    fn test_parse_units_truncates_excess_precision() {
        assert_eq!(parse_units("1.239", 2), Ok(U256::from(123)));
        assert_eq!(parse_units("0.9", 0), Ok(U256::ZERO));
        assert_eq!(fraction_digits("1.239"), 3);
        assert_eq!(fraction_digits("7"), 0);
    }

    #[test]
    fn test_parse_units_rejects_malformed_input() {
        assert_eq!(parse_units("", 2), Err(AmountError::Empty));
        assert_eq!(parse_units("   ", 2), Err(AmountError::Empty));
        for bad in [".", "-1", "1e5", "1.2.3", "abc", "0x10", "1,5", "+3"] {
            assert_eq!(
                parse_units(bad, 2),
                Err(AmountError::Malformed(bad.to_string())),
                "{bad} should be rejected"
            );
        }
        assert_eq!(parse_units("1", 78), Err(AmountError::Precision(78)));
    }

    #[test]
    fn test_parse_units_overflow() {
        let huge = "1".repeat(80);
        assert_eq!(parse_units(&huge, 0), Err(AmountError::Overflow(huge.clone())));
    }

    #[test]
    fn test_format_units() {
        assert_eq!(format_units(U256::from(10050), 2), "100.5");
        assert_eq!(format_units(U256::from(1000), 0), "1000.0");
        assert_eq!(format_units(U256::from(1), 6), "0.000001");
        assert_eq!(format_units(U256::ZERO, 18), "0.0");
        assert_eq!(format_units(U256::from(1_500_000), 6), "1.5");
        assert_eq!(format_units(U256::MAX, 0), format!("{}.0", U256::MAX));
    }

    #[test]
    fn test_pow10() {
        assert_eq!(pow10(0), Ok(U256::from(1)));
        assert_eq!(pow10(6), Ok(U256::from(1_000_000)));
        assert!(pow10(MAX_DECIMALS).is_ok());
        assert_eq!(pow10(MAX_DECIMALS + 1), Err(AmountError::Precision(78)));
    }

    proptest! {
        #[test]
        fn prop_decimal_round_trip_truncates_at_precision(
            whole in any::<u64>(),
            fraction in "[0-9]{0,24}",
            decimals in 0u8..=24,
        ) {
            let input = format!("{whole}.{fraction}");
            let units = parse_units(&input, decimals).unwrap();

            let kept = &fraction[..fraction.len().min(decimals as usize)];
            let kept = kept.trim_end_matches('0');
            let expected = if kept.is_empty() {
                format!("{whole}.0")
            } else {
                format!("{whole}.{kept}")
            };
            prop_assert_eq!(format_units(units, decimals), expected);
        }

        #[test]
        fn prop_formatting_is_idempotent(raw in any::<u128>(), decimals in 0u8..=30) {
            let value = U256::from(raw);
            let formatted = format_units(value, decimals);
            prop_assert_eq!(parse_units(&formatted, decimals).unwrap(), value);
        }
    }
}
