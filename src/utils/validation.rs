//! Validation utilities

use crate::traits::*;

/// Check whether a key looks like a number written with an exponent
///
/// Matches renderings such as `1.23E+11` or `5e3` that spreadsheet tools
/// produce for long numeric identifiers. Ordinary alphanumeric keys that
/// merely contain the letter `e` are not matched.
pub fn is_scientific_notation(key: &str) -> bool {
    let unsigned = key.strip_prefix(['+', '-']).unwrap_or(key);
    let Some(split) = unsigned.find(['e', 'E']) else {
        return false;
    };
    let (mantissa, exponent) = (&unsigned[..split], &unsigned[split + 1..]);

    let mut digits = 0;
    let mut dots = 0;
    for c in mantissa.chars() {
        match c {
            '0'..='9' => digits += 1,
            '.' => dots += 1,
            _ => return false,
        }
    }
    if digits == 0 || dots > 1 {
        return false;
    }

    let exponent = exponent.strip_prefix(['+', '-']).unwrap_or(exponent);
    !exponent.is_empty() && exponent.chars().all(|c| c.is_ascii_digit())
}

/// Check whether a key carries a decimal point
pub fn has_decimal_point(key: &str) -> bool {
    key.contains('.')
}

/// Check whether a key is made of letters and digits only
///
/// An empty key is not alphanumeric.
pub fn is_alphanumeric_key(key: &str) -> bool {
    !key.is_empty() && key.chars().all(char::is_alphanumeric)
}

/// Key validator flagging spreadsheet-mangled transaction references
pub struct DefaultKeyValidator;

impl KeyValidator for DefaultKeyValidator {
    fn validate_key(&self, key: &str) -> Vec<KeyIssue> {
        let mut issues = Vec::new();

        if is_scientific_notation(key) {
            issues.push(KeyIssue::ScientificNotation);
        }

        if has_decimal_point(key) {
            issues.push(KeyIssue::DecimalPoint);
        }

        if !is_alphanumeric_key(key) {
            issues.push(KeyIssue::NonAlphanumeric);
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scientific_notation_detection() {
        assert!(is_scientific_notation("1.23E+11"));
        assert!(is_scientific_notation("5e3"));
        assert!(is_scientific_notation("-4.5e-2"));
        assert!(!is_scientific_notation("TXE123"));
        assert!(!is_scientific_notation("e5"));
        assert!(!is_scientific_notation("1.2E"));
        assert!(!is_scientific_notation("123456"));
    }

    #[test]
    fn test_clean_key_has_no_issues() {
        assert!(DefaultKeyValidator.validate_key("ABC123").is_empty());
    }

    #[test]
    fn test_mangled_key_reports_every_issue() {
        let issues = DefaultKeyValidator.validate_key("1.23E+11");
        assert_eq!(
            issues,
            vec![
                KeyIssue::ScientificNotation,
                KeyIssue::DecimalPoint,
                KeyIssue::NonAlphanumeric
            ]
        );
    }

    #[test]
    fn test_decimal_key() {
        let issues = DefaultKeyValidator.validate_key("12345.0");
        assert_eq!(issues, vec![KeyIssue::DecimalPoint, KeyIssue::NonAlphanumeric]);
    }

    #[test]
    fn test_empty_key_is_non_alphanumeric() {
        assert_eq!(
            DefaultKeyValidator.validate_key(""),
            vec![KeyIssue::NonAlphanumeric]
        );
    }

    #[test]
    fn test_permissive_validator() {
        assert!(PermissiveKeyValidator.validate_key("1.23E+11").is_empty());
    }
}
