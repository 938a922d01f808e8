//! Deterministic, filesystem-safe artifact names.
//!
//! Links embed these names, so the scheme must stay bit-exact across
//! releases.

const MAX_LENGTH: usize = 40;

fn is_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')
}

/// Polynomial string hash (`h * 31 + unit`) over UTF-16 code units
fn name_hash(s: &str) -> u32 {
    s.encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(unit as i32)) as u32
}

/// File name for an artifact derived from `original`.
///
/// Names that are already safe and short are kept. Anything else is
/// sanitized, truncated and suffixed with a hash of the original so that
/// distinct inputs stay distinct.
pub fn file_name(original: &str) -> String {
    let sanitized: String = original
        .chars()
        .map(|c| if is_safe(c) { c } else { '_' })
        .collect();

    if sanitized.len() <= MAX_LENGTH && sanitized.eq_ignore_ascii_case(original) {
        return sanitized;
    }

    let hex = format!("{:x}", name_hash(original));
    let target = (MAX_LENGTH - 1 - hex.len()).min(sanitized.len());
    format!("{}_{}", &sanitized[..target], hex)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_name_is_kept() {
        assert_eq!(file_name("file.name"), "file.name");
        assert_eq!(file_name("order-lines_2"), "order-lines_2");
    }

    #[test]
    fn test_unsafe_characters_are_hashed() {
        assert_eq!(
            file_name("Test\tif/name/is#fixed or not"),
            "Test_if_name_is_fixed_or_not_f9e4eeb2"
        );
        assert_eq!(file_name("order details"), "order_details_c1b2e770");
    }

    #[test]
    fn test_non_ascii_uses_utf16_hash() {
        assert_eq!(file_name("こんにちは"), "______bfca3f39");
    }

    #[test]
    fn test_long_names_are_truncated() {
        let forty = "1234567890123456789012345678901234567890";
        assert_eq!(file_name(forty), forty);
        let result = file_name("12345678901234567890123456789012345678901");
        assert_eq!(result, "1234567890123456789012345678901_6e3e05c5");
        assert_eq!(result.len(), MAX_LENGTH);
    }

    #[test]
    fn test_deterministic_and_distinct() {
        let a = file_name("Test\tif/name/is#fixed or not");
        let b = file_name("Test\tif\tname/is#fixed or not");
        assert_eq!(a, file_name("Test\tif/name/is#fixed or not"));
        assert_ne!(a, b);
        assert!(b.ends_with("_1b307d8c"));
    }
}
