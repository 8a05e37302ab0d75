//! Pluralization utilities.

/// Return "s" suffix for plural counts
#[inline]
pub fn plural_s(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}

/// Format count with noun, handling pluralization
///
/// # Examples
///
/// - `plural_count(0, "text element")` -> `"0 text elements"`
/// - `plural_count(1, "text element")` -> `"1 text element"`
#[inline]
pub fn plural_count(count: usize, noun: &str) -> String {
    format!("{} {}{}", count, noun, plural_s(count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plural_count() {
        assert_eq!(plural_count(0, "path"), "0 paths");
        assert_eq!(plural_count(1, "text element"), "1 text element");
        assert_eq!(plural_count(3, "text element"), "3 text elements");
    }
}
