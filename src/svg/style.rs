//! Inline `style` attribute edits.

/// Declaration that keeps an overlay text from painting over its path.
pub const HIDE_FILL: &str = "fill-opacity: 0;";

/// Append [`HIDE_FILL`] to an inline style.
///
/// A non-empty style that does not end with `;` gets one first, so the new
/// declaration is never glued onto the previous value.
pub fn hide_fill(style: Option<&str>) -> String {
    let mut style = style.unwrap_or_default().to_string();
    if !style.is_empty() && !style.ends_with(';') {
        style.push(';');
    }
    style.push_str(HIDE_FILL);
    style
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hide_fill_without_style() {
        assert_eq!(hide_fill(None), "fill-opacity: 0;");
        assert_eq!(hide_fill(Some("")), "fill-opacity: 0;");
    }

    #[test]
    fn test_hide_fill_adds_separator() {
        assert_eq!(hide_fill(Some("fill:#000")), "fill:#000;fill-opacity: 0;");
    }

    #[test]
    fn test_hide_fill_keeps_existing_separator() {
        assert_eq!(
            hide_fill(Some("font-size:12px;fill:red;")),
            "font-size:12px;fill:red;fill-opacity: 0;"
        );
    }
}
