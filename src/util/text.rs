use std::borrow::Cow;

/// Normalizes a feed title extracted from XML.
///
/// Control characters are dropped, runs of whitespace (including the
/// newlines and indentation that pretty-printed feeds put around CDATA
/// sections) collapse to a single space, and the result is trimmed.
///
/// Returns `Cow::Borrowed` when the input is already clean.
///
/// # Examples
///
/// ```
/// use feedsub::util::clean_title;
///
/// assert_eq!(clean_title("  Example\n   Blog \u{7}"), "Example Blog");
/// assert_eq!(clean_title("Plain"), "Plain");
/// ```
pub fn clean_title(raw: &str) -> Cow<'_, str> {
    let trimmed = raw.trim();

    let needs_rewrite = trimmed.chars().any(|c| c.is_control())
        || trimmed
            .as_bytes()
            .windows(2)
            .any(|w| w[0].is_ascii_whitespace() && w[1].is_ascii_whitespace());

    if !needs_rewrite {
        return Cow::Borrowed(trimmed);
    }

    let mut out = String::with_capacity(trimmed.len());
    let mut pending_space = false;

    for c in trimmed.chars() {
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if c.is_control() {
            continue;
        }
        if pending_space && !out.is_empty() {
            out.push(' ');
        }
        pending_space = false;
        out.push(c);
    }

    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_title_borrows_when_clean() {
        let result = clean_title("Example Blog");
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(result, "Example Blog");
    }

    #[test]
    fn test_clean_title_trims_without_allocating() {
        let result = clean_title("\n  Example Blog  \n");
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(result, "Example Blog");
    }

    #[test]
    fn test_clean_title_collapses_inner_whitespace() {
        assert_eq!(clean_title("Example\n\t   Blog"), "Example Blog");
    }

    #[test]
    fn test_clean_title_strips_control_chars() {
        assert_eq!(clean_title("Evil\x1b Feed\x00"), "Evil Feed");
        assert_eq!(clean_title("del\x7fete"), "delete");
    }

    #[test]
    fn test_clean_title_empty_stays_empty() {
        assert_eq!(clean_title(""), "");
        assert_eq!(clean_title("   \n "), "");
    }

    #[test]
    fn test_clean_title_keeps_unicode() {
        assert_eq!(clean_title("Blog  über Rust 🦀"), "Blog über Rust 🦀");
    }
}
