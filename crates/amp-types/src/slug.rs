//! Display-name normalization.
//!
//! A slug is the path-safe token derived from an item's display name:
//! - lowercase ASCII letters and digits only, separated by single hyphens
//! - no leading or trailing hyphen
//! - empty when the name has no ASCII alphanumerics at all

/// Normalize a display name into a slug.
///
/// Lowercases, collapses every run of characters outside `[a-z0-9]` into a
/// single `-`, and trims hyphens at both ends. Total and deterministic. Empty
/// output is possible, and callers must substitute a fallback.
///
/// # Examples
///
/// ```
/// use amp_types::slugify;
///
/// assert_eq!(slugify("Report!!.md"), "report-md");
/// assert_eq!(slugify("  Q3 -- Plan  "), "q3-plan");
/// assert_eq!(slugify("!!!"), "");
/// ```
pub fn slugify(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for ch in name.trim().chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.push(ch);
        } else {
            pending_hyphen = true;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn lowercases_and_hyphenates() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("notes.md"), "notes-md");
    }

    #[test]
    fn collapses_runs() {
        assert_eq!(slugify("a   b___c"), "a-b-c");
        assert_eq!(slugify("Report!!.md"), "report-md");
    }

    #[test]
    fn trims_hyphens() {
        assert_eq!(slugify("--draft--"), "draft");
        assert_eq!(slugify("(final)"), "final");
    }

    #[test]
    fn empty_and_symbol_only_inputs() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("   "), "");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn non_ascii_becomes_separator() {
        assert_eq!(slugify("Café Menu"), "caf-menu");
        assert_eq!(slugify("日本"), "");
    }

    #[test]
    fn colliding_display_names() {
        assert_eq!(slugify("Report!!.md"), slugify("report.md"));
    }

    proptest! {
        #[test]
        fn output_charset(name in ".*") {
            let slug = slugify(&name);
            prop_assert!(slug
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
            prop_assert!(!slug.starts_with('-'));
            prop_assert!(!slug.ends_with('-'));
            prop_assert!(!slug.contains("--"));
        }

        #[test]
        fn idempotent(name in ".*") {
            let once = slugify(&name);
            prop_assert_eq!(slugify(&once), once.clone());
        }
    }
}
