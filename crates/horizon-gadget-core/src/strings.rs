//! Name comparison rules shared by tags, element names and extensions.
//!
//! Comparison is case sensitive unless the `case-insensitive` feature is
//! enabled, in which case ASCII letters compare without regard to case.
//! Every registry keyed by a tag or name stores [`name_key`] of the name so
//! lookups follow the same rule as [`gadget_str_cmp`].

use std::borrow::Cow;
use std::cmp::Ordering;

/// Whether names compare without regard to ASCII case.
pub const CASE_INSENSITIVE: bool = cfg!(feature = "case-insensitive");

/// Compare two names under the project-wide rule.
pub fn gadget_str_cmp(a: &str, b: &str) -> Ordering {
    if CASE_INSENSITIVE {
        let a = a.bytes().map(|b| b.to_ascii_lowercase());
        let b = b.bytes().map(|b| b.to_ascii_lowercase());
        a.cmp(b)
    } else {
        a.cmp(b)
    }
}

/// Whether two names are equal under the project-wide rule.
pub fn gadget_str_eq(a: &str, b: &str) -> bool {
    gadget_str_cmp(a, b) == Ordering::Equal
}

/// The map key for `name`.
pub fn name_key(name: &str) -> Cow<'_, str> {
    if CASE_INSENSITIVE && name.bytes().any(|b| b.is_ascii_uppercase()) {
        Cow::Owned(name.to_ascii_lowercase())
    } else {
        Cow::Borrowed(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_names() {
        assert!(gadget_str_eq("div", "div"));
        assert_eq!(gadget_str_cmp("a", "b"), Ordering::Less);
    }

    #[cfg(not(feature = "case-insensitive"))]
    #[test]
    fn test_case_sensitive_by_default() {
        assert!(!gadget_str_eq("Div", "div"));
        assert_eq!(name_key("Div"), "Div");
    }

    #[cfg(feature = "case-insensitive")]
    #[test]
    fn test_case_insensitive_feature() {
        assert!(gadget_str_eq("Div", "dIV"));
        assert_eq!(name_key("Div"), "div");
    }
}
