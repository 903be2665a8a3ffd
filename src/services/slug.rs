//! Slug generation
//!
//! Shared by posts, pages, and categories. Slugs are derived from the
//! English variant of the localized title; non-ASCII characters are kept
//! so accented words survive.

/// Generate a URL slug from a title.
pub fn generate_slug(title: &str) -> String {
    let slug: String = title
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c
            } else if c == ' ' || c == '_' || c == '-' {
                '-'
            } else if !c.is_ascii() {
                // Keep non-ASCII characters (accented letters and the like)
                c
            } else {
                // Replace other ASCII special characters with hyphen
                '-'
            }
        })
        .collect();

    // Remove consecutive hyphens and trim hyphens from ends
    let mut result = String::new();
    let mut prev_hyphen = false;

    for c in slug.chars() {
        if c == '-' {
            if !prev_hyphen && !result.is_empty() {
                result.push(c);
                prev_hyphen = true;
            }
        } else {
            result.push(c);
            prev_hyphen = false;
        }
    }

    // Trim trailing hyphen
    result.trim_end_matches('-').to_string()
}

/// Candidate slug for the nth attempt: the base itself, then `base-2`,
/// `base-3`, and so on.
pub fn slug_candidate(base: &str, attempt: u32) -> String {
    if attempt <= 1 {
        base.to_string()
    } else {
        format!("{}-{}", base, attempt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_generate_slug_basic() {
        assert_eq!(generate_slug("Hello World"), "hello-world");
        assert_eq!(generate_slug("Rust & SQLite!"), "rust-sqlite");
        assert_eq!(generate_slug("  spaces  "), "spaces");
    }

    #[test]
    fn test_generate_slug_keeps_accents() {
        assert_eq!(generate_slug("Giới thiệu"), "giới-thiệu");
        assert_eq!(generate_slug("À propos"), "à-propos");
    }

    #[test]
    fn test_generate_slug_collapses_separators() {
        assert_eq!(generate_slug("a - b _ c"), "a-b-c");
        assert_eq!(generate_slug("--already--hyphened--"), "already-hyphened");
    }

    #[test]
    fn test_generate_slug_empty_and_symbols() {
        assert_eq!(generate_slug(""), "");
        assert_eq!(generate_slug("???"), "");
    }

    #[test]
    fn test_slug_candidate() {
        assert_eq!(slug_candidate("post", 0), "post");
        assert_eq!(slug_candidate("post", 1), "post");
        assert_eq!(slug_candidate("post", 2), "post-2");
        assert_eq!(slug_candidate("post", 3), "post-3");
    }

    proptest! {
        #[test]
        fn prop_slug_never_has_double_hyphens(title in ".{0,60}") {
            let slug = generate_slug(&title);
            prop_assert!(!slug.contains("--"));
            prop_assert!(!slug.starts_with('-'));
            prop_assert!(!slug.ends_with('-'));
        }

        #[test]
        fn prop_slug_is_idempotent(title in "[a-zA-Z0-9 ]{0,40}") {
            let once = generate_slug(&title);
            prop_assert_eq!(generate_slug(&once), once);
        }
    }
}
