//! File-name conventions for content items.
//!
//! Posts follow the `YYYY-MM-DD-name` convention: the date prefix is the
//! post's fallback date and the rest is its name. Every card is written under
//! a slug derived from the item's front matter or file name.
//!
//! - `2024-01-05-hello-world.md` → date 2024-01-05, name "hello-world"
//! - `about.md` → no date, name "about"

use chrono::NaiveDate;

/// Result of parsing a content file stem like `2024-01-05-hello-world`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedName {
    /// Date prefix if present.
    pub date: Option<NaiveDate>,
    /// Name after the date prefix. For undated entries, the full input.
    pub name: String,
}

/// Parse a file stem following the `YYYY-MM-DD-name` convention.
///
/// - `"2024-01-05-hello"` → date=Some(2024-01-05), name="hello"
/// - `"2024-01-05"` → date=Some(2024-01-05), name=""
/// - `"2024-13-40-nope"` → date=None, name="2024-13-40-nope" (not a real date)
/// - `"about"` → date=None, name="about"
pub fn parse_entry_name(stem: &str) -> ParsedName {
    let prefix = stem.get(..10);
    let rest = stem.get(10..).unwrap_or_default();

    if let Some(prefix) = prefix
        && (rest.is_empty() || rest.starts_with('-'))
        && let Ok(date) = NaiveDate::parse_from_str(prefix, "%Y-%m-%d")
    {
        return ParsedName {
            date: Some(date),
            name: rest.trim_start_matches('-').to_string(),
        };
    }

    ParsedName {
        date: None,
        name: stem.to_string(),
    }
}

/// Convert a title or file name to a URL slug.
///
/// Lowercases, replaces every run of characters that are not letters or
/// digits with a single dash, and strips leading/trailing dashes. Letters
/// outside ASCII are kept. May return an empty string.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for c in input.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // parse_entry_name() tests
    // =========================================================================

    #[test]
    fn dated_post_name() {
        let p = parse_entry_name("2024-01-05-hello-world");
        assert_eq!(p.date, NaiveDate::from_ymd_opt(2024, 1, 5));
        assert_eq!(p.name, "hello-world");
    }

    #[test]
    fn date_only() {
        let p = parse_entry_name("2024-01-05");
        assert_eq!(p.date, NaiveDate::from_ymd_opt(2024, 1, 5));
        assert_eq!(p.name, "");
    }

    #[test]
    fn invalid_date_is_part_of_name() {
        let p = parse_entry_name("2024-13-40-nope");
        assert_eq!(p.date, None);
        assert_eq!(p.name, "2024-13-40-nope");
    }

    #[test]
    fn undated_name() {
        let p = parse_entry_name("about");
        assert_eq!(p.date, None);
        assert_eq!(p.name, "about");
    }

    #[test]
    fn date_must_be_followed_by_dash() {
        let p = parse_entry_name("2024-01-05hello");
        assert_eq!(p.date, None);
    }

    #[test]
    fn multibyte_stem_does_not_panic() {
        let p = parse_entry_name("日本語のタイトル");
        assert_eq!(p.date, None);
        assert_eq!(p.name, "日本語のタイトル");
    }

    // =========================================================================
    // slugify() tests
    // =========================================================================

    #[test]
    fn slugify_lowercases_and_dashes_spaces() {
        assert_eq!(slugify("Hello World"), "hello-world");
    }

    #[test]
    fn slugify_collapses_punctuation_runs() {
        assert_eq!(slugify("What's new?  (2024 edition)"), "what-s-new-2024-edition");
        assert_eq!(slugify("a---b"), "a-b");
    }

    #[test]
    fn slugify_strips_leading_trailing() {
        assert_eq!(slugify("--hello--"), "hello");
        assert_eq!(slugify("  hello  "), "hello");
    }

    #[test]
    fn slugify_keeps_unicode_letters() {
        assert_eq!(slugify("Café Crème"), "café-crème");
    }

    #[test]
    fn slugify_only_punctuation_is_empty() {
        assert_eq!(slugify("!!!"), "");
        assert_eq!(slugify(""), "");
    }
}
