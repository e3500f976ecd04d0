//! Filename parsing for the `YYYY-MM-DD-name` post convention.
//!
//! Post files may carry their publication date as a prefix. Everything after
//! the date is the name, which doubles as the fallback slug when the front
//! matter does not set one:
//! - `2021-03-14-hello-world.md` → date 2021-03-14, slug `hello-world`
//! - `hello-world.md` → no date, slug `hello-world`
//!
//! ## Display Titles
//!
//! Dashes in the name are converted to spaces for the fallback title:
//! `2021-03-14-hello-world` → "hello world".

use chrono::NaiveDate;

/// Result of parsing a post file stem like `2021-03-14-hello-world`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedName {
    /// Date prefix if present and a valid calendar date.
    pub date: Option<NaiveDate>,
    /// Raw name after the date, dashes preserved. Empty if date-only.
    /// For undated entries this is the full input.
    pub name: String,
    /// Display title: name with dashes converted to spaces.
    pub display_title: String,
}

/// Length of a `YYYY-MM-DD` prefix.
const DATE_PREFIX_LEN: usize = 10;

/// Parse a post file stem following the `YYYY-MM-DD-name` convention.
///
/// - `"2021-03-14-hello-world"` → date=Some(2021-03-14), name="hello-world"
/// - `"2021-03-14"` → date=Some(2021-03-14), name=""
/// - `"2021-13-40-nope"` → date=None, name="2021-13-40-nope"
/// - `"hello-world"` → date=None, name="hello-world"
pub fn parse_post_name(stem: &str) -> ParsedName {
    if let Some(prefix) = stem.get(..DATE_PREFIX_LEN)
        && let Ok(date) = NaiveDate::parse_from_str(prefix, "%Y-%m-%d")
    {
        let rest = &stem[DATE_PREFIX_LEN..];
        if rest.is_empty() || rest.starts_with('-') {
            let raw = rest.trim_start_matches('-');
            return ParsedName {
                date: Some(date),
                name: raw.to_string(),
                display_title: raw.replace('-', " "),
            };
        }
    }
    ParsedName {
        date: None,
        name: stem.to_string(),
        display_title: stem.replace('-', " "),
    }
}
