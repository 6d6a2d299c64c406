//! Token reference syntax.
//!
//! A token reference is a scalar string wholly of the form
//! `$namespace.path.segments`, optionally followed by `|| fallback` where
//! the fallback is a literal used when the primary path is missing.
//! Embedded references inside a longer string are not substituted.

use once_cell::sync::Lazy;
use regex::Regex;

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\$([A-Za-z0-9_-]+(?:\.[A-Za-z0-9_-]+)*)(?:\s*\|\|\s*(\S(?:.*\S)?))?\s*$")
        .expect("token reference pattern is valid")
});

/// A parsed token reference.
///
/// # Example
///
/// ```rust
/// use attire_tokens::TokenRef;
///
/// let plain = TokenRef::parse("$colors.primary").unwrap();
/// assert_eq!(plain.path, "colors.primary");
/// assert!(plain.fallback.is_none());
///
/// let with_fallback = TokenRef::parse("$colors.missing || #fff").unwrap();
/// assert_eq!(with_fallback.fallback.as_deref(), Some("#fff"));
///
/// assert!(TokenRef::parse("plain text").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRef {
    /// Dot-separated registry path, without the leading `$`.
    pub path: String,
    /// Literal to use when the path is missing from the registry.
    pub fallback: Option<String>,
}

impl TokenRef {
    /// Parses a scalar string as a token reference.
    ///
    /// Returns `None` if the string is not wholly a reference. Whitespace
    /// around the `||` separator is tolerated.
    pub fn parse(input: &str) -> Option<TokenRef> {
        let captures = TOKEN_RE.captures(input)?;
        let path = captures.get(1)?.as_str().to_string();
        let fallback = captures.get(2).map(|m| m.as_str().to_string());
        Some(TokenRef { path, fallback })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_reference() {
        let parsed = TokenRef::parse("$colors.primary").unwrap();
        assert_eq!(parsed.path, "colors.primary");
        assert_eq!(parsed.fallback, None);
    }

    #[test]
    fn test_parse_single_segment() {
        let parsed = TokenRef::parse("$radius").unwrap();
        assert_eq!(parsed.path, "radius");
    }

    #[test]
    fn test_parse_with_fallback() {
        let parsed = TokenRef::parse("$colors.missing || #fff").unwrap();
        assert_eq!(parsed.path, "colors.missing");
        assert_eq!(parsed.fallback.as_deref(), Some("#fff"));
    }

    #[test]
    fn test_parse_fallback_whitespace_tolerance() {
        let tight = TokenRef::parse("$colors.missing||#fff").unwrap();
        assert_eq!(tight.fallback.as_deref(), Some("#fff"));

        let loose = TokenRef::parse("$colors.missing   ||   #fff  ").unwrap();
        assert_eq!(loose.fallback.as_deref(), Some("#fff"));
    }

    #[test]
    fn test_parse_fallback_with_inner_spaces() {
        let parsed = TokenRef::parse("$typography.stack || Inter, sans-serif").unwrap();
        assert_eq!(parsed.fallback.as_deref(), Some("Inter, sans-serif"));
    }

    #[test]
    fn test_parse_rejects_plain_text() {
        assert!(TokenRef::parse("plain text").is_none());
        assert!(TokenRef::parse("#0af").is_none());
        assert!(TokenRef::parse("").is_none());
    }

    #[test]
    fn test_parse_rejects_embedded_reference() {
        assert!(TokenRef::parse("1px solid $colors.border").is_none());
        assert!(TokenRef::parse("$colors.primary solid").is_none());
    }

    #[test]
    fn test_parse_rejects_dangling_separator() {
        assert!(TokenRef::parse("$colors.primary ||").is_none());
        assert!(TokenRef::parse("$colors.primary || ").is_none());
    }

    #[test]
    fn test_parse_rejects_bare_dollar() {
        assert!(TokenRef::parse("$").is_none());
        assert!(TokenRef::parse("$.").is_none());
    }
}
