use regex::Regex;
use tracing::debug;

use crate::schema::errors::ValidationError;

const ORIGIN_ANCHOR: &str = "^https?://[^/]*";
const OPTIONAL_QUERY: &str = r"(\?.*)?";
const OPTIONAL_FRAGMENT: &str = "(#.*)?";

fn is_regex_meta(c: char) -> bool {
    matches!(
        c,
        '\\' | '^' | '$' | '.' | '*' | '+' | '?' | '(' | ')' | '[' | ']' | '{' | '}' | '|'
    )
}

/// Escapes the classic regex metacharacters only, so derived patterns stay portable
/// to other regex dialects (`regex::escape` also escapes `-`, `#`, `&` and `~`).
pub fn escape_regex(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        if is_regex_meta(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Derives the page-URL pattern for a document from its domain and path pattern.
pub fn suggest_pattern(domain: &str, path_pattern: &str) -> String {
    let mut pattern = escape_regex(domain);
    if !pattern.ends_with('/') && !path_pattern.starts_with('/') {
        pattern.push('/');
    }
    pattern.push_str(path_pattern);
    pattern.insert_str(0, ORIGIN_ANCHOR);

    if !path_pattern.contains(r"\?") {
        pattern.push_str(OPTIONAL_QUERY);
    }
    if !path_pattern.contains('#') {
        pattern.push_str(OPTIONAL_FRAGMENT);
    }
    if !pattern.ends_with('$') {
        pattern.push('$');
    }

    debug!(domain, path_pattern, pattern = %pattern, "derived suggested pattern");
    pattern
}

pub fn compile(pattern: &str, field: &str) -> Result<Regex, ValidationError> {
    Regex::new(pattern).map_err(|source| ValidationError::InvalidRegex {
        field: field.to_string(),
        source,
    })
}

/// Every test page must match the document's own pattern.
pub fn check_test_pages(
    parser: &str,
    matcher: &Regex,
    test_pages: &[String],
) -> Result<(), ValidationError> {
    match test_pages.iter().find(|url| !matcher.is_match(url)) {
        Some(url) => Err(ValidationError::TestPageMismatch {
            parser: parser.to_string(),
            url: url.clone(),
        }),
        None => Ok(()),
    }
}


#[cfg(all(test, feature = "fuzz"))]
mod fuzz {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_derivation_is_deterministic(
            domain in "[a-z]{1,12}\\.(com|org|net)",
            path in "/[a-z0-9/]{0,20}",
        ) {
            prop_assert_eq!(suggest_pattern(&domain, &path), suggest_pattern(&domain, &path));
        }

        #[test]
        fn test_derived_pattern_accepts_own_url(
            domain in "[a-z]{1,12}\\.(com|org|net)",
            path in "/[a-z0-9/]{0,20}",
        ) {
            let matcher = compile(&suggest_pattern(&domain, &path), "p").unwrap();
            let url = format!("https://{domain}{path}");
            prop_assert!(matcher.is_match(&url));
        }
    }
}
