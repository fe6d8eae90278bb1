//! `Reporting-Endpoints` header parsing.
//!
//! The header is a comma-separated list of `name="url"` token-pairs:
//!
//! ```text
//! Reporting-Endpoints: csp="https://example.com/csp", default="https://example.com/reports"
//! ```

use indexmap::IndexMap;

use crate::classify::{is_token, is_valid_reporting_url};
use crate::error::{CspError, CspErrors, ErrorCode};

/// Endpoint name to URL, in header order.
pub type ReportingEndpoints = IndexMap<String, String>;

/// Parse a `Reporting-Endpoints` header value.
///
/// Malformed token-pairs are skipped and reported; the rest still make it
/// into the map. A name that appears twice keeps its last URL.
pub fn parse_reporting_endpoints(header: &str) -> (ReportingEndpoints, Option<CspErrors>) {
    let mut errors = CspErrors::new();
    let endpoints = collect_reporting_endpoints(header, &mut errors);
    (endpoints, errors.into_option())
}

pub(crate) fn collect_reporting_endpoints(
    header: &str,
    errors: &mut CspErrors,
) -> ReportingEndpoints {
    let mut endpoints = ReportingEndpoints::new();

    for pair in header.split(',').map(str::trim) {
        if pair.is_empty() {
            continue;
        }

        match parse_token_pair(pair) {
            Ok((name, url)) => {
                endpoints.insert(name.to_string(), url.to_string());
            }
            Err(code) => errors.push(CspError::token_pair(code, pair)),
        }
    }

    endpoints
}

fn parse_token_pair(pair: &str) -> Result<(&str, &str), ErrorCode> {
    if !pair.contains('=') {
        return Err(ErrorCode::PairMissingEquals);
    }

    // A space here almost always means two pairs were run together.
    if pair.contains(' ') {
        return Err(ErrorCode::PairMissingComma);
    }

    let parts: Vec<&str> = pair.split('=').collect();
    let (name, quoted) = match parts.as_slice() {
        [name, quoted] => (*name, *quoted),
        _ => return Err(ErrorCode::PairMalformed),
    };

    if name.is_empty() {
        return Err(ErrorCode::PairMissingKey);
    }

    if !is_token(name) {
        return Err(ErrorCode::PairInvalidKey);
    }

    if quoted.is_empty() {
        return Err(ErrorCode::PairMissingUrl);
    }

    let url = quoted
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .ok_or(ErrorCode::PairUnquotedUrl)?;

    if !is_valid_reporting_url(url) {
        return Err(ErrorCode::PairInvalidUrl);
    }

    Ok((name, url))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn only_code(header: &str) -> ErrorCode {
        let (endpoints, errors) = parse_reporting_endpoints(header);
        assert!(endpoints.is_empty(), "{header}: {endpoints:?}");
        let errors = errors.expect("expected an error");
        assert_eq!(errors.len(), 1, "{header}: {errors}");
        errors.codes()[0]
    }

    #[test]
    fn test_empty_header() {
        let (endpoints, errors) = parse_reporting_endpoints("");
        assert!(endpoints.is_empty());
        assert!(errors.is_none());

        let (endpoints, errors) = parse_reporting_endpoints(" , ,");
        assert!(endpoints.is_empty());
        assert!(errors.is_none());
    }

    #[test]
    fn test_single_pair() {
        let (endpoints, errors) =
            parse_reporting_endpoints(r#"endpoint-1="https://example.com/reports""#);
        assert!(errors.is_none());
        assert_eq!(endpoints.len(), 1);
        assert_eq!(endpoints["endpoint-1"], "https://example.com/reports");
    }

    #[test]
    fn test_multiple_pairs_keep_order() {
        let (endpoints, errors) = parse_reporting_endpoints(
            r#"endpoint-2="https://example.com/reports2", endpoint-1="https://example.com/reports1""#,
        );
        assert!(errors.is_none());
        let names: Vec<&str> = endpoints.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["endpoint-2", "endpoint-1"]);
    }

    #[test]
    fn test_duplicate_keys_last_wins() {
        let (endpoints, errors) = parse_reporting_endpoints(
            r#"e1="https://example.com/url1", e1="https://example.com/url2""#,
        );
        assert!(errors.is_none());
        assert_eq!(endpoints.len(), 1);
        assert_eq!(endpoints["e1"], "https://example.com/url2");
    }

    #[test]
    fn test_missing_comma() {
        assert_eq!(
            only_code(r#"e1="https://example.com/url1" e1="https://example.com/url2""#),
            ErrorCode::PairMissingComma
        );
    }

    #[test]
    fn test_missing_equals() {
        assert_eq!(
            only_code(r#"endpoint-1 "https://example.com/reports""#),
            ErrorCode::PairMissingEquals
        );
    }

    #[test]
    fn test_pair_errors() {
        let cases = [
            (r#"endpoint-1="https://example.com/?a=b""#, ErrorCode::PairMalformed),
            ("endpoint-1=", ErrorCode::PairMissingUrl),
            (r#"="https://example.com/reports""#, ErrorCode::PairMissingKey),
            (r#"endpoint:1="https://example.com/reports""#, ErrorCode::PairInvalidKey),
            (r#"endpoint-1=https://example.com/reports""#, ErrorCode::PairUnquotedUrl),
            (r#"endpoint-1="https://example.com/reports"#, ErrorCode::PairUnquotedUrl),
            ("endpoint-1=https://example.com/reports", ErrorCode::PairUnquotedUrl),
            ("endpoint-1='https://example.com/reports'", ErrorCode::PairUnquotedUrl),
            (r#"endpoint-1=""#, ErrorCode::PairUnquotedUrl),
            (r#"endpoint-1="/reports""#, ErrorCode::PairInvalidUrl),
            (r#"endpoint-1="https://example.com/reports#top""#, ErrorCode::PairInvalidUrl),
        ];
        for (header, expected) in cases {
            assert_eq!(only_code(header), expected, "{header}");
        }
    }

    #[test]
    fn test_error_message_names_pair() {
        let (_, errors) = parse_reporting_endpoints("endpoint-1=");
        let errors = errors.unwrap();
        let message = errors.iter().next().unwrap().to_string();
        assert!(message.contains("token-pair `endpoint-1=` is missing a URL"));
        assert!(message.ends_with("[CSP-0515]"));
    }

    #[test]
    fn test_bad_pair_does_not_hide_good_ones() {
        let (endpoints, errors) = parse_reporting_endpoints(
            r#"broken, good="https://example.com/good", =oops"#,
        );
        assert_eq!(endpoints.len(), 1);
        assert_eq!(endpoints["good"], "https://example.com/good");
        assert_eq!(
            errors.unwrap().codes(),
            vec![ErrorCode::PairMissingEquals, ErrorCode::PairMissingKey]
        );
    }
}
