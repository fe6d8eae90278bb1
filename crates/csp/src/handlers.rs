//! Per-family directive handlers.
//!
//! A handler walks the raw values of one directive occurrence, keeps every
//! value its grammar accepts and records an error for every value it does
//! not. No handler stops early.

use crate::classify::{
    is_hash_source, is_host_source, is_keyword_source, is_media_type, is_nonce_source,
    is_sandbox_token, is_scheme_source, is_webrtc_source, reporting_url_problems, UrlProblem,
};
use crate::error::{CspError, CspErrors, ErrorCode};
use crate::policy::{
    AncestorExpr, AncestorSourceListItem, Keyword, MediaTypeListItem, ReportingRef, SandboxToken,
    SourceExpr, SourceListItem, UrlRef, WebRtcToken,
};
use crate::reporting::collect_reporting_endpoints;

/// Classify one source-list token.
///
/// Grammars are tried in a fixed order and the first match wins: `'none'`,
/// scheme, host, keyword, nonce, hash.
pub fn classify_source(token: &str) -> Option<SourceExpr> {
    if token == "'none'" {
        Some(SourceExpr::None)
    } else if is_scheme_source(token) {
        Some(SourceExpr::Scheme(token.to_string()))
    } else if is_host_source(token) {
        Some(SourceExpr::Host(token.to_string()))
    } else if is_keyword_source(token) {
        Keyword::from_token(token).map(|keyword| SourceExpr::Keyword {
            keyword,
            raw: token.to_string(),
        })
    } else if is_nonce_source(token) {
        Some(SourceExpr::Nonce(token.to_string()))
    } else if is_hash_source(token) {
        Some(SourceExpr::Hash(token.to_string()))
    } else {
        None
    }
}

/// Classify one `frame-ancestors` token: `'none'`, scheme or host only.
pub fn classify_ancestor(token: &str) -> Option<AncestorExpr> {
    if token == "'none'" {
        Some(AncestorExpr::None)
    } else if is_scheme_source(token) {
        Some(AncestorExpr::Scheme(token.to_string()))
    } else if is_host_source(token) {
        Some(AncestorExpr::Host(token.to_string()))
    } else {
        None
    }
}

pub(crate) fn handle_source_list(
    directive: &str,
    values: &[&str],
    errors: &mut CspErrors,
) -> SourceListItem {
    let mut item = SourceListItem::default();

    for value in values {
        match classify_source(value) {
            Some(expr) => item.source_exprs.push(expr),
            None => errors.push(CspError::invalid_value(
                ErrorCode::InvalidSourceExpr,
                directive,
                value,
            )),
        }
    }

    item
}

pub(crate) fn handle_ancestor_list(
    directive: &str,
    values: &[&str],
    errors: &mut CspErrors,
) -> AncestorSourceListItem {
    let mut item = AncestorSourceListItem::default();

    for value in values {
        match classify_ancestor(value) {
            Some(expr) => item.ancestor_exprs.push(expr),
            None => errors.push(CspError::invalid_value(
                ErrorCode::InvalidAncestorExpr,
                directive,
                value,
            )),
        }
    }

    item
}

pub(crate) fn handle_media_types(
    directive: &str,
    values: &[&str],
    errors: &mut CspErrors,
) -> MediaTypeListItem {
    let mut item = MediaTypeListItem::default();

    for value in values {
        if is_media_type(value) {
            item.media_types.push(value.to_string());
        } else {
            errors.push(CspError::invalid_value(ErrorCode::InvalidMediaType, directive, value));
        }
    }

    item
}

pub(crate) fn handle_sandbox(
    directive: &str,
    values: &[&str],
    keywords: &[String],
    errors: &mut CspErrors,
) -> SandboxToken {
    let mut token = SandboxToken::default();

    for value in values {
        if is_sandbox_token(value, keywords) {
            token.allow.push(value.to_string());
        } else {
            errors.push(CspError::invalid_value(ErrorCode::InvalidSandboxToken, directive, value));
        }
    }

    token
}

/// `report-uri`: each rejected value gets every applicable sub-diagnostic
/// followed by the generic invalid-value error.
pub(crate) fn handle_report_uri(
    directive: &str,
    values: &[&str],
    errors: &mut CspErrors,
) -> UrlRef {
    let mut url_ref = UrlRef::default();

    for value in values {
        let problems = reporting_url_problems(value);
        if problems.is_empty() {
            url_ref.urls.push(value.to_string());
            continue;
        }

        for problem in problems {
            errors.push(match problem {
                UrlProblem::Unparsable => CspError::unparsable_url(directive, value),
                UrlProblem::MissingScheme => CspError::url_missing_scheme(directive, value),
                UrlProblem::Fragment => CspError::url_has_fragment(directive, value),
            });
        }
        errors.push(CspError::invalid_value(ErrorCode::InvalidReportingUrl, directive, value));
    }

    url_ref
}

/// `report-to`: resolve `endpoint` against the `Reporting-Endpoints` header.
///
/// Problems in the header itself are reported here, ahead of the lookup.
pub(crate) fn handle_report_to(
    directive: &str,
    endpoint: &str,
    reporting_endpoints: &str,
    errors: &mut CspErrors,
) -> ReportingRef {
    let mut reporting_ref = ReportingRef::default();
    let endpoints = collect_reporting_endpoints(reporting_endpoints, errors);

    match endpoints.get(endpoint) {
        Some(url) => {
            reporting_ref.tokens.insert(endpoint.to_string(), url.clone());
        }
        None => errors.push(CspError::undefined_endpoint(directive, endpoint)),
    }

    reporting_ref
}

pub(crate) fn handle_webrtc(
    directive: &str,
    value: &str,
    errors: &mut CspErrors,
) -> Option<WebRtcToken> {
    if is_webrtc_source(value) {
        Some(WebRtcToken {
            value: value.to_string(),
        })
    } else {
        errors.push(CspError::invalid_value(ErrorCode::InvalidWebRtc, directive, value));
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::DEFAULT_SANDBOX_KEYWORDS;

    #[test]
    fn test_classify_source_precedence() {
        assert_eq!(classify_source("'none'"), Some(SourceExpr::None));
        assert_eq!(classify_source("https:"), Some(SourceExpr::Scheme("https:".into())));
        assert_eq!(
            classify_source("*.example.com"),
            Some(SourceExpr::Host("*.example.com".into()))
        );
        assert_eq!(
            classify_source("'SELF'"),
            Some(SourceExpr::Keyword {
                keyword: Keyword::Self_,
                raw: "'SELF'".into(),
            })
        );
        assert_eq!(
            classify_source("'nonce-rAnd0m'"),
            Some(SourceExpr::Nonce("'nonce-rAnd0m'".into()))
        );
        assert_eq!(
            classify_source("'sha384-abc='"),
            Some(SourceExpr::Hash("'sha384-abc='".into()))
        );
        // `'none'` is an exact, case-sensitive match.
        assert_eq!(classify_source("'NONE'"), None);
        assert_eq!(classify_source("self"), Some(SourceExpr::Host("self".into())));
        assert_eq!(classify_source("1.2.3.4"), None);
        assert_eq!(classify_source("\"self\""), None);
    }

    #[test]
    fn test_host_classification_is_exclusive() {
        for token in ["example.com", "https://cdn.example.com:443/js", "*", "127.0.0.1"] {
            assert_eq!(classify_source(token), Some(SourceExpr::Host(token.into())));
            assert!(is_host_source(token));
            assert!(!is_scheme_source(token));
        }
    }

    #[test]
    fn test_classify_ancestor() {
        assert_eq!(classify_ancestor("'none'"), Some(AncestorExpr::None));
        assert_eq!(classify_ancestor("https:"), Some(AncestorExpr::Scheme("https:".into())));
        assert_eq!(
            classify_ancestor("example.com"),
            Some(AncestorExpr::Host("example.com".into()))
        );
        assert_eq!(classify_ancestor("'self'"), None);
        assert_eq!(classify_ancestor("'nonce-abc123'"), None);
        assert_eq!(classify_ancestor("'sha256-abc123'"), None);
    }

    #[test]
    fn test_source_list_keeps_going() {
        let mut errors = CspErrors::new();
        let item = handle_source_list(
            "script-src",
            &["'self'", "bad!", "https:", "'unsafe-inline'", "also bad"],
            &mut errors,
        );

        assert_eq!(item.source_exprs.len(), 3);
        assert_eq!(errors.len(), 2);
        let tokens: Vec<_> = errors.iter().filter_map(|e| e.token.as_deref()).collect();
        assert_eq!(tokens, vec!["bad!", "also bad"]);
        assert!(errors.iter().all(|e| e.code == ErrorCode::InvalidSourceExpr));
    }

    #[test]
    fn test_duplicates_preserved() {
        let mut errors = CspErrors::new();
        let item = handle_source_list("img-src", &["'self'", "'self'"], &mut errors);
        let self_ = SourceExpr::Keyword {
            keyword: Keyword::Self_,
            raw: "'self'".into(),
        };
        assert_eq!(item.source_exprs, vec![self_.clone(), self_]);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_media_types() {
        let mut errors = CspErrors::new();
        let item = handle_media_types(
            "plugin-types",
            &["application/pdf", "nope", "image/svg+xml"],
            &mut errors,
        );
        assert_eq!(item.media_types, vec!["application/pdf", "image/svg+xml"]);
        assert_eq!(errors.codes(), vec![ErrorCode::InvalidMediaType]);
    }

    #[test]
    fn test_sandbox() {
        let keywords: Vec<String> =
            DEFAULT_SANDBOX_KEYWORDS.iter().map(|k| k.to_string()).collect();
        let mut errors = CspErrors::new();
        let values = ["allow-scripts", "allow-nothing"];
        let token = handle_sandbox("sandbox", &values, &keywords, &mut errors);
        assert_eq!(token.allow, vec!["allow-scripts"]);
        assert_eq!(errors.codes(), vec![ErrorCode::InvalidSandboxToken]);
    }

    #[test]
    fn test_report_uri_sub_errors() {
        let mut errors = CspErrors::new();
        let url_ref = handle_report_uri(
            "report-uri",
            &["https://example.com/csp", "/relative", "https://example.com/csp#frag"],
            &mut errors,
        );

        assert_eq!(url_ref.urls, vec!["https://example.com/csp"]);
        assert_eq!(
            errors.codes(),
            vec![
                ErrorCode::UnparsableUrl,
                ErrorCode::UrlMissingScheme,
                ErrorCode::InvalidReportingUrl,
                ErrorCode::UrlHasFragment,
                ErrorCode::InvalidReportingUrl,
            ]
        );
    }

    #[test]
    fn test_report_to_resolves() {
        let mut errors = CspErrors::new();
        let reporting_ref = handle_report_to(
            "report-to",
            "csp",
            r#"csp="https://example.com/csp", other="https://example.com/other""#,
            &mut errors,
        );
        assert!(errors.is_empty());
        assert_eq!(reporting_ref.tokens.len(), 1);
        assert_eq!(reporting_ref.tokens["csp"], "https://example.com/csp");
    }

    #[test]
    fn test_report_to_undefined_and_header_errors() {
        let mut errors = CspErrors::new();
        let reporting_ref = handle_report_to("report-to", "csp", "broken", &mut errors);
        assert!(reporting_ref.tokens.is_empty());
        assert_eq!(
            errors.codes(),
            vec![ErrorCode::PairMissingEquals, ErrorCode::UndefinedEndpoint]
        );
    }

    #[test]
    fn test_webrtc() {
        let mut errors = CspErrors::new();
        assert_eq!(
            handle_webrtc("webrtc", "'allow'", &mut errors),
            Some(WebRtcToken { value: "'allow'".into() })
        );
        assert_eq!(handle_webrtc("webrtc", "allow", &mut errors), None);
        assert_eq!(errors.codes(), vec![ErrorCode::InvalidWebRtc]);
    }
}
