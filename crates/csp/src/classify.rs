//! Token classifiers.
//!
//! Each function answers one question about the lexical shape of a single
//! directive value. None of them allocate state or look at anything besides
//! their argument.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::policy::Keyword;

/// Sandbox keywords from the HTML Living Standard (2024 revision).
///
/// This is the default table; callers who track a different revision pass
/// their own through `ParseOptions::with_sandbox_keywords`.
pub const DEFAULT_SANDBOX_KEYWORDS: &[&str] = &[
    "allow-downloads",
    "allow-forms",
    "allow-modals",
    "allow-orientation-lock",
    "allow-pointer-lock",
    "allow-popups",
    "allow-popups-to-escape-sandbox",
    "allow-presentation",
    "allow-same-origin",
    "allow-scripts",
    "allow-top-navigation",
    "allow-top-navigation-by-user-activation",
    "allow-top-navigation-to-custom-protocols",
];

/// Top-level types from the IANA media type registry.
pub const MEDIA_TOP_LEVEL_TYPES: &[&str] = &[
    "application",
    "audio",
    "font",
    "example",
    "image",
    "message",
    "model",
    "multipart",
    "text",
    "video",
];

// scheme-part = ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )
static SCHEME_SOURCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.-]*:$").expect("scheme-source pattern"));

// host-source = [ scheme-part "://" ] host-part [ ":" port-part ] [ path-part ]
static HOST_SOURCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([a-zA-Z][a-zA-Z0-9+.-]*://)?(\*|(\*)?\.?([a-zA-Z0-9-]+))+(:(\*|[0-9]+))?(/[^/]+)*$")
        .expect("host-source pattern")
});

static DOTTED_QUAD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(([0-9]{1,3}[.]){3}[0-9]{1,3})$").expect("dotted-quad pattern"));

static MEDIA_TYPE: Lazy<Regex> = Lazy::new(|| {
    let pattern = format!(r"(?i)^({})/[a-zA-Z0-9_./+-]+$", MEDIA_TOP_LEVEL_TYPES.join("|"));
    Regex::new(&pattern).expect("media-type pattern")
});

/// `https:`, `data:`, `x-man-page:` and friends. No `//`.
pub fn is_scheme_source(s: &str) -> bool {
    SCHEME_SOURCE.is_match(s)
}

/// Host sources such as `*.example.com`, `https://cdn.example.com:443/js`.
///
/// Dotted quads are rejected, with the single exception of `127.0.0.1`.
pub fn is_host_source(s: &str) -> bool {
    s == "127.0.0.1" || (HOST_SOURCE.is_match(s) && !DOTTED_QUAD.is_match(s))
}

/// Strict dotted-quad IPv4 literal, every octet in `0..=255`.
///
/// Source lists never accept these; this only checks the shape.
pub fn is_valid_ipv4(s: &str) -> bool {
    let octets: Vec<&str> = s.split('.').collect();
    octets.len() == 4
        && octets.iter().all(|octet| {
            !octet.is_empty()
                && octet.len() <= 3
                && octet.bytes().all(|b| b.is_ascii_digit())
                && octet.parse::<u16>().map_or(false, |n| n <= 255)
        })
}

/// `'self'`, `'unsafe-inline'` and the rest of [`Keyword`], any case.
pub fn is_keyword_source(s: &str) -> bool {
    Keyword::from_token(s).is_some()
}

/// Alphabet of standard base64 followed by at most two `=`.
///
/// Nothing is decoded; a `true` only means the value could be base64.
pub fn is_base64(s: &str) -> bool {
    let body = s.trim_end_matches('=');
    if s.len() - body.len() > 2 {
        return false;
    }
    body.bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/')
}

/// Strips a quoted, case-insensitive `prefix` and returns what sits between it
/// and the closing quote.
fn quoted_payload<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    if !head.eq_ignore_ascii_case(prefix) || s.len() <= prefix.len() {
        return None;
    }
    s[prefix.len()..].strip_suffix('\'')
}

/// `'nonce-<base64>'` with a non-empty value.
pub fn is_nonce_source(s: &str) -> bool {
    s.len() > 9 && quoted_payload(s, "'nonce-").map_or(false, is_base64)
}

/// `'sha256-…'`, `'sha384-…'` or `'sha512-…'` with a base64 value.
pub fn is_hash_source(s: &str) -> bool {
    s.len() > 10
        && ["'sha256-", "'sha384-", "'sha512-"]
            .iter()
            .any(|prefix| quoted_payload(s, prefix).map_or(false, is_base64))
}

/// `type/subtype` under one of the IANA top-level types.
pub fn is_media_type(s: &str) -> bool {
    MEDIA_TYPE.is_match(s)
}

/// Case-insensitive membership in `keywords`.
pub fn is_sandbox_token<S: AsRef<str>>(s: &str, keywords: &[S]) -> bool {
    keywords.iter().any(|k| k.as_ref().eq_ignore_ascii_case(s))
}

/// `'allow'` or `'block'`, any case.
pub fn is_webrtc_source(s: &str) -> bool {
    s.eq_ignore_ascii_case("'allow'") || s.eq_ignore_ascii_case("'block'")
}

/// RFC 9110 `token`.
pub fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.bytes().all(|b| {
            b.is_ascii_alphanumeric()
                || matches!(
                    b,
                    b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' | b'^'
                        | b'_' | b'`' | b'|' | b'~'
                )
        })
}

/// Why a value failed [`is_valid_reporting_url`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UrlProblem {
    /// The URL parser rejected the input outright.
    Unparsable,
    /// Input is relative; an absolute URL needs a scheme.
    MissingScheme,
    /// Fragments are not allowed on reporting URLs.
    Fragment,
}

/// Every problem that keeps `s` from being an absolute, fragment-less URL.
/// Empty when the URL is acceptable.
pub fn reporting_url_problems(s: &str) -> Vec<UrlProblem> {
    match Url::parse(s) {
        Ok(url) if url.fragment().is_some() => vec![UrlProblem::Fragment],
        Ok(_) => Vec::new(),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            vec![UrlProblem::Unparsable, UrlProblem::MissingScheme]
        }
        Err(_) => vec![UrlProblem::Unparsable],
    }
}

/// Absolute URL per the URL Living Standard, without a fragment.
pub fn is_valid_reporting_url(s: &str) -> bool {
    reporting_url_problems(s).is_empty()
}
