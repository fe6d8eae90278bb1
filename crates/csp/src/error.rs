//! Diagnostics produced while parsing a policy.
//!
//! Parsing never stops at the first problem. Every finding becomes a
//! [`CspError`] and is appended to a [`CspErrors`] accumulator in the order it
//! was encountered.

use std::fmt;

use thiserror::Error;

/// How serious a diagnostic is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Advisory about the parser's own configuration.
    Info,
    /// Valid today, but on its way out.
    Warn,
    /// Grammar violation, unknown or obsolete directive.
    Error,
}

impl Severity {
    /// Upper-case label used in rendered messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable, machine-readable diagnostic codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// CSP-0001
    CurrentUrlEmpty,
    /// CSP-0002
    ReportingEndpointsEmpty,
    /// CSP-0100
    InvalidSourceExpr,
    /// CSP-0200
    InvalidAncestorExpr,
    /// CSP-0300
    InvalidMediaType,
    /// CSP-0400
    InvalidReportingUrl,
    /// CSP-0401
    UnparsableUrl,
    /// CSP-0402
    UrlMissingScheme,
    /// CSP-0403
    UrlHasFragment,
    /// CSP-0501
    ReportToSingleValue,
    /// CSP-0502
    UndefinedEndpoint,
    /// CSP-0510
    PairMissingEquals,
    /// CSP-0511
    PairMissingComma,
    /// CSP-0512
    PairMalformed,
    /// CSP-0513
    PairMissingKey,
    /// CSP-0514
    PairInvalidKey,
    /// CSP-0515
    PairMissingUrl,
    /// CSP-0516
    PairUnquotedUrl,
    /// CSP-0517
    PairInvalidUrl,
    /// CSP-0600
    InvalidWebRtc,
    /// CSP-0601
    WebRtcSingleValue,
    /// CSP-0700
    InvalidSandboxToken,
    /// CSP-0801
    ObsoleteMixedContent,
    /// CSP-0802
    DeprecatedChildSrc,
    /// CSP-0803
    ExperimentalRemoved,
    /// CSP-0804
    ObsoleteDirective,
    /// CSP-0805
    DeprecatedInCsp3,
    /// CSP-0901
    UnknownDirective,
}

impl ErrorCode {
    /// The `CSP-NNNN` identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::CurrentUrlEmpty => "CSP-0001",
            ErrorCode::ReportingEndpointsEmpty => "CSP-0002",
            ErrorCode::InvalidSourceExpr => "CSP-0100",
            ErrorCode::InvalidAncestorExpr => "CSP-0200",
            ErrorCode::InvalidMediaType => "CSP-0300",
            ErrorCode::InvalidReportingUrl => "CSP-0400",
            ErrorCode::UnparsableUrl => "CSP-0401",
            ErrorCode::UrlMissingScheme => "CSP-0402",
            ErrorCode::UrlHasFragment => "CSP-0403",
            ErrorCode::ReportToSingleValue => "CSP-0501",
            ErrorCode::UndefinedEndpoint => "CSP-0502",
            ErrorCode::PairMissingEquals => "CSP-0510",
            ErrorCode::PairMissingComma => "CSP-0511",
            ErrorCode::PairMalformed => "CSP-0512",
            ErrorCode::PairMissingKey => "CSP-0513",
            ErrorCode::PairInvalidKey => "CSP-0514",
            ErrorCode::PairMissingUrl => "CSP-0515",
            ErrorCode::PairUnquotedUrl => "CSP-0516",
            ErrorCode::PairInvalidUrl => "CSP-0517",
            ErrorCode::InvalidWebRtc => "CSP-0600",
            ErrorCode::WebRtcSingleValue => "CSP-0601",
            ErrorCode::InvalidSandboxToken => "CSP-0700",
            ErrorCode::ObsoleteMixedContent => "CSP-0801",
            ErrorCode::DeprecatedChildSrc => "CSP-0802",
            ErrorCode::ExperimentalRemoved => "CSP-0803",
            ErrorCode::ObsoleteDirective => "CSP-0804",
            ErrorCode::DeprecatedInCsp3 => "CSP-0805",
            ErrorCode::UnknownDirective => "CSP-0901",
        }
    }

    /// Severity class of this code.
    pub fn severity(&self) -> Severity {
        match self {
            ErrorCode::CurrentUrlEmpty | ErrorCode::ReportingEndpointsEmpty => Severity::Info,
            ErrorCode::DeprecatedInCsp3 => Severity::Warn,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single diagnostic.
///
/// `directive` and `token` are filled in whenever the finding can be pinned
/// to a directive name or to a raw value; header-level findings carry
/// neither.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
#[error("[{}] {message} [{code}]", .code.severity())]
pub struct CspError {
    pub code: ErrorCode,
    pub directive: Option<String>,
    pub token: Option<String>,
    pub message: String,
}

impl CspError {
    fn new(
        code: ErrorCode,
        directive: Option<&str>,
        token: Option<&str>,
        message: String,
    ) -> Self {
        Self {
            code,
            directive: directive.map(str::to_string),
            token: token.map(str::to_string),
            message,
        }
    }

    /// Severity of the underlying code.
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// CSP-0001: no current URL was configured.
    pub fn current_url_empty() -> Self {
        Self::new(
            ErrorCode::CurrentUrlEmpty,
            None,
            None,
            "currentURL is empty, so validation of 'self' sources is disabled".to_string(),
        )
    }

    /// CSP-0002: no `Reporting-Endpoints` header was configured.
    pub fn reporting_endpoints_empty() -> Self {
        Self::new(
            ErrorCode::ReportingEndpointsEmpty,
            None,
            None,
            "reportingEndpointsHeader is empty, so validation of `report-to` is disabled"
                .to_string(),
        )
    }

    /// `directive `D` has an invalid value `T``, under any of the per-family
    /// codes (0100, 0200, 0300, 0400, 0600, 0700).
    pub fn invalid_value(code: ErrorCode, directive: &str, token: &str) -> Self {
        Self::new(
            code,
            Some(directive),
            Some(token),
            format!("directive `{directive}` has an invalid value `{token}`"),
        )
    }

    /// CSP-0401
    pub fn unparsable_url(directive: &str, token: &str) -> Self {
        Self::new(
            ErrorCode::UnparsableUrl,
            Some(directive),
            Some(token),
            format!("directive `{directive}`: could not parse as a URL: `{token}`"),
        )
    }

    /// CSP-0402
    pub fn url_missing_scheme(directive: &str, token: &str) -> Self {
        Self::new(
            ErrorCode::UrlMissingScheme,
            Some(directive),
            Some(token),
            format!(
                "directive `{directive}`: URL `{token}` is missing a SCHEME, which is required"
            ),
        )
    }

    /// CSP-0403
    pub fn url_has_fragment(directive: &str, token: &str) -> Self {
        Self::new(
            ErrorCode::UrlHasFragment,
            Some(directive),
            Some(token),
            format!(
                "directive `{directive}`: URL `{token}` includes a FRAGMENT, which is disallowed"
            ),
        )
    }

    /// `code` is either [`ErrorCode::ReportToSingleValue`] or
    /// [`ErrorCode::WebRtcSingleValue`].
    pub fn single_value(code: ErrorCode, directive: &str) -> Self {
        Self::new(
            code,
            Some(directive),
            None,
            format!("directive `{directive}` may only have a single value"),
        )
    }

    /// CSP-0502: `report-to` names an endpoint the header does not define.
    pub fn undefined_endpoint(directive: &str, endpoint: &str) -> Self {
        Self::new(
            ErrorCode::UndefinedEndpoint,
            Some(directive),
            Some(endpoint),
            format!(
                "directive `{directive}` refers to undefined reporting endpoint `{endpoint}`"
            ),
        )
    }

    /// Grammar errors in a `Reporting-Endpoints` token-pair (0510-0517).
    pub fn token_pair(code: ErrorCode, pair: &str) -> Self {
        let message = match code {
            ErrorCode::PairMissingEquals => {
                format!("token-pair `{pair}` does not contain an `=` character")
            }
            ErrorCode::PairMissingComma => {
                format!("`{pair}` appears to be missing a comma between token-pairs")
            }
            ErrorCode::PairMissingKey => format!("token-pair `{pair}` is missing a key"),
            ErrorCode::PairInvalidKey => {
                format!("token-pair `{pair}` has a key with invalid characters")
            }
            ErrorCode::PairMissingUrl => format!("token-pair `{pair}` is missing a URL"),
            ErrorCode::PairUnquotedUrl => {
                format!("token-pair `{pair}` URL is not enclosed in double quotes")
            }
            ErrorCode::PairInvalidUrl => format!("token-pair `{pair}` URL is not a valid URL"),
            _ => format!("token-pair `{pair}` is missing either a key or value"),
        };

        Self::new(code, None, Some(pair), message)
    }

    /// Deprecation and obsoletion advisories (0801-0805).
    pub fn advisory(code: ErrorCode, directive: &str) -> Self {
        let message = match code {
            ErrorCode::ObsoleteMixedContent => format!(
                "directive `{directive}` is obsolete; use `upgrade-insecure-requests` instead"
            ),
            ErrorCode::DeprecatedChildSrc => format!(
                "directive `{directive}` is deprecated; use `frame-src` and/or `worker-src` instead"
            ),
            ErrorCode::ExperimentalRemoved => format!(
                "directive `{directive}` was experimental in CSP3, \
                 but should now be removed from CSP policies"
            ),
            ErrorCode::DeprecatedInCsp3 => {
                format!("directive `{directive}` is valid in CSP2, but will be deprecated in CSP3")
            }
            _ => format!(
                "directive `{directive}` is obsolete; remove this directive from the policy"
            ),
        };

        Self::new(code, Some(directive), None, message)
    }

    /// CSP-0901
    pub fn unknown_directive(directive: &str) -> Self {
        Self::new(
            ErrorCode::UnknownDirective,
            Some(directive),
            None,
            format!("unknown directive `{directive}`"),
        )
    }
}

/// Ordered collection of every diagnostic found during one parse call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CspErrors {
    errors: Vec<CspError>,
}

impl CspErrors {
    /// An empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one diagnostic.
    pub fn push(&mut self, error: CspError) {
        tracing::debug!(code = %error.code, "{}", error.message);
        self.errors.push(error);
    }

    /// Number of recorded diagnostics.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CspError> {
        self.errors.iter()
    }

    /// Whether any contained diagnostic has [`Severity::Error`].
    pub fn has_errors(&self) -> bool {
        self.errors.iter().any(|e| e.severity() == Severity::Error)
    }

    pub fn by_severity(&self, severity: Severity) -> impl Iterator<Item = &CspError> {
        self.errors.iter().filter(move |e| e.severity() == severity)
    }

    pub fn codes(&self) -> Vec<ErrorCode> {
        self.errors.iter().map(|e| e.code).collect()
    }

    /// `None` when nothing was recorded.
    pub fn into_option(self) -> Option<Self> {
        if self.errors.is_empty() {
            None
        } else {
            Some(self)
        }
    }
}

impl fmt::Display for CspErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.len() {
            0 => f.write_str("no errors occurred"),
            1 => write!(f, "1 error occurred:\n\t* {}", self.errors[0]),
            n => {
                write!(f, "{n} errors occurred:")?;
                for error in &self.errors {
                    write!(f, "\n\t* {error}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for CspErrors {}

impl IntoIterator for CspErrors {
    type Item = CspError;
    type IntoIter = std::vec::IntoIter<CspError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a CspErrors {
    type Item = &'a CspError;
    type IntoIter = std::slice::Iter<'a, CspError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

impl Extend<CspError> for CspErrors {
    fn extend<I: IntoIterator<Item = CspError>>(&mut self, iter: I) {
        for error in iter {
            self.push(error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CspError::invalid_value(ErrorCode::InvalidSourceExpr, "script-src", "foo!");
        assert_eq!(
            err.to_string(),
            "[ERROR] directive `script-src` has an invalid value `foo!` [CSP-0100]"
        );
        assert_eq!(err.directive.as_deref(), Some("script-src"));
        assert_eq!(err.token.as_deref(), Some("foo!"));
    }

    #[test]
    fn test_severity_classes() {
        assert_eq!(CspError::current_url_empty().severity(), Severity::Info);
        assert_eq!(
            CspError::advisory(ErrorCode::DeprecatedInCsp3, "report-uri").severity(),
            Severity::Warn
        );
        assert_eq!(CspError::unknown_directive("foo").severity(), Severity::Error);
        assert!(CspError::advisory(ErrorCode::DeprecatedInCsp3, "report-uri")
            .to_string()
            .starts_with("[WARN] "));
    }

    #[test]
    fn test_token_pair_messages() {
        let err = CspError::token_pair(ErrorCode::PairMissingComma, "a=\"x\" b=\"y\"");
        assert_eq!(
            err.to_string(),
            "[ERROR] `a=\"x\" b=\"y\"` appears to be missing a comma between token-pairs [CSP-0511]"
        );
        assert!(err.directive.is_none());
    }

    #[test]
    fn test_accumulator_order_and_option() {
        let mut errors = CspErrors::new();
        assert!(errors.clone().into_option().is_none());

        errors.push(CspError::current_url_empty());
        errors.push(CspError::unknown_directive("foo-bar"));
        errors.extend([CspError::advisory(ErrorCode::DeprecatedInCsp3, "report-uri")]);

        assert_eq!(
            errors.codes(),
            vec![
                ErrorCode::CurrentUrlEmpty,
                ErrorCode::UnknownDirective,
                ErrorCode::DeprecatedInCsp3
            ]
        );
        assert!(errors.has_errors());
        assert_eq!(errors.by_severity(Severity::Info).count(), 1);

        let rendered = errors.to_string();
        assert!(rendered.starts_with("3 errors occurred:"));
        assert!(rendered.contains("unknown directive `foo-bar`"));
        assert_eq!(errors.into_option().map(|e| e.len()), Some(3));
    }

    #[test]
    fn test_advisories_only_are_not_errors() {
        let mut errors = CspErrors::new();
        errors.push(CspError::reporting_endpoints_empty());
        assert!(!errors.has_errors());
    }
}
