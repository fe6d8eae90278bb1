//! Directive dispatcher.

use crate::classify::DEFAULT_SANDBOX_KEYWORDS;
use crate::directive::{Directive, DirectiveKind};
use crate::error::{CspError, CspErrors, ErrorCode};
use crate::handlers::{
    handle_ancestor_list, handle_media_types, handle_report_to, handle_report_uri, handle_sandbox,
    handle_source_list, handle_webrtc,
};
use crate::policy::{Policy, ReportingRef};

/// Inputs that surround the policy strings themselves.
#[derive(Clone, Debug)]
pub struct ParseOptions {
    /// URL of the document the policy was served with. May be empty.
    pub current_url: String,
    /// Raw `Reporting-Endpoints` header value. May be empty.
    pub reporting_endpoints: String,
    /// Accepted `sandbox` keywords.
    pub sandbox_keywords: Vec<String>,
}

impl ParseOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the current document URL.
    pub fn with_current_url(mut self, url: &str) -> Self {
        self.current_url = url.to_string();
        self
    }

    /// Set the `Reporting-Endpoints` header value.
    pub fn with_reporting_endpoints(mut self, header: &str) -> Self {
        self.reporting_endpoints = header.to_string();
        self
    }

    /// Replace the accepted `sandbox` keywords.
    pub fn with_sandbox_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sandbox_keywords = keywords.into_iter().map(Into::into).collect();
        self
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            current_url: String::new(),
            reporting_endpoints: String::new(),
            sandbox_keywords: DEFAULT_SANDBOX_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Content Security Policy parser.
#[derive(Clone, Debug, Default)]
pub struct Parser {
    options: ParseOptions,
}

impl Parser {
    /// Create a parser for the given options.
    pub fn new(options: ParseOptions) -> Self {
        Self { options }
    }

    /// Parse one or more `Content-Security-Policy` header values.
    ///
    /// Returns one [`Policy`] per input, in order, along with every
    /// diagnostic found across all of them. The error is `None` only when
    /// nothing at all was reported, configuration advisories included.
    pub fn parse<S: AsRef<str>>(&self, policies: &[S]) -> (Vec<Policy>, Option<CspErrors>) {
        let mut errors = self.advisories();
        let parsed = policies
            .iter()
            .map(|policy| self.parse_into(policy.as_ref(), &mut errors))
            .collect();

        (parsed, errors.into_option())
    }

    /// Parse a single header value.
    pub fn parse_one(&self, policy: &str) -> (Policy, Option<CspErrors>) {
        let mut errors = self.advisories();
        let parsed = self.parse_into(policy, &mut errors);
        (parsed, errors.into_option())
    }

    fn advisories(&self) -> CspErrors {
        let mut errors = CspErrors::new();

        if self.options.current_url.is_empty() {
            errors.push(CspError::current_url_empty());
        }

        if self.options.reporting_endpoints.is_empty() {
            errors.push(CspError::reporting_endpoints_empty());
        }

        errors
    }

    fn parse_into(&self, policy: &str, errors: &mut CspErrors) -> Policy {
        let mut parsed = Policy::new();

        for raw in policy.split(';') {
            let mut tokens = raw.split_ascii_whitespace();
            // Blank directives and trailing semicolons are skipped.
            let Some(name) = tokens.next() else {
                continue;
            };
            let values: Vec<&str> = tokens.collect();

            self.dispatch(&mut parsed, name, &values, errors);
        }

        parsed
    }

    fn dispatch(&self, policy: &mut Policy, name: &str, values: &[&str], errors: &mut CspErrors) {
        let Some(directive) = Directive::from_name(name) else {
            errors.push(CspError::unknown_directive(name));
            return;
        };

        tracing::trace!(directive = %directive, values = values.len(), "dispatching directive");

        match directive.kind() {
            DirectiveKind::SourceList => {
                let item = handle_source_list(name, values, errors);
                if let Some(lists) = policy.source_lists_mut(directive) {
                    lists.push(item);
                }
            }
            DirectiveKind::AncestorList => {
                policy.frame_ancestors.push(handle_ancestor_list(name, values, errors));
            }
            DirectiveKind::MediaTypeList => {
                policy.plugin_types.push(handle_media_types(name, values, errors));
            }
            DirectiveKind::SandboxList => {
                let token = handle_sandbox(name, values, &self.options.sandbox_keywords, errors);
                policy.sandbox.push(token);
            }
            DirectiveKind::UrlList => {
                policy.report_uri.push(handle_report_uri(name, values, errors));
            }
            DirectiveKind::ReportTo => {
                if values.len() != 1 {
                    errors.push(CspError::single_value(ErrorCode::ReportToSingleValue, name));
                }
                if let Some(endpoint) = values.first() {
                    // Without the header there is nothing to resolve against.
                    let reporting_ref = if self.options.reporting_endpoints.is_empty() {
                        ReportingRef::default()
                    } else {
                        handle_report_to(name, endpoint, &self.options.reporting_endpoints, errors)
                    };
                    policy.report_to.push(reporting_ref);
                }
            }
            DirectiveKind::WebRtc => {
                if values.len() != 1 {
                    errors.push(CspError::single_value(ErrorCode::WebRtcSingleValue, name));
                }
                if let Some(value) = values.first() {
                    if let Some(token) = handle_webrtc(name, value, errors) {
                        policy.webrtc = Some(token);
                    }
                }
            }
            DirectiveKind::Flag => match directive {
                Directive::BlockAllMixedContent => policy.block_all_mixed_content = true,
                _ => policy.upgrade_insecure_requests = true,
            },
            DirectiveKind::Retired => {}
        }

        if let Some(code) = directive.advisory() {
            errors.push(CspError::advisory(code, name));
        }
    }
}

/// Parse `policies` with the given document URL and `Reporting-Endpoints`
/// header, using default options otherwise.
pub fn parse<S: AsRef<str>>(
    current_url: &str,
    reporting_endpoints: &str,
    policies: &[S],
) -> (Vec<Policy>, Option<CspErrors>) {
    let options = ParseOptions::new()
        .with_current_url(current_url)
        .with_reporting_endpoints(reporting_endpoints);
    Parser::new(options).parse(policies)
}
