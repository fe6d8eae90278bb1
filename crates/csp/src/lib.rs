//! Content Security Policy parsing and validation.
//!
//! This crate turns `Content-Security-Policy` and `Reporting-Endpoints`
//! header values into a typed document:
//! - Directive dispatch (`;`-separated directives, case-insensitive names)
//! - Source, ancestor, media type, sandbox, URL and endpoint grammars
//! - Deprecation notices for retired directives
//! - A full diagnostic report instead of a fail-fast error
//!
//! ```
//! use csp_parser::{ParseOptions, Parser};
//!
//! let parser = Parser::new(ParseOptions::new().with_current_url("https://example.com/"));
//! let (policy, errors) = parser.parse_one("script-src 'self' 'nonce-rAnd0m'; foo-bar baz");
//!
//! assert_eq!(policy.script_src[0].source_exprs.len(), 2);
//! assert!(errors.unwrap().to_string().contains("unknown directive `foo-bar`"));
//! ```

pub mod classify;
pub mod directive;
pub mod error;
pub mod handlers;
pub mod parser;
pub mod policy;
pub mod reporting;

pub use directive::{Directive, DirectiveKind};
pub use error::{CspError, CspErrors, ErrorCode, Severity};
pub use handlers::{classify_ancestor, classify_source};
pub use parser::{parse, ParseOptions, Parser};
pub use policy::{
    AncestorExpr, AncestorSourceListItem, Keyword, MediaTypeListItem, Policy, ReportingRef,
    SandboxToken, SourceExpr, SourceListItem, UrlRef, WebRtcToken,
};
pub use reporting::{parse_reporting_endpoints, ReportingEndpoints};
