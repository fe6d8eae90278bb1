//! csp-parser - parse and validate Content Security Policies.

mod report;

use anyhow::Result;
use clap::Parser as _;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use csp_parser::{CspError, ParseOptions, Parser, Severity};

/// Helps evaluate the security posture of Content Security Policies (CSPs).
///
/// Supports CSP Level 2 and the 2024-04-24 working draft of CSP Level 3.
/// Policies are passed as arguments; wrap each one in double quotes since
/// policies usually contain single-quoted values.
#[derive(clap::Parser, Debug)]
#[command(name = "csp-parser", author, version, about, long_about = None)]
struct Args {
    /// One or more Content-Security-Policy header values
    #[arg(required = true, value_name = "POLICY")]
    policies: Vec<String>,

    /// The URL of the document being evaluated. May be empty, but this
    /// disables validation of 'self' sources
    #[arg(short = 'u', long, default_value = "")]
    current_url: String,

    /// The value of the Reporting-Endpoints header, used to validate the
    /// 'report-to' directive
    #[arg(short = 'e', long, default_value = "")]
    reporting_endpoints: String,

    /// Print results as JSON
    #[arg(short, long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn parse_options(&self) -> ParseOptions {
        ParseOptions::new()
            .with_current_url(&self.current_url)
            .with_reporting_endpoints(&self.reporting_endpoints)
    }
}

fn log_diagnostic(diagnostic: &CspError) {
    let code = diagnostic.code.as_str();
    match diagnostic.severity() {
        Severity::Info => info!(code, "{}", diagnostic.message),
        Severity::Warn => warn!(code, "{}", diagnostic.message),
        Severity::Error => error!(code, "{}", diagnostic.message),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let parser = Parser::new(args.parse_options());
    let (policies, errors) = parser.parse(&args.policies);

    if let Some(errors) = &errors {
        for diagnostic in errors {
            log_diagnostic(diagnostic);
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&policies)?);
    } else {
        print!("{}", report::render_policies(&policies));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser as _;

    #[test]
    fn test_args_single_policy() {
        let args = Args::parse_from(["csp-parser", "default-src 'self'"]);
        assert_eq!(args.policies, vec!["default-src 'self'"]);
        assert!(args.current_url.is_empty());
        assert!(args.reporting_endpoints.is_empty());
        assert!(!args.json);
        assert!(!args.verbose);
    }

    #[test]
    fn test_args_require_policy() {
        assert!(Args::try_parse_from(["csp-parser"]).is_err());
    }

    #[test]
    fn test_args_flags() {
        let args = Args::parse_from([
            "csp-parser",
            "-u",
            "https://example.com/",
            "--reporting-endpoints",
            r#"csp="https://example.com/csp""#,
            "-j",
            "-v",
            "script-src 'self'",
            "img-src *",
        ]);
        assert_eq!(args.policies.len(), 2);
        assert_eq!(args.current_url, "https://example.com/");
        assert!(args.json);
        assert!(args.verbose);

        let options = args.parse_options();
        assert_eq!(options.reporting_endpoints, r#"csp="https://example.com/csp""#);
    }
}
