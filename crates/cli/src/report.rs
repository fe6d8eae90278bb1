//! Plain-text rendering of parsed policies.

use std::fmt::Write;

use csp_parser::{Directive, DirectiveKind, Policy};

/// One block per policy, one line per directive occurrence.
pub fn render_policies(policies: &[Policy]) -> String {
    let mut out = String::new();

    for (index, policy) in policies.iter().enumerate() {
        if policies.len() > 1 {
            let _ = writeln!(out, "# policy {}", index + 1);
        }
        out.push_str(&render_policy(policy));
    }

    out
}

pub fn render_policy(policy: &Policy) -> String {
    let mut lines = Vec::new();

    for directive in Directive::ALL {
        match directive.kind() {
            DirectiveKind::SourceList => {
                for item in policy.source_lists(directive) {
                    let values: Vec<&str> = item.source_exprs.iter().map(|e| e.as_str()).collect();
                    lines.push(line(directive, &values));
                }
            }
            DirectiveKind::AncestorList => {
                for item in &policy.frame_ancestors {
                    let values: Vec<&str> =
                        item.ancestor_exprs.iter().map(|e| e.as_str()).collect();
                    lines.push(line(directive, &values));
                }
            }
            DirectiveKind::MediaTypeList => {
                for item in &policy.plugin_types {
                    lines.push(line(directive, &item.media_types));
                }
            }
            DirectiveKind::SandboxList => {
                for item in &policy.sandbox {
                    lines.push(line(directive, &item.allow));
                }
            }
            DirectiveKind::UrlList => {
                for item in &policy.report_uri {
                    lines.push(line(directive, &item.urls));
                }
            }
            DirectiveKind::ReportTo => {
                for item in &policy.report_to {
                    let values: Vec<String> = item
                        .tokens
                        .iter()
                        .map(|(name, url)| format!("{name} ({url})"))
                        .collect();
                    lines.push(line(directive, &values));
                }
            }
            DirectiveKind::WebRtc => {
                if let Some(token) = &policy.webrtc {
                    lines.push(line(directive, &[token.value.as_str()]));
                }
            }
            DirectiveKind::Flag => {
                let set = match directive {
                    Directive::BlockAllMixedContent => policy.block_all_mixed_content,
                    _ => policy.upgrade_insecure_requests,
                };
                if set {
                    lines.push(directive.name().to_string());
                }
            }
            DirectiveKind::Retired => {}
        }
    }

    lines.into_iter().map(|l| l + "\n").collect()
}

fn line<S: AsRef<str>>(directive: Directive, values: &[S]) -> String {
    let mut out = directive.name().to_string();
    for value in values {
        out.push(' ');
        out.push_str(value.as_ref());
    }
    out
}
