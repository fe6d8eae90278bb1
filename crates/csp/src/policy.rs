//! The typed policy document.

use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::directive::Directive;

/// One parsed `Content-Security-Policy` header value.
///
/// A directive may appear several times in one policy; every occurrence is
/// kept as its own list entry, in the order it appeared.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Policy {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webrtc: Option<WebRtcToken>,
    #[serde(rename = "base-uri", skip_serializing_if = "Vec::is_empty")]
    pub base_uri: Vec<SourceListItem>,
    #[serde(rename = "child-src", skip_serializing_if = "Vec::is_empty")]
    pub child_src: Vec<SourceListItem>,
    #[serde(rename = "connect-src", skip_serializing_if = "Vec::is_empty")]
    pub connect_src: Vec<SourceListItem>,
    #[serde(rename = "default-src", skip_serializing_if = "Vec::is_empty")]
    pub default_src: Vec<SourceListItem>,
    #[serde(rename = "font-src", skip_serializing_if = "Vec::is_empty")]
    pub font_src: Vec<SourceListItem>,
    #[serde(rename = "form-action", skip_serializing_if = "Vec::is_empty")]
    pub form_action: Vec<SourceListItem>,
    #[serde(rename = "frame-src", skip_serializing_if = "Vec::is_empty")]
    pub frame_src: Vec<SourceListItem>,
    #[serde(rename = "img-src", skip_serializing_if = "Vec::is_empty")]
    pub img_src: Vec<SourceListItem>,
    #[serde(rename = "manifest-src", skip_serializing_if = "Vec::is_empty")]
    pub manifest_src: Vec<SourceListItem>,
    #[serde(rename = "media-src", skip_serializing_if = "Vec::is_empty")]
    pub media_src: Vec<SourceListItem>,
    #[serde(rename = "object-src", skip_serializing_if = "Vec::is_empty")]
    pub object_src: Vec<SourceListItem>,
    #[serde(rename = "script-src", skip_serializing_if = "Vec::is_empty")]
    pub script_src: Vec<SourceListItem>,
    #[serde(rename = "script-src-attr", skip_serializing_if = "Vec::is_empty")]
    pub script_src_attr: Vec<SourceListItem>,
    #[serde(rename = "script-src-elem", skip_serializing_if = "Vec::is_empty")]
    pub script_src_elem: Vec<SourceListItem>,
    #[serde(rename = "style-src", skip_serializing_if = "Vec::is_empty")]
    pub style_src: Vec<SourceListItem>,
    #[serde(rename = "style-src-attr", skip_serializing_if = "Vec::is_empty")]
    pub style_src_attr: Vec<SourceListItem>,
    #[serde(rename = "style-src-elem", skip_serializing_if = "Vec::is_empty")]
    pub style_src_elem: Vec<SourceListItem>,
    #[serde(rename = "worker-src", skip_serializing_if = "Vec::is_empty")]
    pub worker_src: Vec<SourceListItem>,
    #[serde(rename = "frame-ancestors", skip_serializing_if = "Vec::is_empty")]
    pub frame_ancestors: Vec<AncestorSourceListItem>,
    #[serde(rename = "plugin-types", skip_serializing_if = "Vec::is_empty")]
    pub plugin_types: Vec<MediaTypeListItem>,
    #[serde(rename = "report-to", skip_serializing_if = "Vec::is_empty")]
    pub report_to: Vec<ReportingRef>,
    #[serde(rename = "report-uri", skip_serializing_if = "Vec::is_empty")]
    pub report_uri: Vec<UrlRef>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sandbox: Vec<SandboxToken>,
    #[serde(rename = "block-all-mixed-content", skip_serializing_if = "is_false")]
    pub block_all_mixed_content: bool,
    #[serde(rename = "upgrade-insecure-requests", skip_serializing_if = "is_false")]
    pub upgrade_insecure_requests: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl Policy {
    /// Create an empty policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Occurrences of a source-list directive. Empty for any other directive.
    pub fn source_lists(&self, directive: Directive) -> &[SourceListItem] {
        let lists = match directive {
            Directive::BaseUri => &self.base_uri,
            Directive::ChildSrc => &self.child_src,
            Directive::ConnectSrc => &self.connect_src,
            Directive::DefaultSrc => &self.default_src,
            Directive::FontSrc => &self.font_src,
            Directive::FormAction => &self.form_action,
            Directive::FrameSrc => &self.frame_src,
            Directive::ImgSrc => &self.img_src,
            Directive::ManifestSrc => &self.manifest_src,
            Directive::MediaSrc => &self.media_src,
            Directive::ObjectSrc => &self.object_src,
            Directive::ScriptSrc => &self.script_src,
            Directive::ScriptSrcAttr => &self.script_src_attr,
            Directive::ScriptSrcElem => &self.script_src_elem,
            Directive::StyleSrc => &self.style_src,
            Directive::StyleSrcAttr => &self.style_src_attr,
            Directive::StyleSrcElem => &self.style_src_elem,
            Directive::WorkerSrc => &self.worker_src,
            _ => return &[],
        };
        lists.as_slice()
    }

    pub(crate) fn source_lists_mut(
        &mut self,
        directive: Directive,
    ) -> Option<&mut Vec<SourceListItem>> {
        let lists = match directive {
            Directive::BaseUri => &mut self.base_uri,
            Directive::ChildSrc => &mut self.child_src,
            Directive::ConnectSrc => &mut self.connect_src,
            Directive::DefaultSrc => &mut self.default_src,
            Directive::FontSrc => &mut self.font_src,
            Directive::FormAction => &mut self.form_action,
            Directive::FrameSrc => &mut self.frame_src,
            Directive::ImgSrc => &mut self.img_src,
            Directive::ManifestSrc => &mut self.manifest_src,
            Directive::MediaSrc => &mut self.media_src,
            Directive::ObjectSrc => &mut self.object_src,
            Directive::ScriptSrc => &mut self.script_src,
            Directive::ScriptSrcAttr => &mut self.script_src_attr,
            Directive::ScriptSrcElem => &mut self.script_src_elem,
            Directive::StyleSrc => &mut self.style_src,
            Directive::StyleSrcAttr => &mut self.style_src_attr,
            Directive::StyleSrcElem => &mut self.style_src_elem,
            Directive::WorkerSrc => &mut self.worker_src,
            _ => return None,
        };
        Some(lists)
    }

    /// Number of directive occurrences recorded, flags included.
    pub fn directive_count(&self) -> usize {
        let source_lists: usize = Directive::ALL
            .iter()
            .map(|d| self.source_lists(*d).len())
            .sum();

        source_lists
            + self.frame_ancestors.len()
            + self.plugin_types.len()
            + self.report_to.len()
            + self.report_uri.len()
            + self.sandbox.len()
            + usize::from(self.webrtc.is_some())
            + usize::from(self.block_all_mixed_content)
            + usize::from(self.upgrade_insecure_requests)
    }

    /// Nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.directive_count() == 0
    }
}

/// One occurrence of a source-list directive such as `script-src`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SourceListItem {
    #[serde(rename = "sourceList", skip_serializing_if = "Vec::is_empty")]
    pub source_exprs: Vec<SourceExpr>,
}

/// A single source expression.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SourceExpr {
    /// `'none'`
    None,
    /// e.g. `https:`
    Scheme(String),
    /// e.g. `*.example.com`
    Host(String),
    /// A keyword, with the token exactly as written.
    Keyword { keyword: Keyword, raw: String },
    /// `'nonce-…'`, kept verbatim.
    Nonce(String),
    /// `'sha256-…'` and friends, kept verbatim.
    Hash(String),
}

impl SourceExpr {
    /// The text this expression was parsed from.
    pub fn as_str(&self) -> &str {
        match self {
            SourceExpr::None => "'none'",
            SourceExpr::Keyword { raw, .. } => raw.as_str(),
            SourceExpr::Scheme(s)
            | SourceExpr::Host(s)
            | SourceExpr::Nonce(s)
            | SourceExpr::Hash(s) => s.as_str(),
        }
    }
}

fn serialize_single<S, V>(serializer: S, key: &str, value: &V) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    V: Serialize + ?Sized,
{
    let mut map = serializer.serialize_map(Some(1))?;
    map.serialize_entry(key, value)?;
    map.end()
}

impl Serialize for SourceExpr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SourceExpr::None => serialize_single(serializer, "none", &true),
            SourceExpr::Scheme(s) => serialize_single(serializer, "schemeSource", s),
            SourceExpr::Host(s) => serialize_single(serializer, "hostSource", s),
            SourceExpr::Keyword { raw, .. } => serialize_single(serializer, "keywordSource", raw),
            SourceExpr::Nonce(s) => serialize_single(serializer, "nonceSource", s),
            SourceExpr::Hash(s) => serialize_single(serializer, "hashSource", s),
        }
    }
}

/// Keyword sources.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Keyword {
    Self_,
    ReportSample,
    StrictDynamic,
    UnsafeEval,
    UnsafeHashes,
    UnsafeInline,
    UnsafeAllowRedirects,
    WasmUnsafeEval,
}

impl Keyword {
    pub const ALL: [Keyword; 8] = [
        Keyword::Self_,
        Keyword::ReportSample,
        Keyword::StrictDynamic,
        Keyword::UnsafeEval,
        Keyword::UnsafeHashes,
        Keyword::UnsafeInline,
        Keyword::UnsafeAllowRedirects,
        Keyword::WasmUnsafeEval,
    ];

    /// Quoted form, e.g. `'unsafe-inline'`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Self_ => "'self'",
            Keyword::ReportSample => "'report-sample'",
            Keyword::StrictDynamic => "'strict-dynamic'",
            Keyword::UnsafeEval => "'unsafe-eval'",
            Keyword::UnsafeHashes => "'unsafe-hashes'",
            Keyword::UnsafeInline => "'unsafe-inline'",
            Keyword::UnsafeAllowRedirects => "'unsafe-allow-redirects'",
            Keyword::WasmUnsafeEval => "'wasm-unsafe-eval'",
        }
    }

    /// Case-insensitive match of a raw token, quotes included.
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(token))
    }
}

/// One occurrence of `frame-ancestors`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AncestorSourceListItem {
    #[serde(rename = "ancestorList", skip_serializing_if = "Vec::is_empty")]
    pub ancestor_exprs: Vec<AncestorExpr>,
}

/// `'none'`, a scheme source or a host source.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum AncestorExpr {
    None,
    Scheme(String),
    Host(String),
}

impl AncestorExpr {
    /// The text this expression was parsed from.
    pub fn as_str(&self) -> &str {
        match self {
            AncestorExpr::None => "'none'",
            AncestorExpr::Scheme(s) | AncestorExpr::Host(s) => s.as_str(),
        }
    }
}

impl Serialize for AncestorExpr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AncestorExpr::None => serialize_single(serializer, "none", &true),
            AncestorExpr::Scheme(s) => serialize_single(serializer, "schemeSource", s),
            AncestorExpr::Host(s) => serialize_single(serializer, "hostSource", s),
        }
    }
}

/// One occurrence of `plugin-types`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MediaTypeListItem {
    #[serde(rename = "mediaTypes", skip_serializing_if = "Vec::is_empty")]
    pub media_types: Vec<String>,
}

/// One occurrence of `sandbox`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SandboxToken {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allow: Vec<String>,
}

/// One occurrence of `report-uri`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct UrlRef {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub urls: Vec<String>,
}

/// One occurrence of `report-to`: the endpoint name and the URL it resolved
/// to through the `Reporting-Endpoints` header.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ReportingRef {
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub tokens: IndexMap<String, String>,
}

/// The value of `webrtc`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct WebRtcToken {
    pub value: String,
}
