//! Recognized directive names.

use std::fmt;
use std::str::FromStr;

use crate::error::ErrorCode;

/// Every directive name the parser knows about, current or retired.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Directive {
    BaseUri,
    BlockAllMixedContent,
    ChildSrc,
    ConnectSrc,
    DefaultSrc,
    FontSrc,
    FormAction,
    FrameAncestors,
    FrameSrc,
    ImgSrc,
    ManifestSrc,
    MediaSrc,
    NavigateTo,
    ObjectSrc,
    PluginTypes,
    PrefetchSrc,
    Referrer,
    ReportTo,
    ReportUri,
    Sandbox,
    ScriptSrc,
    ScriptSrcAttr,
    ScriptSrcElem,
    StyleSrc,
    StyleSrcAttr,
    StyleSrcElem,
    UpgradeInsecureRequests,
    Webrtc,
    WorkerSrc,
}

/// Which value grammar a directive uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DirectiveKind {
    /// Source expressions (`script-src`, `img-src`, ...).
    SourceList,
    /// `frame-ancestors`.
    AncestorList,
    /// `plugin-types`.
    MediaTypeList,
    /// `sandbox`.
    SandboxList,
    /// `report-uri`.
    UrlList,
    /// `report-to`.
    ReportTo,
    /// `webrtc`.
    WebRtc,
    /// Valueless flag; trailing tokens are ignored.
    Flag,
    /// Recognized, but dropped from CSP; values are not stored.
    Retired,
}

impl Directive {
    pub const ALL: [Directive; 29] = [
        Directive::BaseUri,
        Directive::BlockAllMixedContent,
        Directive::ChildSrc,
        Directive::ConnectSrc,
        Directive::DefaultSrc,
        Directive::FontSrc,
        Directive::FormAction,
        Directive::FrameAncestors,
        Directive::FrameSrc,
        Directive::ImgSrc,
        Directive::ManifestSrc,
        Directive::MediaSrc,
        Directive::NavigateTo,
        Directive::ObjectSrc,
        Directive::PluginTypes,
        Directive::PrefetchSrc,
        Directive::Referrer,
        Directive::ReportTo,
        Directive::ReportUri,
        Directive::Sandbox,
        Directive::ScriptSrc,
        Directive::ScriptSrcAttr,
        Directive::ScriptSrcElem,
        Directive::StyleSrc,
        Directive::StyleSrcAttr,
        Directive::StyleSrcElem,
        Directive::UpgradeInsecureRequests,
        Directive::Webrtc,
        Directive::WorkerSrc,
    ];

    /// Lower-case directive name as written in a policy.
    pub fn name(&self) -> &'static str {
        match self {
            Directive::BaseUri => "base-uri",
            Directive::BlockAllMixedContent => "block-all-mixed-content",
            Directive::ChildSrc => "child-src",
            Directive::ConnectSrc => "connect-src",
            Directive::DefaultSrc => "default-src",
            Directive::FontSrc => "font-src",
            Directive::FormAction => "form-action",
            Directive::FrameAncestors => "frame-ancestors",
            Directive::FrameSrc => "frame-src",
            Directive::ImgSrc => "img-src",
            Directive::ManifestSrc => "manifest-src",
            Directive::MediaSrc => "media-src",
            Directive::NavigateTo => "navigate-to",
            Directive::ObjectSrc => "object-src",
            Directive::PluginTypes => "plugin-types",
            Directive::PrefetchSrc => "prefetch-src",
            Directive::Referrer => "referrer",
            Directive::ReportTo => "report-to",
            Directive::ReportUri => "report-uri",
            Directive::Sandbox => "sandbox",
            Directive::ScriptSrc => "script-src",
            Directive::ScriptSrcAttr => "script-src-attr",
            Directive::ScriptSrcElem => "script-src-elem",
            Directive::StyleSrc => "style-src",
            Directive::StyleSrcAttr => "style-src-attr",
            Directive::StyleSrcElem => "style-src-elem",
            Directive::UpgradeInsecureRequests => "upgrade-insecure-requests",
            Directive::Webrtc => "webrtc",
            Directive::WorkerSrc => "worker-src",
        }
    }

    /// Case-insensitive lookup.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|d| d.name().eq_ignore_ascii_case(name))
    }

    pub fn kind(&self) -> DirectiveKind {
        match self {
            Directive::FrameAncestors => DirectiveKind::AncestorList,
            Directive::PluginTypes => DirectiveKind::MediaTypeList,
            Directive::Sandbox => DirectiveKind::SandboxList,
            Directive::ReportUri => DirectiveKind::UrlList,
            Directive::ReportTo => DirectiveKind::ReportTo,
            Directive::Webrtc => DirectiveKind::WebRtc,
            Directive::BlockAllMixedContent | Directive::UpgradeInsecureRequests => {
                DirectiveKind::Flag
            }
            Directive::NavigateTo | Directive::PrefetchSrc | Directive::Referrer => {
                DirectiveKind::Retired
            }
            _ => DirectiveKind::SourceList,
        }
    }

    /// Deprecation or obsoletion notice raised whenever the directive is used.
    pub fn advisory(&self) -> Option<ErrorCode> {
        match self {
            Directive::BlockAllMixedContent => Some(ErrorCode::ObsoleteMixedContent),
            Directive::ChildSrc => Some(ErrorCode::DeprecatedChildSrc),
            Directive::NavigateTo | Directive::PrefetchSrc | Directive::Referrer => {
                Some(ErrorCode::ExperimentalRemoved)
            }
            Directive::PluginTypes => Some(ErrorCode::ObsoleteDirective),
            Directive::ReportUri => Some(ErrorCode::DeprecatedInCsp3),
            _ => None,
        }
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned by [`Directive::from_str`] for names outside the known set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownDirective(pub String);

impl fmt::Display for UnknownDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown directive `{}`", self.0)
    }
}

impl std::error::Error for UnknownDirective {}

impl FromStr for Directive {
    type Err = UnknownDirective;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| UnknownDirective(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for directive in Directive::ALL {
            assert_eq!(Directive::from_name(directive.name()), Some(directive));
            assert_eq!(directive.to_string(), directive.name());
        }
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(Directive::from_name("Script-SRC"), Some(Directive::ScriptSrc));
        assert_eq!("WEBRTC".parse::<Directive>(), Ok(Directive::Webrtc));
        assert_eq!(
            "foo-bar".parse::<Directive>(),
            Err(UnknownDirective("foo-bar".to_string()))
        );
    }

    #[test]
    fn test_kinds() {
        assert_eq!(Directive::ImgSrc.kind(), DirectiveKind::SourceList);
        assert_eq!(Directive::ChildSrc.kind(), DirectiveKind::SourceList);
        assert_eq!(Directive::FrameAncestors.kind(), DirectiveKind::AncestorList);
        assert_eq!(Directive::UpgradeInsecureRequests.kind(), DirectiveKind::Flag);
        assert_eq!(Directive::Referrer.kind(), DirectiveKind::Retired);
    }

    #[test]
    fn test_advisories() {
        assert_eq!(Directive::ScriptSrc.advisory(), None);
        assert_eq!(Directive::UpgradeInsecureRequests.advisory(), None);
        assert_eq!(
            Directive::ReportUri.advisory(),
            Some(ErrorCode::DeprecatedInCsp3)
        );
        assert_eq!(
            Directive::PrefetchSrc.advisory(),
            Some(ErrorCode::ExperimentalRemoved)
        );
    }
}
