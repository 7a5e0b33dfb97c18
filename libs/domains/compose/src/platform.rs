//! Coarse client platform classification from a user-agent string.
//!
//! This is a heuristic. Desktop-mode mobile browsers and unusual agents are
//! misclassified, which only changes which compose channel is tried first.

use serde::Serialize;
use strum::Display;

/// Client platform, deciding which native mail-app link is offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PlatformClass {
    Ios,
    Android,
    Desktop,
}

const IOS_MARKERS: [&str; 3] = ["iphone", "ipad", "ipod"];

impl PlatformClass {
    /// Classify a user-agent. Absent or unknown agents are `Desktop`.
    pub fn detect(user_agent: &str) -> Self {
        let ua = user_agent.to_ascii_lowercase();

        // Windows Phone agents also claim Android and iPhone.
        if ua.contains("windows phone") {
            return PlatformClass::Desktop;
        }
        if IOS_MARKERS.iter().any(|marker| ua.contains(marker)) {
            return PlatformClass::Ios;
        }
        if ua.contains("android") {
            return PlatformClass::Android;
        }
        PlatformClass::Desktop
    }

    /// Classify an optional header value.
    pub fn detect_optional(user_agent: Option<&str>) -> Self {
        user_agent.map_or(PlatformClass::Desktop, Self::detect)
    }

    pub fn is_mobile(&self) -> bool {
        !matches!(self, PlatformClass::Desktop)
    }
}
