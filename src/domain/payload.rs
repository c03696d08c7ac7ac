use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::PageConfig;

use super::types::{Classification, SourceTag};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageContext {
    pub title: String,
    pub page: String,
    pub cookies: Option<String>,
    pub agent: String,
    pub referrer: Option<String>,
}

impl From<&PageConfig> for PageContext {
    fn from(cfg: &PageConfig) -> Self {
        Self {
            title: cfg.title.clone(),
            page: cfg.url.clone(),
            cookies: cfg.cookies.clone(),
            agent: cfg.agent.clone(),
            referrer: cfg.referrer.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    pub url: String,
    #[serde(rename = "type")]
    pub kind: Classification,
    pub source: SourceTag,
    pub title: String,
    pub page: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookies: Option<String>,
    pub agent: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl Payload {
    pub fn capture(
        url: impl Into<String>,
        kind: Classification,
        source: SourceTag,
        page: &PageContext,
    ) -> Self {
        Self {
            url: url.into(),
            kind,
            source,
            title: page.title.clone(),
            page: page.page.clone(),
            cookies: page.cookies.clone(),
            agent: page.agent.clone(),
            referrer: page.referrer.clone(),
            timestamp: Utc::now(),
        }
    }

    pub fn drm_signal(key_system: &str, page: &PageContext) -> Self {
        Self {
            url: page.page.clone(),
            kind: Classification::License,
            source: SourceTag::EmeApi,
            title: key_system.to_string(),
            page: page.page.clone(),
            cookies: page.cookies.clone(),
            agent: page.agent.clone(),
            referrer: page.referrer.clone(),
            timestamp: Utc::now(),
        }
    }

    pub fn diagnostic(message: &str, level: &str, page: &PageContext) -> Self {
        Self {
            url: message.to_string(),
            kind: Classification::Log,
            source: SourceTag::RemoteLog,
            title: level.to_string(),
            page: page.page.clone(),
            cookies: None,
            agent: page.agent.clone(),
            referrer: None,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> PageContext {
        PageContext {
            title: "Episode 1".into(),
            page: "https://watch.example.com/ep1".into(),
            cookies: Some("sid=abc".into()),
            agent: "Mozilla/5.0".into(),
            referrer: None,
        }
    }

    #[test]
    fn payload_uses_wire_field_names() {
        let payload = Payload::capture(
            "https://cdn.example.com/master.m3u8",
            Classification::Video,
            SourceTag::Xhr,
            &page(),
        );
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["type"], "video");
        assert_eq!(value["source"], "XHR");
        assert_eq!(value["cookies"], "sid=abc");
        assert!(value.get("referrer").is_none());
        assert!(value.get("kind").is_none());
    }

    #[test]
    fn drm_signal_is_a_license_from_eme() {
        let payload = Payload::drm_signal("com.widevine.alpha", &page());
        assert_eq!(payload.kind, Classification::License);
        assert_eq!(payload.source, SourceTag::EmeApi);
        assert_eq!(payload.title, "com.widevine.alpha");
        assert_eq!(payload.url, "https://watch.example.com/ep1");
    }

    #[test]
    fn diagnostics_drop_cookies() {
        let payload = Payload::diagnostic("probe failed", "warn", &page());
        assert_eq!(payload.kind, Classification::Log);
        assert_eq!(payload.source, SourceTag::RemoteLog);
        assert_eq!(payload.cookies, None);
        assert_eq!(payload.title, "warn");
    }
}
