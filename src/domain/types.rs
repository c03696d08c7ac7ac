use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceTag {
    Fetch,
    FetchRedir,
    Xhr,
    XhrRedir,
    DomSrc,
    IframeFetch,
    EmeApi,
    RemoteLog,
}

impl SourceTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceTag::Fetch => "FETCH",
            SourceTag::FetchRedir => "FETCH_REDIR",
            SourceTag::Xhr => "XHR",
            SourceTag::XhrRedir => "XHR_REDIR",
            SourceTag::DomSrc => "DOM_SRC",
            SourceTag::IframeFetch => "IFRAME_FETCH",
            SourceTag::EmeApi => "EME_API",
            SourceTag::RemoteLog => "REMOTE_LOG",
        }
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload `type`. `Log` is reserved for diagnostics and never comes out of
/// the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Video,
    Sub,
    License,
    ManifestDash,
    StreamApi,
    Log,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Video => "video",
            Classification::Sub => "sub",
            Classification::License => "license",
            Classification::ManifestDash => "manifest_dash",
            Classification::StreamApi => "stream_api",
            Classification::Log => "log",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorHint {
    Video,
    License,
    Manifest,
    Subtitle,
    StreamApi,
}

impl ColorHint {
    pub fn for_classification(kind: Classification) -> Self {
        match kind {
            Classification::License => ColorHint::License,
            Classification::ManifestDash => ColorHint::Manifest,
            Classification::Sub => ColorHint::Subtitle,
            Classification::StreamApi => ColorHint::StreamApi,
            Classification::Video | Classification::Log => ColorHint::Video,
        }
    }

    pub fn as_hex(&self) -> &'static str {
        match self {
            ColorHint::Video => "#00ff41",
            ColorHint::License => "#ff0055",
            ColorHint::Manifest => "#bd00ff",
            ColorHint::Subtitle => "#e3b341",
            ColorHint::StreamApi => "#00c8ff",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detection {
    pub kind: Classification,
    pub color: ColorHint,
}

impl Detection {
    pub fn new(kind: Classification) -> Self {
        Self {
            kind,
            color: ColorHint::for_classification(kind),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CaptureCandidate {
    pub url: String,
    pub source: SourceTag,
    pub observed_at: DateTime<Utc>,
}

impl CaptureCandidate {
    pub fn new(url: impl Into<String>, source: SourceTag) -> Self {
        Self {
            url: url.into(),
            source,
            observed_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Online,
    Offline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueSnapshot {
    pub queued: usize,
    pub capacity: usize,
}
