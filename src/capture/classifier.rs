use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::domain::{Classification, Detection, SourceTag};

static LICENSE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)license|widevine|drm|rights").expect("valid license regex"));
static NUMERIC_QUERY_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/q/\d+").expect("valid numeric segment regex"));

const STATIC_ASSET_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "css", "js", "woff", "woff2", "ttf", "svg", "ico", "json",
];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "webm", "ts"];
const SUBTITLE_EXTENSIONS: &[&str] = &["vtt", "srt"];

const BLOCKED_HOSTS: &[&str] = &[
    "doubleclick.net",
    "google-analytics.com",
    "googletagmanager.com",
    "googlesyndication.com",
    "googleadservices.com",
    "adservice.google.",
    "amazon-adsystem.com",
    "scorecardresearch.com",
    "hotjar.com",
    "criteo.com",
    "taboola.com",
    "outbrain.com",
    "facebook.net",
    "adnxs.com",
];

const STREAM_API_MARKERS: &[&str] = &["/embed/", "/player/api", "getsources", "/ajax/embed"];

#[derive(Debug, Clone, Copy, Default)]
pub struct Classifier;

impl Classifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, raw_url: &str, source: SourceTag) -> Option<Detection> {
        let kind = classify_url(raw_url)?;
        tracing::trace!(target: "capture", url = raw_url, %source, %kind, "url classified");
        Some(Detection::new(kind))
    }
}

fn classify_url(raw_url: &str) -> Option<Classification> {
    let trimmed = raw_url.trim();
    if trimmed.is_empty() {
        return None;
    }
    let url = Url::parse(trimmed).ok()?;
    if matches!(url.scheme(), "blob" | "data") {
        return None;
    }

    let extension = path_extension(&url);
    if let Some(ext) = extension.as_deref() {
        if STATIC_ASSET_EXTENSIONS.contains(&ext) {
            return None;
        }
    }
    if url.host_str().is_some_and(is_blocked_host) {
        return None;
    }

    let lowered = trimmed.to_ascii_lowercase();
    let ext = extension.as_deref().unwrap_or_default();

    if LICENSE_REGEX.is_match(trimmed) && !lowered.ends_with(".html") {
        return Some(Classification::License);
    }
    if lowered.contains(".mpd") || lowered.contains("dash") {
        return Some(Classification::ManifestDash);
    }
    if lowered.contains(".m3u8") || lowered.contains("master.txt") {
        return Some(Classification::Video);
    }
    if VIDEO_EXTENSIONS.contains(&ext) {
        return Some(Classification::Video);
    }
    if SUBTITLE_EXTENSIONS.contains(&ext) {
        return Some(Classification::Sub);
    }
    if STREAM_API_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
        || NUMERIC_QUERY_SEGMENT.is_match(&lowered)
    {
        return Some(Classification::StreamApi);
    }
    None
}

fn path_extension(url: &Url) -> Option<String> {
    let last = url.path_segments()?.next_back()?;
    let (_, ext) = last.rsplit_once('.')?;
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_ascii_lowercase())
    }
}

fn is_blocked_host(host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    BLOCKED_HOSTS.iter().any(|blocked| host.contains(blocked))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(url: &str) -> Option<Classification> {
        Classifier::new()
            .classify(url, SourceTag::Fetch)
            .map(|detection| detection.kind)
    }

    #[test]
    fn static_assets_never_match() {
        assert_eq!(kind("https://cdn.example.com/a.jpg"), None);
        assert_eq!(kind("https://cdn.example.com/license/widevine.js"), None);
        assert_eq!(kind("https://cdn.example.com/dash/master.m3u8/poster.PNG"), None);
        assert_eq!(kind("https://cdn.example.com/config.json?src=video.mp4"), None);
    }

    #[test]
    fn unusable_urls_are_ignored() {
        assert_eq!(kind(""), None);
        assert_eq!(kind("   "), None);
        assert_eq!(kind("/relative/video.mp4"), None);
        assert_eq!(kind("blob:https://site.example/1234-abcd"), None);
        assert_eq!(kind("data:video/mp4;base64,AAAA"), None);
    }

    #[test]
    fn ad_hosts_are_dropped_before_rules() {
        assert_eq!(kind("https://ads.doubleclick.net/x?y=1"), None);
        assert_eq!(kind("https://www.google-analytics.com/video.mp4"), None);
    }

    #[test]
    fn license_wins_over_video_extension() {
        assert_eq!(
            kind("https://cdn.example.com/drm/segment.mp4"),
            Some(Classification::License)
        );
        assert_eq!(
            kind("https://lic.example.com/WIDEVINE/acquire"),
            Some(Classification::License)
        );
    }

    #[test]
    fn license_words_in_html_pages_fall_through() {
        assert_eq!(kind("https://example.com/rights.html"), None);
        assert_eq!(
            kind("https://example.com/drm-dash.html"),
            Some(Classification::ManifestDash)
        );
    }

    #[test]
    fn manifests_and_media_files() {
        assert_eq!(
            kind("https://cdn.example.com/stream/manifest.mpd"),
            Some(Classification::ManifestDash)
        );
        assert_eq!(
            kind("https://cdn.example.com/master.m3u8"),
            Some(Classification::Video)
        );
        assert_eq!(
            kind("https://cdn.example.com/hls/master.txt?token=1"),
            Some(Classification::Video)
        );
        assert_eq!(
            kind("https://cdn.example.com/files/movie.MKV"),
            Some(Classification::Video)
        );
        assert_eq!(
            kind("https://cdn.example.com/seg/000123.ts"),
            Some(Classification::Video)
        );
        assert_eq!(
            kind("https://cdn.example.com/subs/en.vtt"),
            Some(Classification::Sub)
        );
        assert_eq!(
            kind("https://cdn.example.com/subs/tr.srt?v=2"),
            Some(Classification::Sub)
        );
    }

    #[test]
    fn player_endpoints_are_stream_apis() {
        assert_eq!(
            kind("https://host.example/embed/xyz"),
            Some(Classification::StreamApi)
        );
        assert_eq!(
            kind("https://host.example/q/123456"),
            Some(Classification::StreamApi)
        );
        assert_eq!(
            kind("https://host.example/player/api?id=4"),
            Some(Classification::StreamApi)
        );
        assert_eq!(kind("https://host.example/q/abc"), None);
    }

    #[test]
    fn plain_pages_do_not_match() {
        assert_eq!(kind("https://news.example.com/article/42"), None);
    }

    #[test]
    fn detection_carries_color_hint() {
        let detection = Classifier::new()
            .classify("https://cdn.example.com/subs/en.vtt", SourceTag::DomSrc)
            .unwrap();
        assert_eq!(detection.color, crate::domain::ColorHint::Subtitle);
    }
}
