use std::{sync::Arc, time::Duration};

use anyhow::Result;
use parking_lot::{Mutex, RwLock};
use reqwest::Client;
use tokio::task::JoinHandle;

use crate::{
    capture::{Classifier, DedupFilter},
    config::AgentConfig,
    delivery::{ConnectionMonitor, Courier, DeliveryOutcome, HttpTransport, Transport},
    domain::{
        CaptureCandidate, Classification, ColorHint, ConnectionStatus, PageContext, Payload,
        QueueSnapshot, SourceTag,
    },
    infrastructure::{notifier::NotificationSink, shutdown::ShutdownListener},
    remote_log::RemoteLogger,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOutcome {
    Ignored,
    Duplicate,
    Forwarded {
        kind: Classification,
        delivery: DeliveryOutcome,
    },
}

#[derive(Clone)]
pub struct CaptureAgent {
    inner: Arc<AgentInner>,
}

struct AgentInner {
    classifier: Classifier,
    dedup: Mutex<DedupFilter>,
    courier: Arc<Courier>,
    notifier: Arc<dyn NotificationSink>,
    page: Arc<RwLock<PageContext>>,
    probe_timeout: Duration,
}

impl CaptureAgent {
    pub fn new(
        config: &AgentConfig,
        transport: Arc<dyn Transport>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        let courier = Arc::new(Courier::new(transport, &config.probe, &config.limits));
        Self {
            inner: Arc::new(AgentInner {
                classifier: Classifier::new(),
                dedup: Mutex::new(DedupFilter::new(config.limits.dedup_capacity)),
                courier,
                notifier,
                page: Arc::new(RwLock::new(PageContext::from(&config.page))),
                probe_timeout: config.probe.timeout,
            }),
        }
    }

    pub fn connect(config: &AgentConfig, notifier: Arc<dyn NotificationSink>) -> Result<Self> {
        let http = Client::builder()
            .user_agent(format!("snipe-agent/{}", env!("CARGO_PKG_VERSION")))
            .build()?;
        let transport = HttpTransport::new(http, &config.service)?;
        tracing::info!(
            target: "agent",
            snipe = %transport.snipe_url(),
            status = %transport.status_url(),
            "capture agent configured"
        );
        Ok(Self::new(config, Arc::new(transport), notifier))
    }

    pub fn start(&self, shutdown: ShutdownListener) -> JoinHandle<()> {
        ConnectionMonitor::new(self.inner.courier.clone(), self.inner.probe_timeout)
            .spawn(shutdown)
    }

    pub fn monitor(&self) -> ConnectionMonitor {
        ConnectionMonitor::new(self.inner.courier.clone(), self.inner.probe_timeout)
    }

    pub async fn capture(&self, url: &str, source: SourceTag) -> CaptureOutcome {
        self.capture_candidate(CaptureCandidate::new(url, source)).await
    }

    pub async fn capture_candidate(&self, candidate: CaptureCandidate) -> CaptureOutcome {
        let detection = {
            let mut dedup = self.inner.dedup.lock();
            if dedup.seen(&candidate.url) {
                return CaptureOutcome::Duplicate;
            }
            let Some(detection) = self.inner.classifier.classify(&candidate.url, candidate.source)
            else {
                return CaptureOutcome::Ignored;
            };
            dedup.admit(&candidate.url);
            detection
        };

        tracing::info!(
            target: "capture",
            url = %candidate.url,
            kind = %detection.kind,
            source = %candidate.source,
            observed_at = %candidate.observed_at,
            "media captured"
        );
        let payload = Payload::capture(
            candidate.url,
            detection.kind,
            candidate.source,
            &self.inner.page.read(),
        );
        self.inner.notifier.notify(
            &format!(
                "{} captured via {}",
                detection.kind.as_str().to_uppercase(),
                candidate.source
            ),
            detection.color,
        );

        let delivery = self.inner.courier.try_send(payload).await;
        CaptureOutcome::Forwarded {
            kind: detection.kind,
            delivery,
        }
    }

    pub async fn drm_signal(&self, key_system: &str) -> DeliveryOutcome {
        let payload = Payload::drm_signal(key_system, &self.inner.page.read());
        tracing::info!(target: "capture", key_system, "drm negotiation observed");
        self.inner
            .notifier
            .notify(&format!("DRM detected: {key_system}"), ColorHint::License);
        self.inner.courier.try_send(payload).await
    }

    pub fn logger(&self) -> RemoteLogger {
        RemoteLogger::new(self.inner.courier.clone(), self.inner.page.clone())
    }

    pub fn page_context(&self) -> PageContext {
        self.inner.page.read().clone()
    }

    pub fn set_page_context(&self, page: PageContext) {
        tracing::debug!(target: "agent", page = %page.page, "page context updated");
        *self.inner.page.write() = page;
    }

    pub fn status(&self) -> ConnectionStatus {
        self.inner.courier.status()
    }

    pub fn queued(&self) -> QueueSnapshot {
        self.inner.courier.queue_snapshot()
    }

    pub async fn flush(&self) {
        self.inner.courier.flush().await;
    }
}

#[cfg(test)]
mod tests {
    use url::Url;

    use super::*;
    use crate::delivery::courier::tests::FakeTransport;

    #[derive(Default)]
    struct RecordingNotifier {
        seen: Mutex<Vec<(String, ColorHint)>>,
    }

    impl NotificationSink for RecordingNotifier {
        fn notify(&self, message: &str, color: ColorHint) {
            self.seen.lock().push((message.to_string(), color));
        }
    }

    fn config() -> AgentConfig {
        let mut config =
            AgentConfig::with_server_base(Url::parse("http://127.0.0.1:5005").unwrap());
        config.page.url = "https://watch.example.com/ep1".into();
        config.page.title = "Episode 1".into();
        config
    }

    fn agent(transport: Arc<FakeTransport>) -> (CaptureAgent, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::default());
        (
            CaptureAgent::new(&config(), transport, notifier.clone()),
            notifier,
        )
    }

    async fn go_online(agent: &CaptureAgent) {
        let verdict = agent.monitor().tick().await;
        if verdict.came_online {
            agent.flush().await;
        }
    }

    #[tokio::test]
    async fn static_assets_create_nothing() {
        let transport = FakeTransport::reachable();
        let (agent, notifier) = agent(transport.clone());
        go_online(&agent).await;

        let outcome = agent
            .capture("https://cdn.example.com/a.jpg", SourceTag::Fetch)
            .await;
        assert_eq!(outcome, CaptureOutcome::Ignored);
        assert!(transport.sent_urls().is_empty());
        assert!(notifier.seen.lock().is_empty());
    }

    #[tokio::test]
    async fn ad_hosts_are_ignored() {
        let transport = FakeTransport::reachable();
        let (agent, _) = agent(transport.clone());
        go_online(&agent).await;

        let outcome = agent
            .capture("https://ads.doubleclick.net/x?y=1", SourceTag::Fetch)
            .await;
        assert_eq!(outcome, CaptureOutcome::Ignored);
        assert!(transport.sent_urls().is_empty());
    }

    #[tokio::test]
    async fn repeated_url_is_delivered_once() {
        let transport = FakeTransport::reachable();
        let (agent, _) = agent(transport.clone());
        go_online(&agent).await;

        let url = "https://cdn.example.com/video.mp4";
        let first = agent.capture(url, SourceTag::Fetch).await;
        let second = agent.capture(url, SourceTag::DomSrc).await;

        assert_eq!(
            first,
            CaptureOutcome::Forwarded {
                kind: Classification::Video,
                delivery: DeliveryOutcome::Delivered,
            }
        );
        assert_eq!(second, CaptureOutcome::Duplicate);
        assert_eq!(transport.sent_urls(), vec![url.to_string()]);
    }

    #[tokio::test]
    async fn offline_capture_is_sent_after_reconnect() {
        let transport = FakeTransport::unreachable();
        let (agent, notifier) = agent(transport.clone());
        go_online(&agent).await;
        assert_eq!(agent.status(), ConnectionStatus::Offline);

        let outcome = agent
            .capture("https://cdn.example.com/master.m3u8", SourceTag::Xhr)
            .await;
        assert_eq!(
            outcome,
            CaptureOutcome::Forwarded {
                kind: Classification::Video,
                delivery: DeliveryOutcome::Queued,
            }
        );
        assert_eq!(agent.queued().queued, 1);
        assert_eq!(notifier.seen.lock()[0].1, ColorHint::Video);

        transport.set_reachable(true);
        go_online(&agent).await;

        let sent = transport.sent.lock().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].kind, Classification::Video);
        assert_eq!(sent[0].source, SourceTag::Xhr);
        assert_eq!(sent[0].title, "Episode 1");
        assert_eq!(agent.queued().queued, 0);
    }

    #[tokio::test]
    async fn drm_signal_bypasses_classifier_and_dedup() {
        let transport = FakeTransport::reachable();
        let (agent, notifier) = agent(transport.clone());
        go_online(&agent).await;

        assert_eq!(
            agent.drm_signal("com.widevine.alpha").await,
            DeliveryOutcome::Delivered
        );
        assert_eq!(
            agent.drm_signal("com.widevine.alpha").await,
            DeliveryOutcome::Delivered
        );

        let sent = transport.sent.lock().clone();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].kind, Classification::License);
        assert_eq!(sent[0].source, SourceTag::EmeApi);
        assert_eq!(sent[0].title, "com.widevine.alpha");
        assert_eq!(notifier.seen.lock()[0].1, ColorHint::License);
    }

    #[tokio::test]
    async fn offline_burst_keeps_first_five_hundred_in_order() {
        let transport = FakeTransport::unreachable();
        let (agent, _) = agent(transport.clone());
        let urls: Vec<String> = (0..520)
            .map(|i| format!("https://cdn.example.com/seg/{i}.ts"))
            .collect();
        for url in &urls {
            agent.capture(url, SourceTag::Fetch).await;
        }
        assert_eq!(agent.queued().queued, 500);

        transport.set_reachable(true);
        go_online(&agent).await;
        assert_eq!(transport.sent_urls(), urls[..500].to_vec());
    }

    #[tokio::test]
    async fn page_context_flows_into_payloads() {
        let transport = FakeTransport::reachable();
        let (agent, _) = agent(transport.clone());
        go_online(&agent).await;

        agent.set_page_context(PageContext {
            title: "Episode 2".into(),
            page: "https://watch.example.com/ep2".into(),
            cookies: Some("sid=1".into()),
            agent: "UA".into(),
            referrer: Some("https://watch.example.com/".into()),
        });
        agent
            .capture("https://cdn.example.com/ep2/en.vtt", SourceTag::Fetch)
            .await;

        let sent = transport.sent.lock().clone();
        assert_eq!(sent[0].kind, Classification::Sub);
        assert_eq!(sent[0].page, "https://watch.example.com/ep2");
        assert_eq!(sent[0].cookies.as_deref(), Some("sid=1"));
        assert_eq!(agent.page_context().title, "Episode 2");
    }
}
