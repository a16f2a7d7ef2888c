//! Application shell: the topic/record state machine behind the UI.
//!
//! The UI thread owns a [`Shell`]. Every submission runs on its own worker
//! thread and reports back over one shared channel, which the UI drains once
//! per frame with [`Shell::poll`]. Results are applied in the order they
//! complete. Submissions are not serialized, so a slow earlier request can
//! land after a newer one and overwrite it.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{mpsc, Arc};
use std::time::Instant;

use crate::render::params::VisualParams;
use crate::sentiment::{AnalyzeError, Analyzer, SentimentRecord};

/// Called from worker threads after a result is queued, to wake the UI.
pub type Waker = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing submitted yet.
    Idle,
    Loading,
    Ready,
}

struct Completion {
    request: u64,
    topic: String,
    started: Instant,
    result: Result<SentimentRecord, AnalyzeError>,
}

pub struct Shell {
    analyzer: Arc<dyn Analyzer>,
    phase: Phase,
    topic: String,
    record: SentimentRecord,
    loading: bool,
    feed_open: bool,
    revision: u64,
    next_request: u64,
    last_error: Option<String>,
    tx: mpsc::Sender<Completion>,
    rx: mpsc::Receiver<Completion>,
    waker: Option<Waker>,
}

impl Shell {
    /// A shell showing the placeholder record under `initial_topic`.
    pub fn new(analyzer: Arc<dyn Analyzer>, initial_topic: impl Into<String>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            analyzer,
            phase: Phase::Idle,
            topic: initial_topic.into(),
            record: SentimentRecord::placeholder(),
            loading: false,
            feed_open: false,
            revision: 0,
            next_request: 0,
            last_error: None,
            tx,
            rx,
            waker: None,
        }
    }

    /// Install a callback that workers invoke after queueing a result.
    pub fn with_waker(mut self, waker: Waker) -> Self {
        self.waker = Some(waker);
        self
    }

    /// Kick off the startup analysis of the initial topic.
    pub fn start(&mut self) -> bool {
        let topic = self.topic.clone();
        self.submit(&topic)
    }

    /// Start analysing `topic` in the background.
    ///
    /// Blank topics are ignored and return `false`. Otherwise the shell goes
    /// to [`Phase::Loading`], the feed panel closes, and `true` is returned.
    pub fn submit(&mut self, topic: &str) -> bool {
        let topic = topic.trim();
        if topic.is_empty() {
            log::debug!("Ignoring blank topic");
            return false;
        }

        let request = self.next_request;
        self.next_request += 1;
        self.phase = Phase::Loading;
        self.loading = true;
        self.feed_open = false;
        self.revision += 1;

        log::info!("Analysing \"{}\" (request #{})", topic, request);

        let analyzer = Arc::clone(&self.analyzer);
        let tx = self.tx.clone();
        let waker = self.waker.clone();
        let topic = topic.to_string();
        std::thread::spawn(move || {
            let started = Instant::now();
            // A panicking analyzer still has to report, or loading never clears.
            let result = panic::catch_unwind(AssertUnwindSafe(|| analyzer.analyze(&topic)))
                .unwrap_or_else(|payload| {
                    Err(AnalyzeError::Panicked(panic_message(&*payload)))
                });
            let _ = tx.send(Completion {
                request,
                topic,
                started,
                result,
            });
            if let Some(wake) = waker {
                wake();
            }
        });
        true
    }

    /// Apply every completed analysis, in completion order.
    ///
    /// Returns `true` if anything changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        while let Ok(done) = self.rx.try_recv() {
            self.apply(done);
            changed = true;
        }
        changed
    }

    fn apply(&mut self, done: Completion) {
        let elapsed = done.started.elapsed();
        match done.result {
            Ok(record) => {
                log::info!(
                    "Request #{} \"{}\" committed: score {:.2}, {} posts, {:?}",
                    done.request,
                    done.topic,
                    record.score,
                    record.posts.len(),
                    elapsed
                );
                let visuals = VisualParams::from_score(record.score);
                log::debug!(
                    "Planet spin x{:.2}, cloud opacity {:.2}, lava {}",
                    visuals.rotation_speed,
                    visuals.cloud_opacity,
                    if visuals.lava_active() { "on" } else { "off" }
                );
                self.topic = done.topic;
                self.record = record;
                self.last_error = None;
            }
            Err(e) => {
                log::error!("Analysis of \"{}\" failed: {}", done.topic, e);
                self.last_error = Some(e.to_string());
            }
        }
        // Any completion ends the loading state, even with others in flight.
        self.loading = false;
        self.phase = Phase::Ready;
        self.revision += 1;
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn record(&self) -> &SentimentRecord {
        &self.record
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Message of the most recent failure, cleared by the next success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Bumped on every state change the views care about.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn feed_open(&self) -> bool {
        self.feed_open
    }

    pub fn set_feed_open(&mut self, open: bool) {
        if self.feed_open != open {
            self.feed_open = open;
            self.revision += 1;
        }
    }

    pub fn toggle_feed(&mut self) {
        self.set_feed_open(!self.feed_open);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sentiment::{PostSentiment, RawAnalysis, RawPost, Trend};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Analyzer whose replies are released by the test, per topic.
    #[derive(Default)]
    struct GatedAnalyzer {
        gates: Mutex<HashMap<String, mpsc::Receiver<Result<RawAnalysis, String>>>>,
    }

    impl GatedAnalyzer {
        fn gate(&self, topic: &str) -> mpsc::Sender<Result<RawAnalysis, String>> {
            let (tx, rx) = mpsc::channel();
            self.gates.lock().unwrap().insert(topic.to_string(), rx);
            tx
        }
    }

    impl Analyzer for GatedAnalyzer {
        fn analyze(&self, topic: &str) -> Result<SentimentRecord, AnalyzeError> {
            let rx = self
                .gates
                .lock()
                .unwrap()
                .remove(topic)
                .expect("no gate for topic");
            match rx.recv().expect("gate dropped") {
                Ok(raw) => Ok(SentimentRecord::from_raw(raw, 1)),
                Err(body) => Err(serde_json::from_str::<RawAnalysis>(&body)
                    .expect_err("test body should be malformed")
                    .into()),
            }
        }
    }

    fn raw(score: f64) -> RawAnalysis {
        RawAnalysis {
            score,
            summary: format!("score {}", score),
            posts: (0..5)
                .map(|i| RawPost {
                    author: format!("A{}", i),
                    handle: format!("a{}", i),
                    content: "text".into(),
                })
                .collect(),
        }
    }

    struct PanickingAnalyzer;

    impl Analyzer for PanickingAnalyzer {
        fn analyze(&self, _topic: &str) -> Result<SentimentRecord, AnalyzeError> {
            panic!("backend exploded")
        }
    }

    fn shell(analyzer: &Arc<GatedAnalyzer>) -> Shell {
        Shell::new(Arc::clone(analyzer) as Arc<dyn Analyzer>, "Artificial Super Intelligence")
    }

    /// Poll until `n` completions have been applied.
    fn settle(shell: &mut Shell, n: usize) {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut seen = 0;
        while seen < n {
            assert!(Instant::now() < deadline, "timed out waiting for results");
            while let Ok(done) = shell.rx.recv_timeout(Duration::from_millis(10)) {
                shell.apply(done);
                seen += 1;
                if seen == n {
                    break;
                }
            }
        }
    }

    #[test]
    fn starts_idle_with_placeholder() {
        let analyzer = Arc::new(GatedAnalyzer::default());
        let s = shell(&analyzer);
        assert_eq!(s.phase(), Phase::Idle);
        assert_eq!(s.record().trend, Trend::Stable);
        assert!(!s.is_loading());
    }

    #[test]
    fn blank_topics_never_reach_the_client() {
        let analyzer = Arc::new(GatedAnalyzer::default());
        let mut s = shell(&analyzer);
        assert!(!s.submit(""));
        assert!(!s.submit("   \t"));
        assert_eq!(s.phase(), Phase::Idle);
        assert!(!s.is_loading());
    }

    #[test]
    fn positive_topic() {
        let analyzer = Arc::new(GatedAnalyzer::default());
        let gate = analyzer.gate("Test A");
        let mut s = shell(&analyzer);
        s.set_feed_open(true);

        assert!(s.submit("Test A"));
        assert_eq!(s.phase(), Phase::Loading);
        assert!(s.is_loading());
        assert!(!s.feed_open(), "feed closes on submit");

        gate.send(Ok(raw(0.6))).unwrap();
        settle(&mut s, 1);

        assert_eq!(s.phase(), Phase::Ready);
        assert!(!s.is_loading());
        assert_eq!(s.topic(), "Test A");
        assert_eq!(s.record().trend, Trend::Up);
        assert_eq!(s.record().posts.len(), 5);
        assert!(s
            .record()
            .posts
            .iter()
            .all(|p| p.sentiment == PostSentiment::Positive));
    }

    #[test]
    fn negative_topic_shows_lava() {
        let analyzer = Arc::new(GatedAnalyzer::default());
        let gate = analyzer.gate("Test B");
        let mut s = shell(&analyzer);
        s.submit("Test B");
        gate.send(Ok(raw(-0.9))).unwrap();
        settle(&mut s, 1);

        assert_eq!(s.record().trend, Trend::Down);
        assert!(crate::render::params::lava_active(s.record().score));
    }

    #[test]
    fn failure_keeps_previous_state() {
        let analyzer = Arc::new(GatedAnalyzer::default());
        let ok = analyzer.gate("Test A");
        let mut s = shell(&analyzer);
        s.submit("Test A");
        ok.send(Ok(raw(0.6))).unwrap();
        settle(&mut s, 1);

        let bad = analyzer.gate("Broken");
        s.submit("Broken");
        bad.send(Err("{\"score\": ".into())).unwrap();
        settle(&mut s, 1);

        assert_eq!(s.phase(), Phase::Ready);
        assert!(!s.is_loading());
        assert_eq!(s.topic(), "Test A");
        assert!((s.record().score - 0.6).abs() < 1e-6);
        assert!(s.last_error().is_some());
    }

    #[test]
    fn panicking_analyzer_still_clears_loading() {
        let mut s = Shell::new(Arc::new(PanickingAnalyzer), "Artificial Super Intelligence");
        assert!(s.submit("Test A"));
        assert!(s.is_loading());
        settle(&mut s, 1);

        assert!(!s.is_loading());
        assert_eq!(s.phase(), Phase::Ready);
        assert_eq!(s.topic(), "Artificial Super Intelligence");
        assert_eq!(s.record().trend, Trend::Stable);
        let err = s.last_error().unwrap_or_default();
        assert!(err.contains("panicked") && err.contains("backend exploded"), "{}", err);
    }

    #[test]
    fn results_apply_in_completion_order() {
        let analyzer = Arc::new(GatedAnalyzer::default());
        let first = analyzer.gate("First");
        let second = analyzer.gate("Second");
        let mut s = shell(&analyzer);
        s.submit("First");
        s.submit("Second");

        second.send(Ok(raw(-0.5))).unwrap();
        settle(&mut s, 1);
        assert_eq!(s.topic(), "Second");
        assert!(!s.is_loading(), "any completion clears loading");

        first.send(Ok(raw(0.4))).unwrap();
        settle(&mut s, 1);
        // The stale result wins because it finished last.
        assert_eq!(s.topic(), "First");
        assert!((s.record().score - 0.4).abs() < 1e-6);
    }

    #[test]
    fn revision_moves_forward() {
        let analyzer = Arc::new(GatedAnalyzer::default());
        let gate = analyzer.gate("Test A");
        let mut s = shell(&analyzer);
        let r0 = s.revision();
        s.submit("Test A");
        let r1 = s.revision();
        gate.send(Ok(raw(0.6))).unwrap();
        settle(&mut s, 1);
        assert!(r0 < r1 && r1 < s.revision());
    }

    #[test]
    fn waker_fires_and_poll_drains() {
        let analyzer = Arc::new(GatedAnalyzer::default());
        let gate = analyzer.gate("Test A");
        let (wake_tx, wake_rx) = mpsc::channel();
        let wake_tx = Mutex::new(wake_tx);
        let mut s = shell(&analyzer).with_waker(Arc::new(move || {
            let _ = wake_tx.lock().unwrap().send(());
        }));
        s.submit("Test A");
        gate.send(Ok(raw(0.6))).unwrap();
        wake_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(s.poll());
        assert_eq!(s.topic(), "Test A");
        assert!(!s.poll());
    }

    #[test]
    fn start_submits_initial_topic() {
        let analyzer = Arc::new(GatedAnalyzer::default());
        let gate = analyzer.gate("Artificial Super Intelligence");
        let mut s = shell(&analyzer);
        assert!(s.start());
        gate.send(Ok(raw(0.2))).unwrap();
        settle(&mut s, 1);
        assert_eq!(s.topic(), "Artificial Super Intelligence");
        assert_eq!(s.record().trend, Trend::Up);
    }
}
