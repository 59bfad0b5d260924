//! Rendering session
//!
//! A session owns one rendering engine and tracks where the current render
//! stands. Engine events arrive on a channel; the session consumes them with
//! a bounded blocking receive so callers can wait for readiness while still
//! observing cancellation.

use super::ExportError;
use crate::config::ExportSettings;
use crate::engine::{
    EngineEvent, EngineEventKind, EngineFactory, ExtractedContent, RenderEngine, Ticket,
};
use log::{debug, warn};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

// ─────────────────────────────────────────────────────────────────────────────
// Session State
// ─────────────────────────────────────────────────────────────────────────────

/// Progress of the current render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Started,
    LoadFinished,
    WorkFinished,
    /// Both load and work finished
    Ready,
    /// Terminal until the next `start`
    Failed(String),
}

impl SessionState {
    pub fn is_ready(&self) -> bool {
        matches!(self, SessionState::Ready)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, SessionState::Failed(_))
    }

    /// The state after `event`, or `None` if the transition is invalid.
    fn next(&self, event: &EngineEventKind) -> Option<SessionState> {
        use SessionState::*;
        match (self, event) {
            (Failed(_), _) => None,
            (_, EngineEventKind::Failed(reason)) => Some(Failed(reason.clone())),
            (Started, EngineEventKind::LoadFinished) => Some(LoadFinished),
            (WorkFinished, EngineEventKind::LoadFinished) => Some(Ready),
            (Started, EngineEventKind::WorkFinished) => Some(WorkFinished),
            (LoadFinished, EngineEventKind::WorkFinished) => Some(Ready),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Waiting
// ─────────────────────────────────────────────────────────────────────────────

/// Timing of the blocking waits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitConfig {
    /// Longest single receive before the stop flag is checked again
    pub poll_interval: Duration,
    /// Extra time events keep being processed after readiness
    pub settle_delay: Duration,
    /// Upper bound for each wait, `None` waits forever
    pub timeout: Option<Duration>,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self::from_settings(&ExportSettings::default())
    }
}

impl WaitConfig {
    pub fn from_settings(settings: &ExportSettings) -> Self {
        Self {
            poll_interval: Duration::from_millis(settings.poll_interval_ms),
            settle_delay: Duration::from_millis(settings.settle_delay_ms),
            timeout: (settings.render_timeout_secs > 0)
                .then(|| Duration::from_secs(settings.render_timeout_secs)),
        }
    }
}

/// Result of a wait that may be cancelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Waited<T> {
    Done(T),
    Cancelled,
}

// ─────────────────────────────────────────────────────────────────────────────
// Rendering Session
// ─────────────────────────────────────────────────────────────────────────────

pub struct RenderingSession {
    engine: Box<dyn RenderEngine>,
    events: Receiver<EngineEvent>,
    ticket: Ticket,
    state: SessionState,
    content: Option<ExtractedContent>,
}

impl RenderingSession {
    pub fn new(factory: &EngineFactory) -> Self {
        let (tx, rx) = channel();
        Self {
            engine: factory(tx),
            events: rx,
            ticket: 0,
            state: SessionState::Started,
            content: None,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state.is_ready()
    }

    pub fn is_failed(&self) -> bool {
        self.state.is_failed()
    }

    /// Begin rendering `text` inside `template`.
    ///
    /// Relative references in the page resolve against the directory of
    /// `source_path`. Events of earlier renders are ignored from now on.
    pub fn start(&mut self, template: &str, source_path: &Path, text: &str) {
        self.ticket += 1;
        self.state = SessionState::Started;
        self.content = None;

        let base_dir = source_path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        debug!("Render {} started for {}", self.ticket, source_path.display());
        self.engine.set_html(self.ticket, template, base_dir);
        self.engine.set_text(self.ticket, text);
    }

    /// Block until the page is ready, failed, cancelled or timed out.
    pub fn wait_until_ready(
        &mut self,
        wait: &WaitConfig,
        stop: &AtomicBool,
    ) -> Result<Waited<()>, ExportError> {
        let deadline = wait.timeout.map(|timeout| Instant::now() + timeout);
        loop {
            if stop.load(Ordering::SeqCst) {
                return Ok(Waited::Cancelled);
            }
            self.check_failed()?;
            if self.is_ready() {
                return Ok(Waited::Done(()));
            }
            let Some(slice) = next_slice(deadline, wait.poll_interval) else {
                return Err(ExportError::Render("page did not become ready in time".to_string()));
            };
            self.pump(slice);
        }
    }

    /// Keep processing events for the settle delay.
    pub fn settle(&mut self, wait: &WaitConfig, stop: &AtomicBool) -> Result<Waited<()>, ExportError> {
        let deadline = Some(Instant::now() + wait.settle_delay);
        loop {
            if stop.load(Ordering::SeqCst) {
                return Ok(Waited::Cancelled);
            }
            self.check_failed()?;
            let Some(slice) = next_slice(deadline, wait.poll_interval) else {
                return Ok(Waited::Done(()));
            };
            self.pump(slice);
        }
    }

    /// Ask the engine for the rendered fragments and wait for them.
    pub fn request_content(
        &mut self,
        wait: &WaitConfig,
        stop: &AtomicBool,
    ) -> Result<Waited<ExtractedContent>, ExportError> {
        if !self.is_ready() {
            return Err(ExportError::Render(
                "content requested before the page was ready".to_string(),
            ));
        }

        self.engine.save_content(self.ticket);
        let deadline = wait.timeout.map(|timeout| Instant::now() + timeout);
        loop {
            if let Some(content) = self.content.take() {
                return Ok(Waited::Done(content));
            }
            if stop.load(Ordering::SeqCst) {
                return Ok(Waited::Cancelled);
            }
            self.check_failed()?;
            let Some(slice) = next_slice(deadline, wait.poll_interval) else {
                return Err(ExportError::Render("rendered content never arrived".to_string()));
            };
            self.pump(slice);
        }
    }

    fn check_failed(&self) -> Result<(), ExportError> {
        match &self.state {
            SessionState::Failed(reason) => Err(ExportError::Render(reason.clone())),
            _ => Ok(()),
        }
    }

    /// Receive and apply at most one event.
    fn pump(&mut self, timeout: Duration) {
        match self.events.recv_timeout(timeout) {
            Ok(event) => self.apply(event),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                if !self.is_failed() {
                    warn!("Rendering engine went away");
                    self.state = SessionState::Failed("rendering engine disconnected".to_string());
                }
            }
        }
    }

    fn apply(&mut self, event: EngineEvent) {
        if event.ticket != self.ticket {
            debug!(
                "Ignoring event of render {} during render {}",
                event.ticket, self.ticket
            );
            return;
        }

        if let EngineEventKind::ContentReady(content) = event.kind {
            if self.is_ready() && self.content.is_none() {
                self.content = Some(content);
            } else {
                warn!("Unexpected content in state {:?}", self.state);
            }
            return;
        }

        match self.state.next(&event.kind) {
            Some(next) => {
                if let SessionState::Failed(reason) = &next {
                    warn!("Render {} failed: {}", self.ticket, reason);
                }
                self.state = next;
            }
            None => warn!(
                "Rejected {:?} in state {:?}",
                event.kind, self.state
            ),
        }
    }
}

/// How long the next receive may block, or `None` once `deadline` passed.
fn next_slice(deadline: Option<Instant>, poll_interval: Duration) -> Option<Duration> {
    match deadline {
        None => Some(poll_interval),
        Some(deadline) => {
            let remaining = deadline.saturating_duration_since(Instant::now());
            (!remaining.is_zero()).then(|| remaining.min(poll_interval))
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::scripted::Script;
    use std::sync::Arc;
    use std::thread;

    fn quick() -> WaitConfig {
        WaitConfig {
            poll_interval: Duration::from_millis(10),
            settle_delay: Duration::from_millis(20),
            timeout: Some(Duration::from_secs(5)),
        }
    }

    fn event(ticket: Ticket, kind: EngineEventKind) -> EngineEvent {
        EngineEvent::new(ticket, kind)
    }

    #[test]
    fn test_ready_requires_both_events_in_any_order() {
        let state = SessionState::Started;
        let loaded = state.next(&EngineEventKind::LoadFinished).unwrap();
        assert!(!loaded.is_ready());
        assert!(loaded.next(&EngineEventKind::WorkFinished).unwrap().is_ready());

        let worked = state.next(&EngineEventKind::WorkFinished).unwrap();
        assert!(!worked.is_ready());
        assert!(worked.next(&EngineEventKind::LoadFinished).unwrap().is_ready());
    }

    #[test]
    fn test_failed_is_terminal() {
        let failed = SessionState::Ready
            .next(&EngineEventKind::Failed("boom".into()))
            .unwrap();
        assert!(failed.is_failed());
        assert!(!failed.is_ready());
        assert_eq!(failed.next(&EngineEventKind::LoadFinished), None);
        assert_eq!(failed.next(&EngineEventKind::Failed("again".into())), None);
    }

    #[test]
    fn test_duplicate_event_leaves_state_unchanged() {
        let mut session = RenderingSession::new(Script::default().factory().as_ref());
        session.start("<body></body>", Path::new("/notes/a.md"), "x");

        session.apply(event(1, EngineEventKind::LoadFinished));
        session.apply(event(1, EngineEventKind::LoadFinished));
        assert_eq!(session.state(), &SessionState::LoadFinished);
    }

    #[test]
    fn test_stale_events_are_ignored() {
        let mut session = RenderingSession::new(Script::default().factory().as_ref());
        session.start("<body></body>", Path::new("a.md"), "x");
        session.start("<body></body>", Path::new("a.md"), "y");

        session.apply(event(1, EngineEventKind::Failed("old".into())));
        session.apply(event(1, EngineEventKind::LoadFinished));
        assert_eq!(session.state(), &SessionState::Started);

        session.apply(event(2, EngineEventKind::WorkFinished));
        session.apply(event(2, EngineEventKind::LoadFinished));
        assert!(session.is_ready());
    }

    #[test]
    fn test_start_resets_failed_session() {
        let mut session = RenderingSession::new(Script::default().factory().as_ref());
        session.start("<body></body>", Path::new("a.md"), "x");
        session.apply(event(1, EngineEventKind::Failed("boom".into())));
        assert!(session.is_failed());

        session.start("<body></body>", Path::new("a.md"), "x");
        assert_eq!(session.state(), &SessionState::Started);
    }

    #[test]
    fn test_wait_then_request_content() {
        let factory = Script::rendering("<p>hi</p>").factory();
        let mut session = RenderingSession::new(factory.as_ref());
        let stop = AtomicBool::new(false);

        session.start("<body></body>", Path::new("a.md"), "hi");
        assert_eq!(session.wait_until_ready(&quick(), &stop).unwrap(), Waited::Done(()));
        assert_eq!(session.settle(&quick(), &stop).unwrap(), Waited::Done(()));

        let Waited::Done(content) = session.request_content(&quick(), &stop).unwrap() else {
            panic!("expected content");
        };
        assert_eq!(content.body, "<p>hi</p>");
    }

    #[test]
    fn test_wait_reports_engine_failure() {
        let script = Script {
            on_html: vec![EngineEventKind::Failed("bad page".into())],
            ..Default::default()
        };
        let mut session = RenderingSession::new(script.factory().as_ref());
        session.start("", Path::new("a.md"), "x");

        let err = session
            .wait_until_ready(&quick(), &AtomicBool::new(false))
            .unwrap_err();
        assert_eq!(err.to_string(), "Rendering failed: bad page");
    }

    #[test]
    fn test_wait_times_out() {
        let mut session = RenderingSession::new(Script::stalling().factory().as_ref());
        let wait = WaitConfig {
            timeout: Some(Duration::from_millis(50)),
            ..quick()
        };
        session.start("<body></body>", Path::new("a.md"), "x");

        let err = session.wait_until_ready(&wait, &AtomicBool::new(false)).unwrap_err();
        assert!(matches!(err, ExportError::Render(_)));
    }

    #[test]
    fn test_wait_observes_stop_flag() {
        let mut session = RenderingSession::new(Script::stalling().factory().as_ref());
        let stop = Arc::new(AtomicBool::new(false));
        session.start("<body></body>", Path::new("a.md"), "x");

        let flag = Arc::clone(&stop);
        let stopper = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            flag.store(true, Ordering::SeqCst);
        });

        assert_eq!(session.wait_until_ready(&quick(), &stop).unwrap(), Waited::Cancelled);
        stopper.join().unwrap();
    }

    #[test]
    fn test_zero_timeout_setting_waits_forever() {
        let mut settings = ExportSettings::default();
        settings.render_timeout_secs = 0;
        assert_eq!(WaitConfig::from_settings(&settings).timeout, None);
        assert_eq!(
            WaitConfig::default().timeout,
            Some(Duration::from_secs(30))
        );
    }

    #[test]
    fn test_content_before_ready_is_an_error() {
        let mut session = RenderingSession::new(Script::stalling().factory().as_ref());
        session.start("<body></body>", Path::new("a.md"), "x");
        assert!(session
            .request_content(&quick(), &AtomicBool::new(false))
            .is_err());
    }
}
