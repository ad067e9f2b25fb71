//! Reconnect controller.
//!
//! Watches session connect/disconnect notifications from the network layer
//! and re-issues every still-pending job once the session is
//! re-established.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use jobs::JobRegistry;
use logging::LogSink;
use relaybot_core::RelayError;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const COMPONENT: &str = "Reconnect";

/// Connection lifecycle notification from the session layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Connected,
    Disconnected,
}

/// Cloneable handle the connection callbacks use to report lifecycle
/// events without blocking.
#[derive(Clone)]
pub struct SessionEvents {
    tx: mpsc::Sender<SessionEvent>,
}

impl SessionEvents {
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<SessionEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// Report one event. The controller drains quickly, so a full or
    /// closed channel means it is gone.
    pub fn notify(&self, event: SessionEvent) -> Result<(), RelayError> {
        self.tx
            .try_send(event)
            .map_err(|_| RelayError::ChannelClosed("session events".into()))
    }
}

/// Drives [`JobRegistry::restart_jobs_if_any`] at the right moment: after
/// every (re-)establishment of the session. On a fresh session the table
/// is empty and the restart is a no-op.
pub struct ReconnectController {
    registry: Arc<JobRegistry>,
    log: Arc<LogSink>,
}

impl ReconnectController {
    pub fn new(registry: Arc<JobRegistry>, log: Arc<LogSink>) -> Self {
        Self { registry, log }
    }

    /// Consume session events until the sender side closes.
    pub fn spawn(self, mut rx: mpsc::Receiver<SessionEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut lost_at: Option<DateTime<Utc>> = None;
            while let Some(event) = rx.recv().await {
                self.handle(event, &mut lost_at);
            }
        })
    }

    fn handle(&self, event: SessionEvent, lost_at: &mut Option<DateTime<Utc>>) {
        match event {
            SessionEvent::Disconnected => {
                *lost_at = Some(Utc::now());
                self.log.write_warn(
                    COMPONENT,
                    &format!(
                        "Session lost with {} jobs pending",
                        self.registry.jobs_count()
                    ),
                );
            }
            SessionEvent::Connected => {
                match lost_at.take() {
                    Some(when) => {
                        let downtime = Utc::now().signed_duration_since(when);
                        self.log.write_info(
                            COMPONENT,
                            &format!(
                                "Session re-established after {}s",
                                downtime.num_seconds()
                            ),
                        );
                    }
                    None => self.log.write_info(COMPONENT, "Session established"),
                }
                self.registry.restart_jobs_if_any();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobs::IssueFn;
    use logging::{LogConfig, LogLevel, LogSink};
    use relaybot_core::JobId;
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

    fn quiet_sink() -> Arc<LogSink> {
        Arc::new(LogSink::new(LogConfig {
            level: LogLevel::Error,
            ..LogConfig::default()
        }))
    }

    fn counting_action(sequence: Arc<AtomicU64>, calls: Arc<AtomicUsize>) -> IssueFn {
        Arc::new(move || {
            calls.fetch_add(1, Ordering::SeqCst);
            JobId(sequence.fetch_add(1, Ordering::SeqCst))
        })
    }

    #[tokio::test]
    async fn reconnect_reissues_pending_jobs() {
        let registry = Arc::new(JobRegistry::new(quiet_sink()));
        let sequence = Arc::new(AtomicU64::new(1));
        let calls_a = Arc::new(AtomicUsize::new(0));
        let calls_b = Arc::new(AtomicUsize::new(0));
        registry.add_job(counting_action(Arc::clone(&sequence), Arc::clone(&calls_a)));
        registry.add_job(counting_action(Arc::clone(&sequence), Arc::clone(&calls_b)));

        let controller = ReconnectController::new(Arc::clone(&registry), quiet_sink());
        let (events, rx) = SessionEvents::channel(8);
        let handle = controller.spawn(rx);

        events.notify(SessionEvent::Disconnected).unwrap();
        events.notify(SessionEvent::Connected).unwrap();
        drop(events);
        handle.await.unwrap();

        assert_eq!(calls_a.load(Ordering::SeqCst), 2);
        assert_eq!(calls_b.load(Ordering::SeqCst), 2);
        assert_eq!(registry.jobs_count(), 2);
    }

    #[tokio::test]
    async fn fresh_session_restart_is_a_no_op() {
        let registry = Arc::new(JobRegistry::new(quiet_sink()));
        let controller = ReconnectController::new(Arc::clone(&registry), quiet_sink());
        let (events, rx) = SessionEvents::channel(8);
        let handle = controller.spawn(rx);

        events.notify(SessionEvent::Connected).unwrap();
        drop(events);
        handle.await.unwrap();

        assert_eq!(registry.jobs_count(), 0);
    }

    #[tokio::test]
    async fn notify_reports_a_closed_controller() {
        let (events, rx) = SessionEvents::channel(1);
        drop(rx);
        let err = events.notify(SessionEvent::Disconnected).unwrap_err();
        assert!(matches!(err, RelayError::ChannelClosed(_)));
    }
}
