//! Forward tracing events to an external logger transport.
//!
//! Embedding applications may pass their own logger transports. This module
//! provides a small tracing [`Layer`] that relays every event as a
//! [`LogRecord`] over a bounded channel when a sink is set:
//! - Call [`set_sink`] with a `tokio::sync::mpsc::Sender<LogRecord>`.
//! - Install the [`layer`] in your tracing subscriber.
//! - Call [`clear_sink`] when the transport goes away.
//!
//! The layer no-ops when no sink is set. A full sink drops records; a closed
//! sink is cleared.

use std::sync::{
    OnceLock,
    atomic::{AtomicU64, Ordering},
};

use parking_lot::Mutex;
use tokio::sync::mpsc::{Sender, error::TrySendError};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use crate::fmt;

/// One forwarded log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Which controller logged it: `MAIN`, `RENDERER`, or `AOT` otherwise.
    pub side: &'static str,
    /// Level name, e.g. `INFO`.
    pub level: String,
    /// Event target, usually the module path.
    pub target: String,
    /// Rendered message and fields.
    pub message: String,
}

/// Sending half of a log transport.
pub type LogTx = Sender<LogRecord>;

static LOG_SINK: OnceLock<Mutex<Option<LogTx>>> = OnceLock::new();

/// Count of log records dropped due to a full transport.
static LOG_DROPS: AtomicU64 = AtomicU64::new(0);

fn sink() -> &'static Mutex<Option<LogTx>> {
    LOG_SINK.get_or_init(|| Mutex::new(None))
}

/// Set the forwarding sink.
pub fn set_sink(tx: LogTx) {
    *sink().lock() = Some(tx);
}

/// Clear the forwarding sink.
pub fn clear_sink() {
    *sink().lock() = None;
}

/// Records dropped so far because the sink was full.
pub fn dropped() -> u64 {
    LOG_DROPS.load(Ordering::SeqCst)
}

/// Side tag for a tracing target.
pub fn side_for(target: &str) -> &'static str {
    if target.starts_with("aot_host") {
        "MAIN"
    } else if target.starts_with("aot_client") {
        "RENDERER"
    } else {
        "AOT"
    }
}

/// Tracing layer that forwards events when a sink is set.
pub struct ForwardLayer;

impl<S> Layer<S> for ForwardLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let tx_opt = { sink().lock().clone() };
        let Some(tx) = tx_opt else { return };

        let line = fmt::render(event);
        let record = LogRecord {
            side: side_for(&line.target),
            level: line.level,
            target: line.target,
            message: line.text,
        };
        match tx.try_send(record) {
            Ok(()) => {}
            Err(TrySendError::Closed(_)) => clear_sink(),
            Err(TrySendError::Full(_)) => {
                let n = LOG_DROPS.fetch_add(1, Ordering::SeqCst) + 1;
                if n == 1 || n.is_multiple_of(1000) {
                    tracing::debug!(count = n, "log_forward_drop");
                }
            }
        }
    }
}

/// Create the forwarding layer instance to add to your subscriber.
pub fn layer() -> ForwardLayer {
    ForwardLayer
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;
    use tracing_subscriber::{prelude::*, registry};

    use super::*;

    #[test]
    fn records_are_forwarded_then_dropped_when_full_then_cleared() {
        let subscriber = registry().with(layer());
        tracing::subscriber::with_default(subscriber, || {
            let (tx, mut rx) = mpsc::channel(1);
            set_sink(tx);
            tracing::info!(target: "aot_host::host", state = "aot-open", "sending state update");
            let rec = rx.try_recv().unwrap();
            assert_eq!(rec.side, "MAIN");
            assert_eq!(rec.level, "INFO");
            assert_eq!(rec.message, "sending state update state=aot-open");

            tracing::warn!(target: "aot_client::client", "one");
            tracing::warn!(target: "aot_client::client", "two");
            assert!(dropped() >= 1);
            assert_eq!(rx.try_recv().unwrap().side, "RENDERER");

            drop(rx);
            tracing::info!("after close");
            assert!(sink().lock().is_none());
        });
    }

    #[test]
    fn side_tags() {
        assert_eq!(side_for("aot_host"), "MAIN");
        assert_eq!(side_for("aot_client::session"), "RENDERER");
        assert_eq!(side_for("aot_sim"), "AOT");
    }
}
