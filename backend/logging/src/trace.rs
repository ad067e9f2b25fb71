//! Transport trace ingest.
//!
//! The wire library reports its internals through `tracing`. This layer
//! forwards each event's target and message into the sink as a TRACE line,
//! dropping the per-frame send/receive dumps that would otherwise swamp
//! the log.

use std::fmt;
use std::sync::Arc;

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use crate::sink::LogSink;

/// Message prefixes recognized as high-volume wire noise.
const NOISE_PREFIXES: [&str; 2] = ["Sent ->", "<- Recv'd"];

/// A `tracing_subscriber` layer feeding transport events into a [`LogSink`].
pub struct TransportTraceLayer {
    sink: Arc<LogSink>,
}

impl TransportTraceLayer {
    pub fn new(sink: Arc<LogSink>) -> Self {
        Self { sink }
    }
}

impl<S: Subscriber> Layer<S> for TransportTraceLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let Some(message) = visitor.message else {
            return;
        };
        if NOISE_PREFIXES.iter().any(|p| message.starts_with(p)) {
            return;
        }

        self.sink.write_trace(event.metadata().target(), &message);
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: Option<String>,
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{value:?}"));
        }
    }
}
