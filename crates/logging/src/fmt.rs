//! One-line rendering of `tracing` events for forwarded records.

use std::fmt::{self, Write};

use tracing::{
    Event,
    field::{Field, Visit},
};

/// An event flattened to text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// Level name, e.g. `WARN`.
    pub level: String,
    /// Event target.
    pub target: String,
    /// Message text, then the other fields as logfmt pairs.
    pub text: String,
}

/// Collects the message and the logfmt tail separately so the message can
/// lead regardless of field order.
#[derive(Default)]
struct LineVisitor {
    message: String,
    pairs: Vec<String>,
}

impl LineVisitor {
    fn push(&mut self, field: &Field, value: String) {
        if field.name() == "message" {
            self.message = value;
            return;
        }
        let mut pair = String::from(field.name());
        pair.push('=');
        if value.is_empty() || value.contains(char::is_whitespace) || value.contains('"') {
            let _ = write!(pair, "{value:?}");
        } else {
            pair.push_str(&value);
        }
        self.pairs.push(pair);
    }

    fn finish(self) -> String {
        let mut out = self.message;
        for pair in self.pairs {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(&pair);
        }
        out
    }
}

impl Visit for LineVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.push(field, value.to_owned());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.push(field, format!("{value:?}"));
    }
}

/// Flatten `event` into a [`Line`]. Values with spaces or quotes are quoted;
/// an event without a message renders only its pairs.
pub fn render(event: &Event<'_>) -> Line {
    let meta = event.metadata();
    let mut visitor = LineVisitor::default();
    event.record(&mut visitor);
    Line {
        level: meta.level().as_str().to_owned(),
        target: meta.target().to_owned(),
        text: visitor.finish(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;
    use tracing::{info, subscriber::with_default};
    use tracing_subscriber::{Layer, layer::Context, prelude::*, registry};

    use super::*;

    struct Capture(Arc<Mutex<Vec<Line>>>);

    impl<S: tracing::Subscriber> Layer<S> for Capture {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            self.0.lock().push(render(event));
        }
    }

    fn capture(f: impl FnOnce()) -> Vec<Line> {
        let lines = Arc::new(Mutex::new(Vec::new()));
        with_default(registry().with(Capture(lines.clone())), f);
        let out = lines.lock().clone();
        out
    }

    #[test]
    fn message_leads_and_spaced_values_are_quoted() {
        let lines = capture(|| {
            let frame = "AlwaysOnTop-abc";
            let reason = "gpu crashed";
            info!(window_id = 7, frame, reason, "closing superseded aot window");
        });
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].level, "INFO");
        assert_eq!(
            lines[0].text,
            "closing superseded aot window window_id=7 frame=AlwaysOnTop-abc reason=\"gpu crashed\""
        );
    }

    #[test]
    fn events_without_a_message_render_their_pairs() {
        let lines = capture(|| info!(count = 3, empty = ""));
        assert_eq!(lines[0].text, "count=3 empty=\"\"");
    }
}
