//! `tracing` integration
//!
//! Routes events recorded through `tracing` anywhere in the process into a
//! [`LogPipeline`], so library diagnostics end up in the same rotating file as
//! direct log calls.

use std::fmt::{self, Write as _};
use std::sync::Arc;

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use super::{LogPipeline, Severity};

/// Events from this crate are not forwarded: the log consumer itself emits
/// diagnostics, and feeding those back could loop while the sink is failing.
fn is_internal(target: &str) -> bool {
    let crate_name = env!("CARGO_CRATE_NAME");
    target == crate_name
        || target
            .strip_prefix(crate_name)
            .is_some_and(|rest| rest.starts_with("::"))
}

/// Layer that forwards `tracing` events to a [`LogPipeline`]
pub struct PipelineLayer {
    log: Arc<LogPipeline>,
}

impl PipelineLayer {
    pub fn new(log: Arc<LogPipeline>) -> Self {
        Self { log }
    }
}

impl<S: Subscriber> Layer<S> for PipelineLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if is_internal(metadata.target()) {
            return;
        }

        let severity = Severity::from(*metadata.level());
        if !self.log.is_enabled(severity) {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        self.log.log(severity, visitor.finish());
    }
}

/// Collects the `message` field followed by the remaining fields as `key=value`
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl MessageVisitor {
    fn finish(self) -> String {
        if self.fields.is_empty() {
            self.message
        } else if self.message.is_empty() {
            self.fields
        } else {
            format!("{} {}", self.message, self.fields)
        }
    }

    fn push_field(&mut self, name: &str, value: fmt::Arguments<'_>) {
        if !self.fields.is_empty() {
            self.fields.push(' ');
        }
        let _ = write!(self.fields, "{}={}", name, value);
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.push_field(field.name(), format_args!("{}", value));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.push_field(field.name(), format_args!("{:?}", value));
        }
    }
}
