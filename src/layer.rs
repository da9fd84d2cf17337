use crate::emitter::CeeSyslogEmitter;
use crate::event::{LogEvent, Severity};
use crate::fields::FieldValue;
use crate::filter::{RedactingFilter, RegexFilter};
use std::collections::BTreeMap;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// `tracing_subscriber` layer that observes events and emits them as
/// CEE syslog lines through a [`CeeSyslogEmitter`].
///
/// Emission is synchronous: each event is converted, filtered and sent
/// within the logging call, with no channel or background task in
/// between. A blocking transport write blocks the caller. Failures are
/// counted and reported to stderr, never propagated — logging must not
/// crash the application being logged.
pub struct CeeSyslogLayer {
    emitter: CeeSyslogEmitter,
    filters: Vec<RegexFilter>,
    redactions: Vec<RedactingFilter>,
    /// Total events seen by the layer.
    pub observed_events: Arc<AtomicU64>,
    /// Events handed to the transport.
    pub emitted_events: Arc<AtomicU64>,
    /// Events dropped by a filter.
    pub suppressed_events: Arc<AtomicU64>,
    /// Events lost to serialization or transport failures.
    pub failed_events: Arc<AtomicU64>,
}

impl CeeSyslogLayer {
    pub fn new(emitter: CeeSyslogEmitter) -> Self {
        CeeSyslogLayer {
            emitter,
            filters: Vec::new(),
            redactions: Vec::new(),
            observed_events: Arc::new(AtomicU64::new(0)),
            emitted_events: Arc::new(AtomicU64::new(0)),
            suppressed_events: Arc::new(AtomicU64::new(0)),
            failed_events: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Attach a drop filter; matching events are suppressed.
    pub fn with_filter(mut self, filter: RegexFilter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Attach a redacting filter; filters run in attachment order.
    pub fn with_redaction(mut self, filter: RedactingFilter) -> Self {
        self.redactions.push(filter);
        self
    }

    fn handle(&self, event: LogEvent) {
        if !self.filters.iter().all(|filter| filter.accept(&event)) {
            self.suppressed_events.fetch_add(1, Ordering::Relaxed);
            return;
        }

        let mut event = event;
        for redaction in &self.redactions {
            event = redaction.transform(&event);
        }

        match self.emitter.emit(&event) {
            Ok(()) => {
                self.emitted_events.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                self.failed_events.fetch_add(1, Ordering::Relaxed);
                eprintln!("cee-syslog: failed to emit log record: {}", e);
            }
        }
    }
}

impl<S> Layer<S> for CeeSyslogLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event, _ctx: Context<'_, S>) {
        self.observed_events.fetch_add(1, Ordering::Relaxed);

        let mut fields = BTreeMap::new();
        let mut message: Option<String> = None;
        let mut visitor = FieldVisitor {
            fields: &mut fields,
            message: &mut message,
        };
        event.record(&mut visitor);

        let meta = event.metadata();
        let mut record = LogEvent::new(
            meta.target(),
            Severity::from(*meta.level()),
            message.unwrap_or_default(),
        );
        record.file = meta.file().map(|s| s.to_string());
        record.line = meta.line();
        record.extras = fields;

        self.handle(record);
    }
}

/// Collects a tracing event's fields into the extras bag, routing the
/// `message` field to the message slot.
pub struct FieldVisitor<'a> {
    pub fields: &'a mut BTreeMap<String, FieldValue>,
    pub message: &'a mut Option<String>,
}

impl Visit for FieldVisitor<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            *self.message = Some(value.to_string());
        } else {
            self.fields
                .insert(field.name().to_string(), FieldValue::from(value));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields
            .insert(field.name().to_string(), FieldValue::Int(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        let value = i64::try_from(value)
            .map(FieldValue::Int)
            .unwrap_or_else(|_| FieldValue::Str(value.to_string()));
        self.fields.insert(field.name().to_string(), value);
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.fields
            .insert(field.name().to_string(), FieldValue::Float(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        // the wire formats carry no booleans
        self.fields
            .insert(field.name().to_string(), FieldValue::Str(value.to_string()));
    }

    fn record_error(
        &mut self,
        field: &Field,
        value: &(dyn std::error::Error + 'static),
    ) {
        self.fields
            .insert(field.name().to_string(), FieldValue::Str(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let rendered = format!("{:?}", value);
        if field.name() == "message" {
            *self.message = Some(rendered);
        } else {
            self.fields
                .insert(field.name().to_string(), FieldValue::Str(rendered));
        }
    }
}
