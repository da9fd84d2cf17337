use crate::fields::{display_string, FieldValue};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Severity of a log event.
///
/// The named levels map onto the syslog scale; [`Severity::Other`]
/// carries an unmapped native level through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Critical,
    Error,
    Warning,
    Info,
    Debug,
    Other(i64),
}

impl Severity {
    /// Syslog level for this severity: critical 2, error 3, warning 4,
    /// info 6, debug 7. Unmapped severities pass through their native
    /// numeric value.
    pub fn syslog_level(self) -> i64 {
        match self {
            Severity::Critical => 2,
            Severity::Error => 3,
            Severity::Warning => 4,
            Severity::Info => 6,
            Severity::Debug => 7,
            Severity::Other(level) => level,
        }
    }
}

impl From<tracing::Level> for Severity {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::ERROR => Severity::Error,
            tracing::Level::WARN => Severity::Warning,
            tracing::Level::INFO => Severity::Info,
            // syslog has no trace level
            tracing::Level::DEBUG | tracing::Level::TRACE => Severity::Debug,
        }
    }
}

/// A captured error condition attached to a log event.
#[derive(Debug, Clone, Serialize)]
pub struct ExceptionInfo {
    /// Error type, e.g. `io::Error`.
    pub kind: String,
    /// Error value rendered as text.
    pub message: String,
    /// Stack frames, outermost first.
    pub backtrace: Vec<String>,
}

impl ExceptionInfo {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        ExceptionInfo {
            kind: kind.into(),
            message: message.into(),
            backtrace: Vec::new(),
        }
    }

    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.backtrace.push(frame.into());
        self
    }

    /// Full rendering: type and value on the first line, then one line
    /// per stack frame.
    pub fn format(&self) -> String {
        let mut lines = Vec::with_capacity(1 + self.backtrace.len());
        lines.push(format!("{}: {}", self.kind, self.message));
        lines.extend(self.backtrace.iter().cloned());
        lines.join("\n")
    }
}

/// A structured application log event.
///
/// The message is stored as a template plus positional arguments and
/// rendered lazily; arbitrary named attributes travel in `extras` and
/// end up underscore-prefixed in the emitted message dict.
#[derive(Debug, Clone)]
pub struct LogEvent {
    pub logger: String,
    pub severity: Severity,
    /// Message template; each `{}` is substituted with the next
    /// positional argument on render.
    pub message: String,
    pub args: Vec<FieldValue>,
    pub timestamp: DateTime<Utc>,
    pub file: Option<String>,
    pub line: Option<u32>,
    pub function: Option<String>,
    pub pid: u32,
    pub thread_name: Option<String>,
    pub process_name: Option<String>,
    pub exception: Option<ExceptionInfo>,
    /// Cached rendering of the exception. Once present it is
    /// authoritative over re-formatting `exception`, so a filter that
    /// rewrites it cannot be bypassed downstream.
    pub exception_text: Option<String>,
    pub extras: BTreeMap<String, FieldValue>,
}

impl LogEvent {
    /// Create an event stamped with the current time, process id and
    /// thread name.
    pub fn new(logger: impl Into<String>, severity: Severity, message: impl Into<String>) -> Self {
        LogEvent {
            logger: logger.into(),
            severity,
            message: message.into(),
            args: Vec::new(),
            timestamp: Utc::now(),
            file: None,
            line: None,
            function: None,
            pid: std::process::id(),
            thread_name: std::thread::current().name().map(|name| name.to_string()),
            process_name: None,
            exception: None,
            exception_text: None,
            extras: BTreeMap::new(),
        }
    }

    /// Append a positional argument for the message template.
    pub fn with_arg(mut self, arg: impl Into<FieldValue>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Attach a named attribute.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.extras.insert(key.into(), value.into());
        self
    }

    pub fn with_source(
        mut self,
        file: impl Into<String>,
        line: u32,
        function: impl Into<String>,
    ) -> Self {
        self.file = Some(file.into());
        self.line = Some(line);
        self.function = Some(function.into());
        self
    }

    pub fn with_exception(mut self, exception: ExceptionInfo) -> Self {
        self.exception = Some(exception);
        self
    }

    /// Render the message: each `{}` placeholder is replaced with the
    /// next positional argument. Surplus placeholders stay literal; a
    /// panicking argument conversion degrades to the sanitizer
    /// fallback rather than aborting the render.
    pub fn rendered_message(&self) -> String {
        if self.args.is_empty() {
            return self.message.clone();
        }
        let mut out = String::with_capacity(self.message.len());
        let mut rest = self.message.as_str();
        let mut args = self.args.iter();
        while let Some(pos) = rest.find("{}") {
            out.push_str(&rest[..pos]);
            match args.next() {
                Some(arg) => out.push_str(&display_string(arg)),
                None => out.push_str("{}"),
            }
            rest = &rest[pos + 2..];
        }
        out.push_str(rest);
        out
    }

    /// Fully formatted exception text, if the event carries one: the
    /// cached rendering when present, otherwise formatted fresh from
    /// the captured exception.
    pub fn exception_message(&self) -> Option<String> {
        match (&self.exception_text, &self.exception) {
            (Some(text), _) => Some(text.clone()),
            (None, Some(exception)) => Some(exception.format()),
            (None, None) => None,
        }
    }
}
