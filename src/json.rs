use crate::emitter::EmitError;
use crate::event::LogEvent;
use crate::message::{MessageConfig, MessageDictBuilder};
use serde_json::Value;
use std::fmt::Write as _;

/// Default timestamp pattern for the JSON document.
pub const DEFAULT_DATEFMT: &str = "%Y-%m-%d %H:%M:%S";

/// Configuration for [`JsonFormatter`].
#[derive(Debug, Clone)]
pub struct JsonConfig {
    pub message: MessageConfig,
    /// strftime pattern applied to the `timestamp` field.
    pub datefmt: String,
}

impl Default for JsonConfig {
    fn default() -> Self {
        JsonConfig {
            message: MessageConfig::default(),
            datefmt: DEFAULT_DATEFMT.to_string(),
        }
    }
}

/// Formats events as standalone flat JSON documents.
///
/// Same field mapping as the CEE emitter, with two differences: the
/// timestamp is a pattern-formatted date string instead of an epoch
/// float, and the internal-only `short_message` and `source_facility`
/// keys are removed before output.
pub struct JsonFormatter {
    builder: MessageDictBuilder,
    datefmt: String,
}

impl JsonFormatter {
    pub fn new(config: JsonConfig) -> Self {
        JsonFormatter {
            builder: MessageDictBuilder::new(config.message),
            datefmt: config.datefmt,
        }
    }

    pub fn format(&self, event: &LogEvent) -> Result<String, EmitError> {
        let mut dict = self.builder.build(event);
        dict.remove("short_message");
        dict.remove("source_facility");

        let mut stamp = String::new();
        write!(stamp, "{}", event.timestamp.format(&self.datefmt))
            .map_err(|_| EmitError::Timestamp(self.datefmt.clone()))?;
        dict.insert("timestamp".to_string(), Value::from(stamp));

        Ok(serde_json::to_string(&dict)?)
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        JsonFormatter::new(JsonConfig::default())
    }
}
