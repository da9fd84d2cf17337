use crate::event::LogEvent;
use crate::fields::{custom_key, is_skipped, sanitize, FieldValue};
use serde_json::Value;
use std::collections::BTreeMap;

/// Format version stamped into every message dict.
pub const MESSAGE_VERSION: &str = "1.0";

/// The assembled per-event field mapping, ready for serialization.
pub type MessageDict = BTreeMap<String, Value>;

/// How the `host` field is obtained.
///
/// Resolution happens once, when the builder is constructed, and the
/// result is reused for every message.
#[derive(Debug, Clone, Default)]
pub enum HostnameSource {
    /// Prefer the fully-qualified name. The kernel hostname already
    /// carries the DNS domain on hosts configured with one; no
    /// resolver lookup is performed.
    Fqdn,
    /// Use the supplied name verbatim.
    Localname(String),
    /// Plain OS hostname.
    #[default]
    Plain,
}

/// Options controlling message-dict construction.
#[derive(Debug, Clone)]
pub struct MessageConfig {
    /// Include `file`, `line`, `_function`, `_pid`, `_thread_name` and
    /// `_process_name` in every message.
    pub debugging_fields: bool,
    /// Copy the event's extra attributes into the message under
    /// underscore-prefixed keys.
    pub extra_fields: bool,
    /// Fixed facility. When unset the event's logger name is used;
    /// when set, the logger name is preserved under `_logger`.
    pub facility: Option<String>,
    /// Fields injected into every message. Keys are namespaced with a
    /// leading underscore at construction time; per-event extras with
    /// the same output key override them.
    pub static_fields: BTreeMap<String, FieldValue>,
    pub hostname: HostnameSource,
}

impl Default for MessageConfig {
    fn default() -> Self {
        MessageConfig {
            debugging_fields: true,
            extra_fields: true,
            facility: None,
            static_fields: BTreeMap::new(),
            hostname: HostnameSource::default(),
        }
    }
}

/// Builds the ordered field mapping for a log event.
///
/// Hostname resolution and static-field sanitization happen once in
/// [`MessageDictBuilder::new`]; [`MessageDictBuilder::build`] is a pure
/// per-event projection after that. `build` never fails: any per-field
/// conversion failure degrades to the sanitizer's fallback string.
pub struct MessageDictBuilder {
    debugging_fields: bool,
    extra_fields: bool,
    facility: Option<String>,
    static_fields: BTreeMap<String, Value>,
    host: String,
}

impl MessageDictBuilder {
    pub fn new(config: MessageConfig) -> Self {
        let host = resolve_host(&config.hostname);
        let static_fields = config
            .static_fields
            .iter()
            .map(|(key, value)| (custom_key(key), sanitize(value)))
            .collect();
        MessageDictBuilder {
            debugging_fields: config.debugging_fields,
            extra_fields: config.extra_fields,
            facility: config.facility,
            static_fields,
            host,
        }
    }

    /// Hostname the builder resolved at construction.
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn build(&self, event: &LogEvent) -> MessageDict {
        let short_message = event.rendered_message();
        let message = event
            .exception_message()
            .unwrap_or_else(|| short_message.clone());

        let mut dict = MessageDict::new();
        dict.insert("version".to_string(), Value::from(MESSAGE_VERSION));
        dict.insert("host".to_string(), Value::from(self.host.as_str()));
        dict.insert("short_message".to_string(), Value::from(short_message));
        dict.insert("message".to_string(), Value::from(message));
        dict.insert(
            "timestamp".to_string(),
            Value::from(event.timestamp.timestamp_micros() as f64 / 1e6),
        );
        dict.insert(
            "level".to_string(),
            Value::from(event.severity.syslog_level()),
        );

        let facility = self
            .facility
            .clone()
            .unwrap_or_else(|| event.logger.clone());
        dict.insert("facility".to_string(), Value::from(facility.as_str()));
        dict.insert("source_facility".to_string(), Value::from(facility.as_str()));
        if self.facility.is_some() {
            // the original logger name is never lost
            dict.insert("_logger".to_string(), Value::from(event.logger.as_str()));
        }

        if self.debugging_fields {
            dict.insert(
                "file".to_string(),
                Value::from(event.file.clone().unwrap_or_default()),
            );
            dict.insert("line".to_string(), Value::from(event.line.unwrap_or(0)));
            dict.insert(
                "_function".to_string(),
                Value::from(event.function.clone().unwrap_or_default()),
            );
            dict.insert("_pid".to_string(), Value::from(event.pid));
            dict.insert(
                "_thread_name".to_string(),
                Value::from(event.thread_name.clone().unwrap_or_default()),
            );
            if let Some(name) = &event.process_name {
                dict.insert("_process_name".to_string(), Value::from(name.as_str()));
            }
        }

        for (key, value) in &self.static_fields {
            dict.insert(key.clone(), value.clone());
        }

        if self.extra_fields {
            // Descending lexicographic order keeps the output
            // reproducible for any merge the caller layers on top.
            for (key, value) in event.extras.iter().rev() {
                if is_skipped(key) {
                    continue;
                }
                // An explicitly underscored attribute owns its output
                // key: a bare `name` never overrides a sibling `_name`.
                if !key.starts_with('_') && event.extras.contains_key(&format!("_{}", key)) {
                    continue;
                }
                dict.insert(custom_key(key), sanitize(value));
            }
        }

        dict
    }
}

fn resolve_host(source: &HostnameSource) -> String {
    match source {
        HostnameSource::Localname(name) => name.clone(),
        HostnameSource::Fqdn | HostnameSource::Plain => hostname::get()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|_| "localhost".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{ExceptionInfo, Severity};
    use std::fmt;

    fn builder(config: MessageConfig) -> MessageDictBuilder {
        MessageDictBuilder::new(config)
    }

    fn event() -> LogEvent {
        LogEvent::new("my.package.logger", Severity::Info, "info message")
    }

    #[test]
    fn core_keys_are_always_present() {
        let dict = builder(MessageConfig::default()).build(&event());
        for key in [
            "version",
            "host",
            "short_message",
            "message",
            "timestamp",
            "level",
            "facility",
            "source_facility",
        ] {
            assert!(dict.contains_key(key), "missing {}", key);
        }
        assert_eq!(dict["version"], "1.0");
        assert_eq!(dict["level"], 6);
    }

    #[test]
    fn facility_defaults_to_logger_name() {
        let dict = builder(MessageConfig::default()).build(&event());
        assert_eq!(dict["facility"], "my.package.logger");
        assert_eq!(dict["source_facility"], "my.package.logger");
        assert!(!dict.contains_key("_logger"));
    }

    #[test]
    fn configured_facility_preserves_logger() {
        let config = MessageConfig {
            facility: Some("my.custom.facility".to_string()),
            ..MessageConfig::default()
        };
        let dict = builder(config).build(&event());
        assert_eq!(dict["facility"], "my.custom.facility");
        assert_eq!(dict["source_facility"], "my.custom.facility");
        assert_eq!(dict["_logger"], "my.package.logger");
    }

    #[test]
    fn localname_is_used_verbatim() {
        let config = MessageConfig {
            hostname: HostnameSource::Localname("edge-01".to_string()),
            ..MessageConfig::default()
        };
        let dict = builder(config).build(&event());
        assert_eq!(dict["host"], "edge-01");
    }

    #[test]
    fn debugging_fields_toggle() {
        let event = event().with_source("src/server.rs", 42, "handle_request");
        let dict = builder(MessageConfig::default()).build(&event);
        assert_eq!(dict["file"], "src/server.rs");
        assert_eq!(dict["line"], 42);
        assert_eq!(dict["_function"], "handle_request");
        assert!(dict.contains_key("_pid"));
        assert!(dict.contains_key("_thread_name"));

        let config = MessageConfig {
            debugging_fields: false,
            ..MessageConfig::default()
        };
        let dict = builder(config).build(&event);
        for key in ["file", "line", "_function", "_pid", "_thread_name"] {
            assert!(!dict.contains_key(key), "unexpected {}", key);
        }
    }

    #[test]
    fn process_name_is_emitted_when_available() {
        let mut event = event();
        event.process_name = Some("worker-3".to_string());
        let dict = builder(MessageConfig::default()).build(&event);
        assert_eq!(dict["_process_name"], "worker-3");

        let dict = builder(MessageConfig::default()).build(&self::event());
        assert!(!dict.contains_key("_process_name"));
    }

    #[test]
    fn extras_are_namespaced() {
        let event = event().with_extra("foo", "bar").with_extra("count", 7);
        let dict = builder(MessageConfig::default()).build(&event);
        assert_eq!(dict["_foo"], "bar");
        assert_eq!(dict["_count"], 7);
        assert!(!dict.contains_key("foo"));
    }

    #[test]
    fn id_fields_are_never_emitted() {
        let event = event().with_extra("id", "abc").with_extra("_id", "def");
        let dict = builder(MessageConfig::default()).build(&event);
        assert!(!dict.contains_key("id"));
        assert!(!dict.contains_key("_id"));
    }

    #[test]
    fn reserved_names_stay_out_of_extras() {
        let event = event()
            .with_extra("message", "shadow")
            .with_extra("timestamp", "shadow");
        let dict = builder(MessageConfig::default()).build(&event);
        assert_eq!(dict["message"], "info message");
        assert!(!dict.contains_key("_message"));
        assert!(!dict.contains_key("_timestamp"));
    }

    #[test]
    fn underscored_attribute_wins_over_bare() {
        let event = event().with_extra("foo", "A").with_extra("_foo", "B");
        let dict = builder(MessageConfig::default()).build(&event);
        assert_eq!(dict["_foo"], "B");
    }

    #[test]
    fn extras_can_be_disabled() {
        let config = MessageConfig {
            extra_fields: false,
            ..MessageConfig::default()
        };
        let dict = builder(config).build(&event().with_extra("special_field", 10));
        assert!(!dict.contains_key("_special_field"));
    }

    #[test]
    fn static_fields_are_prefixed_and_overridable() {
        let mut config = MessageConfig::default();
        config
            .static_fields
            .insert("name".to_string(), FieldValue::from("My Fancy Service"));
        config
            .static_fields
            .insert("region".to_string(), FieldValue::from("eu-1"));
        let built = builder(config);

        let dict = built.build(&event());
        assert_eq!(dict["_name"], "My Fancy Service");
        assert_eq!(dict["_region"], "eu-1");

        // a per-event extra with the same output key wins
        let dict = built.build(&event().with_extra("region", "us-2"));
        assert_eq!(dict["_region"], "us-2");
    }

    #[test]
    fn exception_replaces_full_message_only() {
        let event = event().with_exception(
            ExceptionInfo::new("io::Error", "connection refused").with_frame("at main"),
        );
        let dict = builder(MessageConfig::default()).build(&event);
        assert_eq!(dict["short_message"], "info message");
        assert_eq!(dict["message"], "io::Error: connection refused\nat main");
    }

    #[test]
    fn unmapped_severity_passes_through() {
        let mut event = event();
        event.severity = Severity::Other(42);
        let dict = builder(MessageConfig::default()).build(&event);
        assert_eq!(dict["level"], 42);
    }

    struct Hostile;

    impl fmt::Display for Hostile {
        fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
            panic!("refusing to render");
        }
    }

    #[test]
    fn hostile_extra_does_not_abort_the_build() {
        let event = event().with_extra("bad", FieldValue::other(Hostile));
        let dict = builder(MessageConfig::default()).build(&event);
        assert_eq!(dict["_bad"], crate::fields::SANITIZE_FALLBACK);
    }
}
