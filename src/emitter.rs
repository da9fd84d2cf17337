use crate::event::LogEvent;
use crate::fields::FieldValue;
use crate::message::{MessageConfig, MessageDict, MessageDictBuilder};
use crate::transport::{SocketMode, SyslogTransport};
use std::io;

/// Cookie marking the structured payload inside the syslog message
/// part. Everything after it is a JSON object.
pub const CEE_COOKIE: &str = ": @cee: ";

/// Registered syslog port.
pub const SYSLOG_PORT: u16 = 514;

// syslog PRI = facility * 8 + severity; this emitter always tags USER.
const FACILITY_USER: i64 = 1;

/// Configuration for [`CeeSyslogEmitter`].
#[derive(Debug, Clone)]
pub struct CeeSyslogConfig {
    /// Syslog server address as (hostname, port).
    pub address: (String, u16),
    pub mode: SocketMode,
    pub message: MessageConfig,
}

impl Default for CeeSyslogConfig {
    fn default() -> Self {
        CeeSyslogConfig {
            address: ("localhost".to_string(), SYSLOG_PORT),
            mode: SocketMode::Udp,
            message: MessageConfig::default(),
        }
    }
}

/// Emission failure.
#[derive(thiserror::Error, Debug)]
pub enum EmitError {
    #[error("failed to serialize message dict: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("syslog transport error: {0}")]
    Transport(#[from] io::Error),

    #[error("invalid timestamp pattern {0:?}")]
    Timestamp(String),
}

/// Serializes message dicts as CEE-tagged syslog lines and hands them
/// to a syslog transport.
///
/// The transport is opened and the hostname resolved once, at
/// construction. Delivery failures are returned to the caller and not
/// retried here.
pub struct CeeSyslogEmitter {
    transport: SyslogTransport,
    builder: MessageDictBuilder,
}

impl CeeSyslogEmitter {
    pub fn new(config: CeeSyslogConfig) -> Result<Self, EmitError> {
        let transport = SyslogTransport::connect(
            (config.address.0.as_str(), config.address.1),
            config.mode,
        )?;
        Ok(CeeSyslogEmitter {
            transport,
            builder: MessageDictBuilder::new(config.message),
        })
    }

    /// Emitter that stamps a service name into every message as the
    /// static field `_name`.
    pub fn for_service(
        address: (String, u16),
        mode: SocketMode,
        service_name: &str,
    ) -> Result<Self, EmitError> {
        let mut config = CeeSyslogConfig {
            address,
            mode,
            ..CeeSyslogConfig::default()
        };
        config
            .message
            .static_fields
            .insert("name".to_string(), FieldValue::from(service_name));
        Self::new(config)
    }

    /// The field mapping this emitter would serialize for `event`.
    pub fn message_dict(&self, event: &LogEvent) -> MessageDict {
        self.builder.build(event)
    }

    /// Render the CEE message part: the cookie followed by the compact
    /// JSON payload. Always a single line; the serializer escapes any
    /// embedded newlines.
    pub fn format(&self, event: &LogEvent) -> Result<String, EmitError> {
        let payload = serde_json::to_string(&self.builder.build(event))?;
        Ok(format!("{}{}", CEE_COOKIE, payload))
    }

    /// Serialize and send one event.
    pub fn emit(&self, event: &LogEvent) -> Result<(), EmitError> {
        let line = format!("<{}>{}", priority(event), self.format(event)?);
        self.transport.send(line.as_bytes())?;
        Ok(())
    }
}

fn priority(event: &LogEvent) -> i64 {
    let severity = event.severity.syslog_level();
    // out-of-range levels are tagged informational on the wire; the
    // payload keeps the native value
    let severity = if (0..=7).contains(&severity) { severity } else { 6 };
    FACILITY_USER * 8 + severity
}
