//! Structured CEE syslog emission: log events become `@cee:`-tagged
//! JSON syslog lines or standalone JSON documents, with regex-based
//! redaction and drop filters in front of the wire.
//!
//! ```no_run
//! use cee_syslog::emitter::{CeeSyslogConfig, CeeSyslogEmitter};
//! use cee_syslog::event::{LogEvent, Severity};
//!
//! # fn main() -> Result<(), cee_syslog::emitter::EmitError> {
//! let mut config = CeeSyslogConfig::default();
//! config.address = ("10.2.160.20".to_string(), 514);
//! let emitter = CeeSyslogEmitter::new(config)?;
//!
//! emitter.emit(&LogEvent::new("simple_example", Severity::Info, "info message")
//!     .with_extra("foo", "bar"))?;
//! # Ok(())
//! # }
//! ```

pub mod event;
pub mod fields;
pub mod filter;
pub mod message;
pub mod transport;

pub mod emitter;
pub mod json;

pub mod layer;
pub mod init;
