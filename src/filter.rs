use crate::event::LogEvent;
use regex::{NoExpand, Regex};

/// Placeholder substituted for redacted matches when no replacement is
/// configured.
pub const DEFAULT_REPLACEMENT: &str = "[REDACTED]";

/// A filter pattern failed to compile. Raised at construction time;
/// a misconfigured filter never makes it into an emission path.
#[derive(thiserror::Error, Debug)]
#[error("invalid filter pattern {pattern:?}")]
pub struct PatternError {
    pattern: String,
    #[source]
    source: regex::Error,
}

fn compile(pattern: &str) -> Result<Regex, PatternError> {
    Regex::new(pattern).map_err(|source| PatternError {
        pattern: pattern.to_string(),
        source,
    })
}

/// Drops events whose rendered message matches a pattern.
///
/// Useful for suppressing noise (health checks, metrics scrapes)
/// before it reaches any emitter.
#[derive(Debug, Clone)]
pub struct RegexFilter {
    pattern: Regex,
}

impl RegexFilter {
    pub fn new(pattern: &str) -> Result<Self, PatternError> {
        Ok(RegexFilter {
            pattern: compile(pattern)?,
        })
    }

    /// False when the pattern matches anywhere in the event's rendered
    /// message; such events are dropped, not emitted.
    pub fn accept(&self, event: &LogEvent) -> bool {
        !self.pattern.is_match(&event.rendered_message())
    }
}

/// Rewrites sensitive substrings before emission.
///
/// Every event passes through; matches in the rendered message and in
/// the exception text are replaced with the configured token. The
/// replacement is inserted literally — no capture-group expansion.
#[derive(Debug, Clone)]
pub struct RedactingFilter {
    pattern: Regex,
    replacement: String,
}

impl RedactingFilter {
    pub fn new(pattern: &str) -> Result<Self, PatternError> {
        Self::with_replacement(pattern, DEFAULT_REPLACEMENT)
    }

    pub fn with_replacement(
        pattern: &str,
        replacement: impl Into<String>,
    ) -> Result<Self, PatternError> {
        Ok(RedactingFilter {
            pattern: compile(pattern)?,
            replacement: replacement.into(),
        })
    }

    /// Produce a redacted copy of the event.
    ///
    /// The message is materialized before scrubbing and the positional
    /// arguments are dropped, so re-rendering cannot resurrect what
    /// was scrubbed — arguments are caller-controlled data and leak
    /// through substitution and display conversions alike. The
    /// exception text, when present, is scrubbed into the cache the
    /// builder treats as authoritative.
    pub fn transform(&self, event: &LogEvent) -> LogEvent {
        let mut redacted = event.clone();
        redacted.message = self.scrub(&event.rendered_message());
        redacted.args.clear();
        if let Some(text) = event.exception_message() {
            redacted.exception_text = Some(self.scrub(&text));
        }
        redacted
    }

    fn scrub(&self, text: &str) -> String {
        self.pattern
            .replace_all(text, NoExpand(&self.replacement))
            .into_owned()
    }
}
