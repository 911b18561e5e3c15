use std::io;

use thiserror::Error;

/// Everything that can go wrong before or while a run is set up.
///
/// Admission failures are not in here: a denied `try_acquire_*` is an
/// ordinary outcome and is only ever tallied.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("{name} must be a positive integer, got {value}")]
    InvalidRunConfig { name: &'static str, value: i64 },

    #[error("buffer capacity must be at least 2 (one character plus terminator), got {0}")]
    InvalidCapacity(usize),

    #[error("jitter must have at least one step, got {0}")]
    InvalidJitter(u32),

    #[error("unknown strategy '{0}', expected one of: turnstile, turnstile-strict, native-rw")]
    UnknownStrategy(String),

    #[error("failed to spawn {role} worker {index}: {source}")]
    Spawn {
        role: &'static str,
        index: usize,
        #[source]
        source: io::Error,
    },
}

impl GateError {
    /// True for the errors a user fixes by changing arguments or settings.
    pub fn is_config(&self) -> bool {
        !matches!(self, GateError::Spawn { .. })
    }
}
