//! Admission control for the shared buffer.
//!
//! Every strategy answers the same four questions without ever blocking on
//! the buffer itself: may this reader go in, may this writer go in, and how
//! does each of them leave again.

use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_derive::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::GateError;

mod native;
mod turnstile;

pub use native::NativeRw;
pub use turnstile::{StrictTurnstile, Turnstile};

/// Which admission strategy a run uses.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Counting turnstile with the first-reader anomaly left in place.
    #[default]
    Turnstile,
    /// Counting turnstile where a denied first reader leaves the counter alone.
    TurnstileStrict,
    /// One reader-writer lock, tried shared or exclusive.
    NativeRw,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [
        Strategy::Turnstile,
        Strategy::TurnstileStrict,
        Strategy::NativeRw,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Turnstile => "turnstile",
            Strategy::TurnstileStrict => "turnstile-strict",
            Strategy::NativeRw => "native-rw",
        }
    }

    /// Builds a fresh coordinator for this strategy.
    pub fn coordinator(&self) -> Arc<dyn AccessCoordinator> {
        match self {
            Strategy::Turnstile => Arc::new(Turnstile::new()),
            Strategy::TurnstileStrict => Arc::new(StrictTurnstile::new()),
            Strategy::NativeRw => Arc::new(NativeRw::new()),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Strategy::ALL
            .iter()
            .copied()
            .find(|strategy| strategy.name() == wanted)
            .or_else(|| match wanted.as_str() {
                "mutex" => Some(Strategy::Turnstile),
                "rwlock" | "rw" => Some(Strategy::NativeRw),
                _ => None,
            })
            .ok_or_else(|| GateError::UnknownStrategy(s.to_string()))
    }
}

/// Identity of one coordinator instance, stamped on everything it hands out.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct IssuerId(u64);

static NEXT_ISSUER: AtomicU64 = AtomicU64::new(1);

impl IssuerId {
    pub(crate) fn next() -> IssuerId {
        IssuerId(NEXT_ISSUER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for IssuerId {
    fn default() -> Self {
        IssuerId::next()
    }
}

/// Proof that a reader was admitted. Lets its holder read the buffer.
///
/// Passes stay on the thread that obtained them.
#[derive(Debug)]
pub struct ReadPass {
    issuer: IssuerId,
    _not_send: PhantomData<*const ()>,
}

/// Proof that a writer was admitted. Lets its holder overwrite the buffer.
#[derive(Debug)]
#[must_use = "a write pass must be handed back through release_write"]
pub struct WritePass {
    issuer: IssuerId,
    _not_send: PhantomData<*const ()>,
}

impl WritePass {
    pub(crate) fn new(issuer: IssuerId) -> WritePass {
        WritePass {
            issuer,
            _not_send: PhantomData,
        }
    }

    pub fn issuer(&self) -> IssuerId {
        self.issuer
    }
}

/// Outcome of a read attempt.
///
/// Denied tickets are released too: the turnstile counts a reader from the
/// moment it tries, not from the moment it gets in.
#[derive(Debug)]
#[must_use = "a read ticket must be handed back through release_read"]
pub enum ReadTicket {
    Admitted(ReadPass),
    Denied(IssuerId),
}

impl ReadTicket {
    pub(crate) fn admitted(issuer: IssuerId) -> ReadTicket {
        ReadTicket::Admitted(ReadPass {
            issuer,
            _not_send: PhantomData,
        })
    }

    #[inline]
    pub fn is_admitted(&self) -> bool {
        matches!(self, ReadTicket::Admitted(_))
    }

    #[inline]
    pub fn pass(&self) -> Option<&ReadPass> {
        match self {
            ReadTicket::Admitted(pass) => Some(pass),
            ReadTicket::Denied(_) => None,
        }
    }

    pub fn issuer(&self) -> IssuerId {
        match self {
            ReadTicket::Admitted(pass) => pass.issuer,
            ReadTicket::Denied(issuer) => *issuer,
        }
    }
}

/// True when `presented` came from another coordinator. Such tickets and
/// passes are dropped without touching any lock state.
pub(crate) fn is_foreign(own: IssuerId, presented: IssuerId, what: &'static str) -> bool {
    if own == presented {
        return false;
    }
    warn!(?own, ?presented, what, "ignoring release from another coordinator");
    true
}

/// The capability set every admission strategy offers.
///
/// None of the `try_*` methods wait for the buffer; a busy buffer is
/// reported straight back to the caller.
pub trait AccessCoordinator: Send + Sync {
    fn strategy(&self) -> Strategy;

    /// Stamp carried by every ticket and pass this instance hands out.
    /// Releases carrying another stamp are ignored.
    fn issuer(&self) -> IssuerId;

    fn try_acquire_read(&self) -> ReadTicket;

    fn release_read(&self, ticket: ReadTicket);

    fn try_acquire_write(&self) -> Option<WritePass>;

    fn release_write(&self, pass: WritePass);

    /// Reads admitted while nobody held writer exclusion for the readers.
    fn unguarded_admissions(&self) -> u64 {
        0
    }
}
