use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::{debug, trace};

use super::{is_foreign, AccessCoordinator, IssuerId, ReadTicket, Strategy, WritePass};

/// Binary exclusion that may be released by a different thread than the one
/// that took it. The last reader out frees what the first reader in took.
#[derive(Debug, Default)]
struct Exclusion {
    held: AtomicBool,
}

impl Exclusion {
    #[inline]
    fn try_acquire(&self) -> bool {
        self.held
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    #[inline]
    fn release(&self) {
        self.held.store(false, Ordering::Release);
    }
}

#[derive(Debug, Default)]
struct ReaderGroup {
    live: usize,
    // Set while writer exclusion is held on the group's behalf.
    holds_exclusion: bool,
}

/// Counting turnstile with the first-reader race left in.
///
/// A first reader that fails to take writer exclusion still occupies a slot
/// in the counter until it releases. Readers arriving meanwhile see a
/// non-zero count and walk in, although nobody excludes writers for them;
/// the last of those readers then frees the exclusion a writer is holding.
/// [`AccessCoordinator::unguarded_admissions`] counts how often that happens.
#[derive(Debug, Default)]
pub struct Turnstile {
    count_guard: Mutex<ReaderGroup>,
    writer_exclusion: Exclusion,
    unguarded: AtomicU64,
    issuer: IssuerId,
}

impl Turnstile {
    pub fn new() -> Turnstile {
        Default::default()
    }

    /// Number of readers between their attempt and their release.
    pub fn live_readers(&self) -> usize {
        self.count_guard.lock().live
    }
}

impl AccessCoordinator for Turnstile {
    fn strategy(&self) -> Strategy {
        Strategy::Turnstile
    }

    fn issuer(&self) -> IssuerId {
        self.issuer
    }

    fn try_acquire_read(&self) -> ReadTicket {
        let mut group = self.count_guard.lock();
        group.live += 1;
        if group.live == 1 {
            if self.writer_exclusion.try_acquire() {
                group.holds_exclusion = true;
                ReadTicket::admitted(self.issuer)
            } else {
                trace!("first reader found writer exclusion taken");
                ReadTicket::Denied(self.issuer)
            }
        } else {
            if !group.holds_exclusion {
                self.unguarded.fetch_add(1, Ordering::Relaxed);
                debug!(live = group.live, "reader admitted without writer exclusion");
            }
            ReadTicket::admitted(self.issuer)
        }
    }

    fn release_read(&self, ticket: ReadTicket) {
        if is_foreign(self.issuer, ticket.issuer(), "read ticket") {
            return;
        }
        let mut group = self.count_guard.lock();
        debug_assert!(group.live > 0, "release_read without a matching attempt");
        group.live = group.live.saturating_sub(1);
        if group.live == 0 && ticket.is_admitted() {
            group.holds_exclusion = false;
            self.writer_exclusion.release();
        }
    }

    fn try_acquire_write(&self) -> Option<WritePass> {
        if self.writer_exclusion.try_acquire() {
            Some(WritePass::new(self.issuer))
        } else {
            None
        }
    }

    fn release_write(&self, pass: WritePass) {
        if is_foreign(self.issuer, pass.issuer(), "write pass") {
            return;
        }
        self.writer_exclusion.release();
    }

    fn unguarded_admissions(&self) -> u64 {
        self.unguarded.load(Ordering::Relaxed)
    }
}

/// Counting turnstile without the first-reader anomaly.
///
/// Only a reader that actually got in is counted, so a non-zero count always
/// means writer exclusion is held for the group.
#[derive(Debug, Default)]
pub struct StrictTurnstile {
    count_guard: Mutex<usize>,
    writer_exclusion: Exclusion,
    issuer: IssuerId,
}

impl StrictTurnstile {
    pub fn new() -> StrictTurnstile {
        Default::default()
    }

    pub fn live_readers(&self) -> usize {
        *self.count_guard.lock()
    }
}

impl AccessCoordinator for StrictTurnstile {
    fn strategy(&self) -> Strategy {
        Strategy::TurnstileStrict
    }

    fn issuer(&self) -> IssuerId {
        self.issuer
    }

    fn try_acquire_read(&self) -> ReadTicket {
        let mut live = self.count_guard.lock();
        if *live == 0 && !self.writer_exclusion.try_acquire() {
            trace!("first reader found writer exclusion taken");
            return ReadTicket::Denied(self.issuer);
        }
        *live += 1;
        ReadTicket::admitted(self.issuer)
    }

    fn release_read(&self, ticket: ReadTicket) {
        if is_foreign(self.issuer, ticket.issuer(), "read ticket") || !ticket.is_admitted() {
            return;
        }
        let mut live = self.count_guard.lock();
        debug_assert!(*live > 0, "release_read without a matching admission");
        *live = live.saturating_sub(1);
        if *live == 0 {
            self.writer_exclusion.release();
        }
    }

    fn try_acquire_write(&self) -> Option<WritePass> {
        if self.writer_exclusion.try_acquire() {
            Some(WritePass::new(self.issuer))
        } else {
            None
        }
    }

    fn release_write(&self, pass: WritePass) {
        if is_foreign(self.issuer, pass.issuer(), "write pass") {
            return;
        }
        self.writer_exclusion.release();
    }
}
