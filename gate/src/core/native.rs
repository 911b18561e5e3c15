use parking_lot::lock_api::RawRwLock as _;
use parking_lot::RawRwLock;
use tracing::trace;

use super::{is_foreign, AccessCoordinator, IssuerId, ReadTicket, Strategy, WritePass};

/// Admission straight through one reader-writer lock.
///
/// Free, shared by any number of readers, or held by a single writer. The
/// lock itself is the only state; there is no counter to get out of step.
pub struct NativeRw {
    lock: RawRwLock,
    issuer: IssuerId,
}

impl NativeRw {
    pub fn new() -> NativeRw {
        NativeRw {
            lock: RawRwLock::INIT,
            issuer: IssuerId::next(),
        }
    }

    pub fn is_locked(&self) -> bool {
        self.lock.is_locked()
    }
}

impl Default for NativeRw {
    fn default() -> Self {
        NativeRw::new()
    }
}

impl AccessCoordinator for NativeRw {
    fn strategy(&self) -> Strategy {
        Strategy::NativeRw
    }

    fn issuer(&self) -> IssuerId {
        self.issuer
    }

    fn try_acquire_read(&self) -> ReadTicket {
        if self.lock.try_lock_shared() {
            ReadTicket::admitted(self.issuer)
        } else {
            trace!("shared lock unavailable");
            ReadTicket::Denied(self.issuer)
        }
    }

    fn release_read(&self, ticket: ReadTicket) {
        if is_foreign(self.issuer, ticket.issuer(), "read ticket") {
            return;
        }
        if let ReadTicket::Admitted(_) = ticket {
            // SAFETY: the ticket carries this lock's issuer, and such admitted
            // tickets are only minted by a successful try_lock_shared above.
            // It is not Send and is consumed here, so it unlocks exactly once
            // on the thread that locked.
            unsafe { self.lock.unlock_shared() }
        }
    }

    fn try_acquire_write(&self) -> Option<WritePass> {
        if self.lock.try_lock_exclusive() {
            Some(WritePass::new(self.issuer))
        } else {
            trace!("exclusive lock unavailable");
            None
        }
    }

    fn release_write(&self, pass: WritePass) {
        if is_foreign(self.issuer, pass.issuer(), "write pass") {
            return;
        }
        // SAFETY: the pass carries this lock's issuer, so it was minted by a
        // successful try_lock_exclusive on this thread, and taking it by
        // value ends it.
        unsafe { self.lock.unlock_exclusive() }
    }
}
