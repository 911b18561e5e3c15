use std::fmt;

use parking_lot::RwLock;

use crate::core::{ReadPass, WritePass};
use crate::errors::GateError;
use crate::random::RandomByteSource;

/// Nine characters plus terminator.
pub const DEFAULT_CAPACITY: usize = 10;

pub const TERMINATOR: u8 = b'\0';

const INITIAL_FILL: &[u8] = b"123456789";

/// The one buffer every worker of a run shares.
///
/// Holds `capacity - 1` printable bytes followed by [`TERMINATOR`]. Access
/// goes through a [`ReadPass`] or [`WritePass`], so only admitted workers
/// touch it. The cell lock underneath is held for the copy only and keeps a
/// half-written buffer from ever being copied out, even when a strategy
/// lets a reader in next to a writer.
pub struct SharedBuffer {
    capacity: usize,
    cells: RwLock<Box<[u8]>>,
}

impl SharedBuffer {
    pub fn new() -> SharedBuffer {
        SharedBuffer::filled(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Result<SharedBuffer, GateError> {
        if capacity < 2 {
            return Err(GateError::InvalidCapacity(capacity));
        }
        Ok(SharedBuffer::filled(capacity))
    }

    fn filled(capacity: usize) -> SharedBuffer {
        let mut cells = vec![TERMINATOR; capacity].into_boxed_slice();
        for (cell, digit) in cells[..capacity - 1].iter_mut().zip(INITIAL_FILL.iter().cycle()) {
            *cell = *digit;
        }
        SharedBuffer {
            capacity,
            cells: RwLock::new(cells),
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn read(&self, _pass: &ReadPass) -> Snapshot {
        Snapshot {
            cells: self.cells.read().clone(),
        }
    }

    /// Overwrites every character slot with a random letter, terminates the
    /// text and returns what was written.
    pub fn write(&self, _pass: &WritePass, source: &mut RandomByteSource) -> Snapshot {
        let mut cells = self.cells.write();
        let last = cells.len() - 1;
        for cell in cells[..last].iter_mut() {
            *cell = source.next_letter();
        }
        cells[last] = TERMINATOR;
        Snapshot {
            cells: cells.clone(),
        }
    }
}

impl Default for SharedBuffer {
    fn default() -> Self {
        SharedBuffer::new()
    }
}

impl fmt::Debug for SharedBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedBuffer")
            .field("capacity", &self.capacity)
            .finish()
    }
}

/// A copy of the buffer taken under admission.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Snapshot {
    cells: Box<[u8]>,
}

impl Snapshot {
    /// Characters before the terminator.
    pub fn text(&self) -> &[u8] {
        let end = self
            .cells
            .iter()
            .position(|&b| b == TERMINATOR)
            .unwrap_or(self.cells.len());
        &self.cells[..end]
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(self.text()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.text().len()
    }

    pub fn is_empty(&self) -> bool {
        self.text().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.cells.len()
    }

    /// Printable text of at most `capacity - 1` bytes, then the terminator.
    pub fn is_well_formed(&self) -> bool {
        let text = self.text();
        text.len() < self.cells.len()
            && text.iter().all(|b| b.is_ascii_graphic())
            && self.cells[text.len()] == TERMINATOR
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Snapshot({:?})", self.as_str())
    }
}
