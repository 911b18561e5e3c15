use std::io::{self, Write};

use crate::buffer::Snapshot;

/// Hook run by a worker right after it touched the buffer, while it still
/// holds admission.
pub trait AccessObserver: Send + Sync {
    fn after_read(&self, worker: usize, contents: &Snapshot);

    fn after_write(&self, worker: usize, contents: &Snapshot);
}

/// Prints every successful read and write to stdout.
#[derive(Debug, Default, Copy, Clone)]
pub struct ConsoleObserver;

impl AccessObserver for ConsoleObserver {
    fn after_read(&self, _worker: usize, contents: &Snapshot) {
        // a closed stdout must not take the worker down
        let _ = writeln!(io::stdout().lock(), "read: {}", contents);
    }

    fn after_write(&self, _worker: usize, contents: &Snapshot) {
        let _ = writeln!(io::stdout().lock(), "Write: {}", contents);
    }
}

#[derive(Debug, Default, Copy, Clone)]
pub struct SilentObserver;

impl AccessObserver for SilentObserver {
    fn after_read(&self, _worker: usize, _contents: &Snapshot) {}

    fn after_write(&self, _worker: usize, _contents: &Snapshot) {}
}
