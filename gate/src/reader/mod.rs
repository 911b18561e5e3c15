use std::thread;

use tracing::trace;

use crate::random::RandomByteSource;
use crate::workforce::RunContext;

/// One reader thread's loop.
pub struct ReaderWorker {
    index: usize,
    loops: usize,
    context: RunContext,
    source: RandomByteSource,
}

impl ReaderWorker {
    pub fn new(index: usize, loops: usize, context: RunContext, source: RandomByteSource) -> ReaderWorker {
        ReaderWorker {
            index,
            loops,
            context,
            source,
        }
    }

    pub fn run(mut self) {
        for _ in 0..self.loops {
            self.attempt();
            let pause = self.source.next_delay();
            if !pause.is_zero() {
                thread::sleep(pause);
            }
        }
    }

    /// One try at the buffer. Returns whether the reader got in.
    pub fn attempt(&mut self) -> bool {
        let ctx = &self.context;
        let ticket = ctx.coordinator.try_acquire_read();
        let admitted = match ticket.pass() {
            Some(pass) => {
                ctx.stats.record_read(true);
                let contents = ctx.buffer.read(pass);
                ctx.observer.after_read(self.index, &contents);
                true
            }
            None => {
                ctx.stats.record_read(false);
                trace!(reader = self.index, "read denied");
                false
            }
        };
        ctx.coordinator.release_read(ticket);
        admitted
    }
}
