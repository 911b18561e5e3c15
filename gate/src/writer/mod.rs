use std::thread;

use tracing::trace;

use crate::random::RandomByteSource;
use crate::workforce::RunContext;

/// One writer thread's loop.
pub struct WriterWorker {
    index: usize,
    loops: usize,
    context: RunContext,
    source: RandomByteSource,
}

impl WriterWorker {
    pub fn new(index: usize, loops: usize, context: RunContext, source: RandomByteSource) -> WriterWorker {
        WriterWorker {
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

    /// One try at the buffer. Returns whether the writer got in.
    pub fn attempt(&mut self) -> bool {
        let ctx = &self.context;
        match ctx.coordinator.try_acquire_write() {
            Some(pass) => {
                ctx.stats.record_write(true);
                let contents = ctx.buffer.write(&pass, &mut self.source);
                ctx.observer.after_write(self.index, &contents);
                ctx.coordinator.release_write(pass);
                true
            }
            None => {
                ctx.stats.record_write(false);
                trace!(writer = self.index, "write denied");
                false
            }
        }
    }
}
