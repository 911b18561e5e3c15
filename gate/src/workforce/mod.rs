//! Spawning, running and joining the reader and writer threads of one run.

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{error, info, info_span};

use crate::buffer::SharedBuffer;
use crate::config::RunConfig;
use crate::core::{AccessCoordinator, Strategy};
use crate::errors::GateError;
use crate::observer::{AccessObserver, SilentObserver};
use crate::random::{Jitter, RandomByteSource};
use crate::reader::ReaderWorker;
use crate::stats::{StatsCounters, Tally};
use crate::writer::WriterWorker;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    Reader,
    Writer,
}

impl Role {
    pub fn name(&self) -> &'static str {
        match self {
            Role::Reader => "reader",
            Role::Writer => "writer",
        }
    }

    pub(crate) fn stream_bit(&self) -> u64 {
        match self {
            Role::Reader => 0,
            Role::Writer => 1,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What every worker of a run shares.
#[derive(Clone)]
pub struct RunContext {
    pub coordinator: Arc<dyn AccessCoordinator>,
    pub buffer: Arc<SharedBuffer>,
    pub stats: Arc<StatsCounters>,
    pub observer: Arc<dyn AccessObserver>,
}

impl RunContext {
    pub fn new(coordinator: Arc<dyn AccessCoordinator>, buffer: SharedBuffer) -> RunContext {
        RunContext {
            coordinator,
            buffer: Arc::new(buffer),
            stats: Arc::new(StatsCounters::new()),
            observer: Arc::new(SilentObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn AccessObserver>) -> RunContext {
        self.observer = observer;
        self
    }
}

/// A worker thread that panicked. Its remaining loops never ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerFault {
    pub role: Role,
    pub index: usize,
    pub message: String,
}

impl fmt::Display for WorkerFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} panicked: {}", self.role, self.index, self.message)
    }
}

/// Final (or partial) numbers of a run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub strategy: Strategy,
    pub config: RunConfig,
    pub tally: Tally,
    pub unguarded_admissions: u64,
    pub elapsed: Duration,
    pub faults: Vec<WorkerFault>,
}

impl RunReport {
    pub fn is_complete(&self) -> bool {
        self.faults.is_empty()
            && self.tally.read_attempts() == self.config.expected_read_attempts()
            && self.tally.write_attempts() == self.config.expected_write_attempts()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = &self.tally;
        writeln!(
            f,
            "Write: Threads count: {}, Loops count: {}, Summary: {}, Successful write: {}, Failed write: {}",
            self.config.writer_threads(),
            self.config.write_loops(),
            t.write_attempts(),
            t.successful_writes,
            t.failed_writes
        )?;
        writeln!(
            f,
            "Read: Threads count: {}, Loops count: {}, Summary: {}, Successful read: {}, Failed read: {}",
            self.config.reader_threads(),
            self.config.read_loops(),
            t.read_attempts(),
            t.successful_reads,
            t.failed_reads
        )?;
        write!(
            f,
            "Strategy: {}, Unguarded reads: {}, Elapsed: {:.3}s",
            self.strategy,
            self.unguarded_admissions,
            self.elapsed.as_secs_f64()
        )
    }
}

/// Owns the threads of one run.
pub struct Workforce {
    config: RunConfig,
    context: RunContext,
    seed: u64,
    jitter: Jitter,
}

impl Workforce {
    pub fn new(config: RunConfig, context: RunContext) -> Workforce {
        Workforce {
            config,
            context,
            seed: 0,
            jitter: Jitter::default(),
        }
    }

    pub fn seed(mut self, seed: u64) -> Workforce {
        self.seed = seed;
        self
    }

    pub fn jitter(mut self, jitter: Jitter) -> Workforce {
        self.jitter = jitter;
        self
    }

    /// Numbers collected so far, usable while workers are still running.
    pub fn report(&self, elapsed: Duration, faults: Vec<WorkerFault>) -> RunReport {
        RunReport {
            strategy: self.context.coordinator.strategy(),
            config: self.config,
            tally: self.context.stats.snapshot(),
            unguarded_admissions: self.context.coordinator.unguarded_admissions(),
            elapsed,
            faults,
        }
    }

    /// Spawns every writer, then every reader, then waits for all of them.
    pub fn run(&self) -> Result<RunReport, GateError> {
        let _span = info_span!("run", strategy = %self.context.coordinator.strategy()).entered();
        let started = Instant::now();
        let mut handles = Vec::with_capacity(handle_capacity(&self.config));
        let spawned = self.spawn_all(&mut handles);
        info!(workers = handles.len(), "workers spawned");

        let faults = join_all(handles);
        spawned?;

        let report = self.report(started.elapsed(), faults);
        info!(
            reads = report.tally.read_attempts(),
            writes = report.tally.write_attempts(),
            "workers joined"
        );
        Ok(report)
    }

    fn spawn_all(&self, handles: &mut Vec<(Role, usize, JoinHandle<()>)>) -> Result<(), GateError> {
        for index in 0..self.config.writer_threads() {
            let worker = WriterWorker::new(
                index,
                self.config.write_loops(),
                self.context.clone(),
                RandomByteSource::for_worker(self.seed, Role::Writer, index, self.jitter),
            );
            let handle = spawn(Role::Writer, index, move || worker.run())?;
            handles.push((Role::Writer, index, handle));
        }
        for index in 0..self.config.reader_threads() {
            let worker = ReaderWorker::new(
                index,
                self.config.read_loops(),
                self.context.clone(),
                RandomByteSource::for_worker(self.seed, Role::Reader, index, self.jitter),
            );
            let handle = spawn(Role::Reader, index, move || worker.run())?;
            handles.push((Role::Reader, index, handle));
        }
        Ok(())
    }
}

/// Up-front room for join handles. Larger runs grow the vector as they spawn.
const MAX_PREALLOCATED_HANDLES: usize = 1024;

fn handle_capacity(config: &RunConfig) -> usize {
    config
        .writer_threads()
        .saturating_add(config.reader_threads())
        .min(MAX_PREALLOCATED_HANDLES)
}

fn spawn<F>(role: Role, index: usize, body: F) -> Result<JoinHandle<()>, GateError>
where
    F: FnOnce() + Send + 'static,
{
    thread::Builder::new()
        .name(format!("{}-{}", role, index))
        .spawn(body)
        .map_err(|source| GateError::Spawn {
            role: role.name(),
            index,
            source,
        })
}

fn join_all(handles: Vec<(Role, usize, JoinHandle<()>)>) -> Vec<WorkerFault> {
    let mut faults = Vec::new();
    for (role, index, handle) in handles {
        if let Err(payload) = handle.join() {
            let fault = WorkerFault {
                role,
                index,
                message: panic_message(payload.as_ref()),
            };
            error!(%fault, "worker died");
            faults.push(fault);
        }
    }
    faults
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
