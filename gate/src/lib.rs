pub mod buffer;
pub mod config;
pub mod core;
mod errors;
pub mod observer;
pub mod random;
pub mod reader;
pub mod stats;
pub mod workforce;
pub mod writer;


pub use crate::buffer::{SharedBuffer, Snapshot, DEFAULT_CAPACITY};
pub use crate::config::{GateSettings, RunConfig};
pub use crate::core::{AccessCoordinator, IssuerId, ReadTicket, Strategy, WritePass};
pub use crate::errors::GateError;
pub use crate::observer::{AccessObserver, ConsoleObserver, SilentObserver};
pub use crate::random::{Jitter, RandomByteSource};
pub use crate::stats::{StatsCounters, Tally};
pub use crate::workforce::{Role, RunContext, RunReport, WorkerFault, Workforce};
