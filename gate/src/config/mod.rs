use serde_derive::{Deserialize, Serialize};

use crate::buffer::DEFAULT_CAPACITY;
use crate::core::Strategy;
use crate::errors::GateError;
use crate::random::Jitter;

/// Thread and loop counts of one run. Only constructed through [`RunConfig::new`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RunConfig {
    writer_threads: usize,
    reader_threads: usize,
    write_loops: usize,
    read_loops: usize,
}

fn positive(name: &'static str, value: i64) -> Result<usize, GateError> {
    match usize::try_from(value) {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(GateError::InvalidRunConfig { name, value }),
    }
}

impl RunConfig {
    pub fn new(
        writer_threads: i64,
        reader_threads: i64,
        write_loops: i64,
        read_loops: i64,
    ) -> Result<RunConfig, GateError> {
        Ok(RunConfig {
            writer_threads: positive("writer thread count", writer_threads)?,
            reader_threads: positive("reader thread count", reader_threads)?,
            write_loops: positive("write loop count", write_loops)?,
            read_loops: positive("read loop count", read_loops)?,
        })
    }

    pub fn writer_threads(&self) -> usize {
        self.writer_threads
    }

    pub fn reader_threads(&self) -> usize {
        self.reader_threads
    }

    pub fn write_loops(&self) -> usize {
        self.write_loops
    }

    pub fn read_loops(&self) -> usize {
        self.read_loops
    }

    pub fn expected_write_attempts(&self) -> u64 {
        (self.writer_threads as u64).saturating_mul(self.write_loops as u64)
    }

    pub fn expected_read_attempts(&self) -> u64 {
        (self.reader_threads as u64).saturating_mul(self.read_loops as u64)
    }
}

/// Settings file contents. Everything has a default, so an empty file works.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateSettings {
    pub strategy: Strategy,
    pub seed: Option<u64>,
    pub buffer_capacity: usize,
    pub jitter: Jitter,
}

impl Default for GateSettings {
    fn default() -> Self {
        GateSettings {
            strategy: Strategy::default(),
            seed: None,
            buffer_capacity: DEFAULT_CAPACITY,
            jitter: Jitter::default(),
        }
    }
}

impl GateSettings {
    pub fn validate(&self) -> Result<(), GateError> {
        if self.buffer_capacity < 2 {
            return Err(GateError::InvalidCapacity(self.buffer_capacity));
        }
        self.jitter.validate()
    }

    /// The configured seed, or a fresh one.
    pub fn resolve_seed(&self) -> u64 {
        self.seed.unwrap_or_else(rand::random::<u64>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_config_accepts_positive_counts() {
        let cfg = RunConfig::new(2, 3, 5, 5).unwrap();
        assert_eq!(cfg.writer_threads(), 2);
        assert_eq!(cfg.reader_threads(), 3);
        assert_eq!(cfg.expected_write_attempts(), 10);
        assert_eq!(cfg.expected_read_attempts(), 15);
    }

    #[test]
    fn expected_attempts_saturate_for_huge_counts() {
        let cfg = RunConfig::new(i64::MAX, i64::MAX, i64::MAX, i64::MAX).unwrap();
        assert_eq!(cfg.expected_write_attempts(), u64::MAX);
        assert_eq!(cfg.expected_read_attempts(), u64::MAX);
    }

    #[test]
    fn run_config_rejects_zero_and_negative() {
        match RunConfig::new(1, 1, 1, 0) {
            Err(GateError::InvalidRunConfig { name, value }) => {
                assert_eq!(name, "read loop count");
                assert_eq!(value, 0);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            RunConfig::new(-4, 1, 1, 1),
            Err(GateError::InvalidRunConfig { value: -4, .. })
        ));
        assert!(RunConfig::new(1, 0, 1, 1).unwrap_err().is_config());
    }

    #[test]
    fn settings_defaults() {
        let settings = GateSettings::default();
        assert_eq!(settings.strategy, Strategy::Turnstile);
        assert_eq!(settings.buffer_capacity, 10);
        assert_eq!(settings.jitter, Jitter { step_ms: 1000, steps: 3 });
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn settings_validation() {
        let mut settings = GateSettings {
            buffer_capacity: 1,
            ..Default::default()
        };
        assert!(matches!(settings.validate(), Err(GateError::InvalidCapacity(1))));
        settings.buffer_capacity = 4;
        settings.jitter.steps = 0;
        assert!(matches!(settings.validate(), Err(GateError::InvalidJitter(0))));
    }

    #[test]
    fn fixed_seed_is_kept() {
        let settings = GateSettings {
            seed: Some(99),
            ..Default::default()
        };
        assert_eq!(settings.resolve_seed(), 99);
    }
}
