use std::ops::RangeInclusive;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_derive::{Deserialize, Serialize};

use crate::errors::GateError;
use crate::Role;

/// Letters a writer fills the buffer with.
pub const ALPHABET: RangeInclusive<u8> = b'A'..=b'Z';

const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

/// Pause between two attempts of one worker: a uniformly chosen whole number
/// of steps in `0..steps`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Jitter {
    pub step_ms: u64,
    pub steps: u32,
}

impl Default for Jitter {
    /// Zero, one or two seconds.
    fn default() -> Self {
        Jitter {
            step_ms: 1000,
            steps: 3,
        }
    }
}

impl Jitter {
    /// No pause at all.
    pub const fn none() -> Jitter {
        Jitter {
            step_ms: 0,
            steps: 1,
        }
    }

    pub fn validate(&self) -> Result<(), GateError> {
        if self.steps == 0 {
            return Err(GateError::InvalidJitter(self.steps));
        }
        Ok(())
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.step_ms.saturating_mul(u64::from(self.steps.saturating_sub(1))))
    }
}

/// Seeded source of buffer letters and pauses.
#[derive(Debug, Clone)]
pub struct RandomByteSource {
    rng: StdRng,
    jitter: Jitter,
}

impl RandomByteSource {
    pub fn new(seed: u64, jitter: Jitter) -> RandomByteSource {
        RandomByteSource {
            rng: StdRng::seed_from_u64(seed),
            jitter,
        }
    }

    /// Independent stream for one worker, reproducible from the run seed.
    pub fn for_worker(seed: u64, role: Role, index: usize, jitter: Jitter) -> RandomByteSource {
        let stream = ((index as u64) << 1) | role.stream_bit();
        RandomByteSource::new(seed ^ stream.wrapping_add(1).wrapping_mul(GOLDEN_GAMMA), jitter)
    }

    #[inline]
    pub fn next_letter(&mut self) -> u8 {
        self.rng.gen_range(ALPHABET)
    }

    pub fn next_delay(&mut self) -> Duration {
        if self.jitter.step_ms == 0 || self.jitter.steps <= 1 {
            return Duration::ZERO;
        }
        let step = self.rng.gen_range(0..self.jitter.steps);
        Duration::from_millis(self.jitter.step_ms.saturating_mul(u64::from(step)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_stay_in_alphabet_and_cover_it() {
        let mut source = RandomByteSource::new(7, Jitter::none());
        let mut seen = [false; 26];
        for _ in 0..10_000 {
            let letter = source.next_letter();
            assert!(ALPHABET.contains(&letter), "{}", letter);
            seen[(letter - b'A') as usize] = true;
        }
        assert!(seen.iter().all(|&s| s), "Z must be reachable too");
    }

    #[test]
    fn delays_are_whole_steps_within_bounds() {
        let jitter = Jitter {
            step_ms: 5,
            steps: 3,
        };
        let mut source = RandomByteSource::new(11, jitter);
        for _ in 0..1_000 {
            let delay = source.next_delay();
            assert!(delay <= jitter.max_delay());
            assert_eq!(delay.as_millis() % 5, 0);
        }
        assert_eq!(jitter.max_delay(), Duration::from_millis(10));
    }

    #[test]
    fn no_jitter_never_sleeps() {
        let mut source = RandomByteSource::new(3, Jitter::none());
        assert_eq!(source.next_delay(), Duration::ZERO);
        assert_eq!(Jitter::none().max_delay(), Duration::ZERO);
    }

    #[test]
    fn same_seed_same_stream() {
        let mut a = RandomByteSource::for_worker(42, Role::Writer, 1, Jitter::default());
        let mut b = RandomByteSource::for_worker(42, Role::Writer, 1, Jitter::default());
        let mut other = RandomByteSource::for_worker(42, Role::Reader, 1, Jitter::default());
        let left: Vec<u8> = (0..32).map(|_| a.next_letter()).collect();
        let right: Vec<u8> = (0..32).map(|_| b.next_letter()).collect();
        let third: Vec<u8> = (0..32).map(|_| other.next_letter()).collect();
        assert_eq!(left, right);
        assert_ne!(left, third);
    }

    #[test]
    fn zero_steps_rejected() {
        let jitter = Jitter {
            step_ms: 10,
            steps: 0,
        };
        assert!(matches!(jitter.validate(), Err(GateError::InvalidJitter(0))));
        assert!(Jitter::default().validate().is_ok());
    }
}
