//! Elapsed-time measurement around one unit of work.
//!
//! Two sources are offered and they are not interchangeable within a sweep:
//!
//! - [`ClockSource::Monotonic`]: `std::time::Instant`, nanosecond-resolution
//!   monotonic ticks. Immune to wall-clock adjustment. Preferred.
//! - [`ClockSource::ProcessCpu`]: CPU time consumed by this process
//!   (`CLOCK_PROCESS_CPUTIME_ID`). Excludes time spent descheduled, which
//!   makes it lower noise for very fast operations but blind to blocking.
//!   Unix only.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use crate::error::{ClockError, ConfigError};
use crate::samples::Sample;

/// Which time source a [`Clock`] reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockSource {
    #[default]
    Monotonic,
    ProcessCpu,
}

impl ClockSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClockSource::Monotonic => "monotonic",
            ClockSource::ProcessCpu => "process_cpu",
        }
    }
}

impl fmt::Display for ClockSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClockSource {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monotonic" => Ok(ClockSource::Monotonic),
            "process_cpu" | "process-cpu" => Ok(ClockSource::ProcessCpu),
            other => Err(ConfigError::UnknownClock(other.to_string())),
        }
    }
}

/// A checked, ready-to-use time source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clock {
    source: ClockSource,
}

impl Clock {
    /// Open `source`, failing if the platform cannot provide it.
    pub fn new(source: ClockSource) -> Result<Self, ConfigError> {
        if source == ClockSource::ProcessCpu && process_cpu_time().is_none() {
            return Err(ConfigError::ClockUnavailable(source.as_str()));
        }
        Ok(Self { source })
    }

    pub fn monotonic() -> Self {
        Self {
            source: ClockSource::Monotonic,
        }
    }

    pub fn source(&self) -> ClockSource {
        self.source
    }

    /// Run `work` exactly once and return its result with the elapsed time.
    ///
    /// A process CPU clock that fails to read after `Clock::new` checked it
    /// returns [`ClockError::ReadFailed`] instead of a sample.
    #[inline]
    pub fn measure<T>(&self, work: impl FnOnce() -> T) -> Result<(T, Sample), ClockError> {
        match self.source {
            ClockSource::Monotonic => {
                let start = Instant::now();
                let out = work();
                let elapsed = start.elapsed();
                Ok((out, Sample::from_duration(elapsed)))
            }
            ClockSource::ProcessCpu => match measure_with(process_cpu_time, work) {
                Some(measured) => Ok(measured),
                None => Err(ClockError::ReadFailed(self.source.as_str())),
            },
        }
    }
}

/// Brackets `work` with two reads of `read`. `work` is skipped if the first
/// read fails.
#[inline]
fn measure_with<T>(
    read: impl Fn() -> Option<Duration>,
    work: impl FnOnce() -> T,
) -> Option<(T, Sample)> {
    let start = read()?;
    let out = work();
    let end = read()?;
    Some((out, Sample::from_duration(end.saturating_sub(start))))
}

impl Default for Clock {
    fn default() -> Self {
        Self::monotonic()
    }
}

#[cfg(unix)]
fn process_cpu_time() -> Option<Duration> {
    // SAFETY: an all-zero timespec is a valid value, and `ts` stays writable
    // for the duration of the call.
    let mut ts: libc::timespec = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::clock_gettime(libc::CLOCK_PROCESS_CPUTIME_ID, &mut ts) };
    if rc != 0 {
        return None;
    }
    Some(Duration::new(ts.tv_sec as u64, ts.tv_nsec as u32))
}

#[cfg(not(unix))]
fn process_cpu_time() -> Option<Duration> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_runs_work_once() {
        let clock = Clock::monotonic();
        let mut calls = 0;
        let (value, _sample) = clock
            .measure(|| {
                calls += 1;
                42
            })
            .unwrap();

        assert_eq!(value, 42);
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_monotonic_measures_sleep() {
        let clock = Clock::monotonic();
        let ((), sample) = clock
            .measure(|| std::thread::sleep(Duration::from_millis(2)))
            .unwrap();

        assert!(sample.duration() >= Duration::from_millis(2));
    }

    #[cfg(unix)]
    #[test]
    fn test_process_cpu_clock_available_on_unix() {
        let clock = Clock::new(ClockSource::ProcessCpu).unwrap();
        let (sum, sample) = clock
            .measure(|| (0..200_000u64).fold(0u64, |a, b| a.wrapping_add(b)))
            .unwrap();

        assert!(sum > 0);
        // A CPU-bound loop cannot consume more CPU time than a generous bound
        assert!(sample.duration() < Duration::from_secs(5));
    }

    #[test]
    fn test_failed_first_read_skips_work() {
        let mut calls = 0;
        let result = measure_with(|| None, || calls += 1);

        assert!(result.is_none());
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_failed_second_read_yields_no_sample() {
        let reads = std::cell::Cell::new(0u64);
        let read = || {
            reads.set(reads.get() + 1);
            (reads.get() == 1).then_some(Duration::from_micros(10))
        };

        assert!(measure_with(read, || ()).is_none());
        assert_eq!(reads.get(), 2);
    }

    #[test]
    fn test_successful_reads_give_difference() {
        let reads = std::cell::Cell::new(0u64);
        let read = || {
            reads.set(reads.get() + 1);
            Some(Duration::from_micros(10 * reads.get()))
        };

        let ((), sample) = measure_with(read, || ()).unwrap();
        assert_eq!(sample.duration(), Duration::from_micros(10));
    }

    #[test]
    fn test_clock_source_parsing() {
        assert_eq!(
            "monotonic".parse::<ClockSource>().unwrap(),
            ClockSource::Monotonic
        );
        assert_eq!(
            "process_cpu".parse::<ClockSource>().unwrap(),
            ClockSource::ProcessCpu
        );
        assert!("wall".parse::<ClockSource>().is_err());
    }
}
