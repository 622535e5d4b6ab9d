//! Timed execution of one (variant, operation) pair
//!
//! The runner invokes a provider operation `N` times back to back and records
//! one [`Sample`](crate::samples::Sample) per invocation, in run order.
//!
//! # Iteration lifecycle
//!
//! ```text
//! ┌─────────────── iteration i (1-based) ───────────────┐
//! │ acquire inputs   untimed   fresh key / ciphertext   │
//! │ invoke           timed     Clock::measure           │
//! │ check result     untimed   secret match / verify ok │
//! │ release          untimed   everything dropped       │
//! │ append sample                                       │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! Only the invoke step is inside the clock. Sign and verify share one key
//! pair per run, generated before iteration 1.
//!
//! Any provider failure aborts the run immediately with the iteration that
//! failed. There is no retry: a partially valid sequence would bias every
//! statistic computed from it.
//!
//! # Example
//!
//! ```ignore
//! use pqbench_harness::{Clock, OperationKind, OperationRunner, Variant};
//!
//! let runner = OperationRunner::new(&provider, Clock::monotonic(), b"message");
//! let samples = runner.run(&Variant::new("kyber768"), OperationKind::Encapsulate, 50)?;
//! assert_eq!(samples.len(), 50);
//! ```

use tracing::{debug, error, instrument};

use crate::clock::Clock;
use crate::error::{BenchError, ClockError, ConfigError, ProviderError};
use crate::provider::{CryptoProvider, OperationKind, Variant};
use crate::samples::{Sample, SampleSequence};

/// Runs provider operations under a clock.
pub struct OperationRunner<'a, P: CryptoProvider> {
    provider: &'a P,
    clock: Clock,
    message: &'a [u8],
}

impl<'a, P: CryptoProvider> OperationRunner<'a, P> {
    /// `message` is what sign and verify operate on.
    pub fn new(provider: &'a P, clock: Clock, message: &'a [u8]) -> Self {
        Self {
            provider,
            clock,
            message,
        }
    }

    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Time `operation` on `variant` exactly `iterations` times.
    ///
    /// # Errors
    ///
    /// - [`BenchError::Config`] if `iterations` is zero
    /// - [`BenchError::ProviderSetup`] if the run-scoped key pair for sign or
    ///   verify cannot be generated
    /// - [`BenchError::Provider`] for any failure inside an iteration,
    ///   including a rejected signature or mismatched shared secret
    #[instrument(
        skip(self),
        fields(provider = self.provider.name(), variant = %variant, clock = %self.clock.source())
    )]
    pub fn run(
        &self,
        variant: &Variant,
        operation: OperationKind,
        iterations: usize,
    ) -> Result<SampleSequence, BenchError> {
        if iterations == 0 {
            return Err(ConfigError::ZeroIterations.into());
        }

        let result = match operation {
            OperationKind::KeyGen => self.run_keygen(variant, iterations),
            OperationKind::Encapsulate => self.run_encapsulate(variant, iterations),
            OperationKind::Decapsulate => self.run_decapsulate(variant, iterations),
            OperationKind::Sign => self.run_sign(variant, iterations),
            OperationKind::Verify => self.run_verify(variant, iterations),
        };

        match &result {
            Ok(samples) => debug!(samples = samples.len(), "run complete"),
            Err(e) => error!("run aborted: {}", e),
        }
        result
    }

    fn run_keygen(&self, variant: &Variant, n: usize) -> Result<SampleSequence, BenchError> {
        let provider = self.provider;
        let mut samples = SampleSequence::with_capacity(n);

        for i in 1..=n {
            let step = Step::new(variant, OperationKind::KeyGen, i);
            let (key, sample) = self.timed(&step, || provider.generate_key_pair(variant))?;
            drop(key);
            samples.push(sample);
        }

        Ok(samples)
    }

    fn run_encapsulate(&self, variant: &Variant, n: usize) -> Result<SampleSequence, BenchError> {
        let provider = self.provider;
        let mut samples = SampleSequence::with_capacity(n);

        for i in 1..=n {
            let step = Step::new(variant, OperationKind::Encapsulate, i);
            let key = provider
                .generate_key_pair(variant)
                .map_err(|e| step.fail(e))?;

            let (encapsulation, sample) = self.timed(&step, || provider.encapsulate(&key))?;
            drop(encapsulation);
            drop(key);
            samples.push(sample);
        }

        Ok(samples)
    }

    fn run_decapsulate(&self, variant: &Variant, n: usize) -> Result<SampleSequence, BenchError> {
        let provider = self.provider;
        let mut samples = SampleSequence::with_capacity(n);

        for i in 1..=n {
            let step = Step::new(variant, OperationKind::Decapsulate, i);
            let key = provider
                .generate_key_pair(variant)
                .map_err(|e| step.fail(e))?;
            let sent = provider.encapsulate(&key).map_err(|e| step.fail(e))?;
            let ct = &sent.ciphertext;

            let (secret, sample) = self.timed(&step, || provider.decapsulate(&key, ct))?;
            if secret != sent.shared_secret {
                return Err(step.fail(ProviderError::SharedSecretMismatch));
            }
            samples.push(sample);
        }

        Ok(samples)
    }

    fn run_sign(&self, variant: &Variant, n: usize) -> Result<SampleSequence, BenchError> {
        let (provider, message) = (self.provider, self.message);
        let key = self.run_key(variant, OperationKind::Sign)?;
        let mut samples = SampleSequence::with_capacity(n);

        for i in 1..=n {
            let step = Step::new(variant, OperationKind::Sign, i);
            let (signature, sample) = self.timed(&step, || provider.sign(&key, message))?;
            drop(signature);
            samples.push(sample);
        }

        Ok(samples)
    }

    fn run_verify(&self, variant: &Variant, n: usize) -> Result<SampleSequence, BenchError> {
        let (provider, message) = (self.provider, self.message);
        let key = self.run_key(variant, OperationKind::Verify)?;
        let mut samples = SampleSequence::with_capacity(n);

        for i in 1..=n {
            let step = Step::new(variant, OperationKind::Verify, i);
            let sig = provider.sign(&key, message).map_err(|e| step.fail(e))?;

            let (accepted, sample) = self.timed(&step, || provider.verify(&key, message, &sig))?;
            if !accepted {
                return Err(step.fail(ProviderError::SignatureRejected));
            }
            samples.push(sample);
        }

        Ok(samples)
    }

    /// Times one provider call and attributes any failure to `step`.
    fn timed<T>(
        &self,
        step: &Step<'_>,
        work: impl FnOnce() -> Result<T, ProviderError>,
    ) -> Result<(T, Sample), BenchError> {
        let (out, sample) = self.clock.measure(work).map_err(|e| step.clock(e))?;
        let out = out.map_err(|e| step.fail(e))?;

        let elapsed_ns = sample.duration().as_nanos() as u64;
        debug!(iteration = step.iteration, elapsed_ns);
        Ok((out, sample))
    }

    /// Key pair shared by every iteration of a sign or verify run.
    fn run_key(
        &self,
        variant: &Variant,
        operation: OperationKind,
    ) -> Result<P::KeyPair, BenchError> {
        self.provider
            .generate_key_pair(variant)
            .map_err(|source| BenchError::ProviderSetup {
                variant: variant.label(),
                operation,
                source,
            })
    }
}

/// One iteration of a run, for error attribution.
struct Step<'v> {
    variant: &'v Variant,
    operation: OperationKind,
    /// 1-based.
    iteration: usize,
}

impl<'v> Step<'v> {
    fn new(variant: &'v Variant, operation: OperationKind, iteration: usize) -> Self {
        Self {
            variant,
            operation,
            iteration,
        }
    }

    fn fail(&self, source: ProviderError) -> BenchError {
        BenchError::Provider {
            variant: self.variant.label(),
            operation: self.operation,
            iteration: self.iteration,
            source,
        }
    }

    fn clock(&self, source: ClockError) -> BenchError {
        BenchError::Clock {
            variant: self.variant.label(),
            operation: self.operation,
            iteration: self.iteration,
            source,
        }
    }
}
