//! Integration tests for the sweep controller
//!
//! A scripted in-memory provider stands in for real cryptography so that
//! failures can be injected at exact iterations.

use std::cell::{Cell, RefCell};

use pretty_assertions::assert_eq;

use pqbench_harness::reporter::SvgChartSink;
use pqbench_harness::{
    BenchError, BenchmarkConfig, ChartSeries, Clock, ConfigError, CryptoProvider, Encapsulation,
    KeySizes, OperationKind, OperationReport, ProviderError, ReportError, ReportSink,
    SweepController, Unit, Variant,
};

/// `kem-*` variants are KEMs, `sig-*` variants are signature schemes.
#[derive(Default)]
struct ScriptedProvider {
    keygens: Cell<usize>,
    verifies: Cell<usize>,
    decapsulations: Cell<usize>,
    /// Verify call (1-based) that returns `false`.
    reject_verify_at: Option<usize>,
    /// Decapsulation call (1-based) that returns a wrong secret.
    corrupt_decapsulation_at: Option<usize>,
    /// Encapsulation always fails for this variant.
    failing_encapsulation: Option<&'static str>,
    log: RefCell<Vec<String>>,
}

struct ScriptedKey {
    variant: String,
    id: usize,
}

impl CryptoProvider for ScriptedProvider {
    type KeyPair = ScriptedKey;

    fn name(&self) -> &str {
        "scripted"
    }

    fn supported_operations(&self, variant: &Variant) -> Result<Vec<OperationKind>, ProviderError> {
        if variant.name.starts_with("kem-") {
            Ok(OperationKind::KEM.to_vec())
        } else if variant.name.starts_with("sig-") {
            Ok(OperationKind::SIGNATURE.to_vec())
        } else {
            Err(ProviderError::UnsupportedVariant(variant.label()))
        }
    }

    fn generate_key_pair(&self, variant: &Variant) -> Result<ScriptedKey, ProviderError> {
        let id = self.keygens.get() + 1;
        self.keygens.set(id);
        Ok(ScriptedKey {
            variant: variant.label(),
            id,
        })
    }

    fn encapsulate(&self, key: &ScriptedKey) -> Result<Encapsulation, ProviderError> {
        if self.failing_encapsulation == Some(key.variant.as_str()) {
            return Err(ProviderError::Encapsulation("public key rejected".into()));
        }
        Ok(Encapsulation {
            ciphertext: key.id.to_le_bytes().to_vec(),
            shared_secret: vec![key.id as u8; 32],
        })
    }

    fn decapsulate(&self, key: &ScriptedKey, _ciphertext: &[u8]) -> Result<Vec<u8>, ProviderError> {
        let n = self.decapsulations.get() + 1;
        self.decapsulations.set(n);
        if self.corrupt_decapsulation_at == Some(n) {
            return Ok(vec![0xFF; 32]);
        }
        Ok(vec![key.id as u8; 32])
    }

    fn sign(&self, key: &ScriptedKey, message: &[u8]) -> Result<Vec<u8>, ProviderError> {
        let mut sig = key.id.to_le_bytes().to_vec();
        sig.extend_from_slice(message);
        Ok(sig)
    }

    fn verify(
        &self,
        _key: &ScriptedKey,
        _message: &[u8],
        _sig: &[u8],
    ) -> Result<bool, ProviderError> {
        let n = self.verifies.get() + 1;
        self.verifies.set(n);
        self.log.borrow_mut().push(format!("verify {n}"));
        Ok(self.reject_verify_at != Some(n))
    }

    fn key_sizes(&self, _key: &ScriptedKey) -> Result<KeySizes, ProviderError> {
        Ok(KeySizes {
            public_key_bytes: 8,
            secret_key_bytes: 8,
        })
    }
}

#[derive(Default)]
struct RecordingSink {
    events: Vec<String>,
    series: Vec<ChartSeries>,
}

impl ReportSink for RecordingSink {
    fn chart(&mut self, series: &ChartSeries) -> Result<(), ReportError> {
        self.events.push(format!("chart {}", series.label()));
        self.series.push(series.clone());
        Ok(())
    }

    fn summary(&mut self, report: &OperationReport) -> Result<(), ReportError> {
        self.events
            .push(format!("summary {}_{}", report.variant, report.operation));
        Ok(())
    }
}

fn controller(
    provider: &ScriptedProvider,
    iterations: usize,
) -> SweepController<'_, ScriptedProvider> {
    let config = BenchmarkConfig::new(iterations, 0.2, 1.5).unwrap();
    SweepController::new(
        provider,
        config,
        Unit::Microseconds,
        Clock::monotonic(),
        b"doc",
    )
    .unwrap()
    .with_suite_name("scripted")
}

#[test]
fn test_sink_sees_chart_then_summary_in_sweep_order() {
    let provider = ScriptedProvider::default();
    let mut sink = RecordingSink::default();

    let report = controller(&provider, 10)
        .run_sweep(
            &[Variant::new("kem-a"), Variant::new("sig-b")],
            &OperationKind::ALL,
            &mut sink,
        )
        .unwrap();

    assert_eq!(
        sink.events,
        vec![
            "chart kem-a_keygen",
            "summary kem-a_keygen",
            "chart kem-a_encapsulate",
            "summary kem-a_encapsulate",
            "chart kem-a_decapsulate",
            "summary kem-a_decapsulate",
            "chart sig-b_keygen",
            "summary sig-b_keygen",
            "chart sig-b_sign",
            "summary sig-b_sign",
            "chart sig-b_verify",
            "summary sig-b_verify",
        ]
    );
    assert_eq!(report.summaries().count(), 6);
    assert_eq!(report.provider, "scripted");
}

#[test]
fn test_chart_window_is_head_tail_trimmed_only() {
    let provider = ScriptedProvider::default();
    let mut sink = RecordingSink::default();

    controller(&provider, 10)
        .run_sweep(
            &[Variant::new("kem-a")],
            &[OperationKind::KeyGen],
            &mut sink,
        )
        .unwrap();

    // N = 10, f = 0.2: runs 3..=8
    let series = &sink.series[0];
    assert_eq!(series.first_run, 3);
    assert_eq!(series.samples.len(), 6);
    assert_eq!(series.runs(), 3..9);
}

#[test]
fn test_rejected_signature_aborts_without_summary() {
    let provider = ScriptedProvider {
        reject_verify_at: Some(3),
        ..Default::default()
    };
    let mut sink = RecordingSink::default();

    let err = controller(&provider, 10)
        .run_sweep(
            &[Variant::new("sig-b"), Variant::new("kem-a")],
            &OperationKind::ALL,
            &mut sink,
        )
        .unwrap_err();

    match err {
        BenchError::Provider {
            variant,
            operation,
            iteration,
            source,
        } => {
            assert_eq!(variant, "sig-b");
            assert_eq!(operation, OperationKind::Verify);
            assert_eq!(iteration, 3);
            assert_eq!(source, ProviderError::SignatureRejected);
        }
        other => panic!("unexpected error: {other}"),
    }

    // Nothing emitted for the in-flight pair, nothing run afterwards
    assert!(!sink.events.iter().any(|e| e.contains("verify")));
    assert!(!sink.events.iter().any(|e| e.contains("kem-a")));
    assert_eq!(provider.log.borrow().len(), 3);
}

#[test]
fn test_shared_secret_mismatch_is_fatal() {
    let provider = ScriptedProvider {
        corrupt_decapsulation_at: Some(5),
        ..Default::default()
    };
    let mut sink = RecordingSink::default();

    let err = controller(&provider, 10)
        .run_sweep(&[Variant::new("kem-a")], &OperationKind::KEM, &mut sink)
        .unwrap_err();

    assert!(matches!(
        err,
        BenchError::Provider {
            operation: OperationKind::Decapsulate,
            iteration: 5,
            source: ProviderError::SharedSecretMismatch,
            ..
        }
    ));
    assert_eq!(sink.events.len(), 4);
}

#[test]
fn test_provider_error_names_variant_and_iteration() {
    let provider = ScriptedProvider {
        failing_encapsulation: Some("kem-b"),
        ..Default::default()
    };

    let err = controller(&provider, 10)
        .run_sweep(
            &[Variant::new("kem-a"), Variant::new("kem-b")],
            &[OperationKind::Encapsulate],
            &mut (),
        )
        .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("kem-b"));
    assert!(message.contains("encapsulate"));
    assert!(message.contains("iteration 1"));
}

#[test]
fn test_unsupported_pair_rejected_before_any_timing() {
    let provider = ScriptedProvider::default();
    let plan = vec![
        (Variant::new("kem-a"), None),
        (
            Variant::new("kem-b"),
            Some(vec![OperationKind::KeyGen, OperationKind::Sign]),
        ),
    ];

    let err = controller(&provider, 10)
        .run_plan(&plan, &mut ())
        .unwrap_err();

    assert!(matches!(
        err,
        BenchError::Config(ConfigError::UnsupportedOperation {
            operation: OperationKind::Sign,
            ..
        })
    ));
    assert_eq!(provider.keygens.get(), 0);
}

#[test]
fn test_plan_without_operations_runs_all_supported() {
    let provider = ScriptedProvider::default();
    let plan = vec![(Variant::new("sig-a"), None)];

    let report = controller(&provider, 5).run_plan(&plan, &mut ()).unwrap();
    let ops: Vec<_> = report.results.iter().map(|r| r.operation).collect();

    assert_eq!(ops, OperationKind::SIGNATURE.to_vec());
}

#[test]
fn test_charts_written_per_pair() {
    let dir = tempfile::tempdir().unwrap();
    let provider = ScriptedProvider::default();
    let mut charts = SvgChartSink::new(dir.path()).unwrap();

    controller(&provider, 10)
        .run_sweep(&[Variant::new("kem-a")], &OperationKind::KEM, &mut charts)
        .unwrap();

    for op in ["keygen", "encapsulate", "decapsulate"] {
        let path = dir.path().join(format!("kem-a_{op}_plot.svg"));
        assert!(path.exists(), "missing {}", path.display());
    }
    assert_eq!(charts.written().len(), 3);
}

#[test]
fn test_cycle_unit_summaries_carry_unit() {
    let provider = ScriptedProvider::default();
    let config = BenchmarkConfig::new(20, 0.2, 1.5).unwrap();
    let unit = Unit::cycles(2.4e9).unwrap();

    let report = SweepController::new(&provider, config, unit, Clock::monotonic(), b"")
        .unwrap()
        .run_sweep(&[Variant::new("kem-a")], &[OperationKind::KeyGen], &mut ())
        .unwrap();

    assert_eq!(report.unit, unit);
    assert_eq!(report.results[0].unit.name(), "cycles");
    let summary = report.results[0].summary().unwrap();
    assert_eq!(summary.min.fract(), 0.0);
    assert_eq!(summary.max.fract(), 0.0);
}
