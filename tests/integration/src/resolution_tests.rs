//! Decisions over mixed fleets, across every ingestion mode.

use std::sync::Arc;

use wxresolve_core::{DeviceRecord, PipelineConfig};
use wxresolve_decision::{DecisionError, LoadMode, Resolver};
use wxresolve_identity::Scheme;

use crate::test_utils::*;

/// Three attested stations inside London plus every kind of reading the
/// pipeline must drop. The attested per-device means are 15, 16 and 20.
fn mixed_fleet() -> Vec<DeviceRecord> {
    let text = TestStation::new("ws-text");
    let decoded = TestStation::new("ws-decoded");
    let rsa = TestStation::new("ws-rsa");
    let forger = TestStation::new("ws-forger");
    let exotic = TestStation::new("ws-exotic");
    let remote = TestStation::new("ws-manchester");
    let noisy = TestStation::new("ws-noisy");

    let mut forged = forger.reading(Scheme::EcdsaP256Text, TRAFALGAR_SQUARE, 90.0);
    forged.signature = forger.sign(Scheme::EcdsaP256Text, "eyJ0ZW1wIjoxMn0=");

    let mut unsupported = exotic.reading(Scheme::EcdsaP256Text, GREENWICH, 80.0);
    unsupported.model = Some("XR-9".to_string());

    let mut low_quality = noisy.reading(Scheme::EcdsaP256Decoded, GREENWICH, 70.0);
    low_quality.qod_score = 0.4;

    vec![
        text.reading(Scheme::EcdsaP256Text, TRAFALGAR_SQUARE, 10.0),
        forged,
        decoded.reading(Scheme::EcdsaP256Decoded, GREENWICH, 16.0),
        remote.reading(Scheme::EcdsaP256Text, MANCHESTER, -10.0),
        rsa.reading(Scheme::RsaPkcs1Sha256, TRAFALGAR_SQUARE, 20.0),
        unsupported,
        text.reading(Scheme::EcdsaP256Text, GREENWICH, 20.0),
        low_quality,
    ]
}

#[test]
fn test_mixed_fleet_every_mode_agrees() {
    init_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = write_telemetry(dir.path(), &mixed_fleet(), 3);
    let resolver = Resolver::new(london(), &PipelineConfig::default()).unwrap();

    let whole = resolver.decide(&path, LoadMode::WholeFile).unwrap();
    let chunked = resolver.decide(&path, LoadMode::RowGroups).unwrap();
    let streamed = resolver.decide_streaming(&path).unwrap();

    for resolution in [&whole, &chunked, &streamed] {
        assert_eq!(resolution.decision.value, 17.0);
        assert_eq!(resolution.decision.devices, 3);
        assert_eq!(resolution.decision.readings, 4);
    }

    let report = whole.verification.unwrap();
    assert_eq!(report.records_seen, 6);
    assert_eq!(report.records_verified, 4);
    assert_eq!(report.unsupported_records, 1);
    assert_eq!(report.rejected_records, 1);
    assert_eq!(report.devices_seen, 5);
    assert_eq!(report.devices_verified, 3);
    assert_eq!(chunked.verification, Some(report));
    assert_eq!(streamed.verification, Some(report));

    assert_eq!(whole.filter.rows_read, 8);
    assert_eq!(whole.filter.rows_in_jurisdiction, 7);
    assert_eq!(whole.filter.rows_admitted, 6);
    assert_eq!(chunked.filter.rows_admitted, 6);
    assert_eq!(chunked.filter.chunks, 3);

    // Three attested devices out of six reporting from inside London
    assert_eq!(whole.filter.devices_in_jurisdiction, 6);
    for resolution in [&whole, &chunked, &streamed] {
        assert_eq!(resolution.participation_percent(), 50.0);
    }
}

#[test]
fn test_no_attested_device_is_an_error() {
    let station = TestStation::new("ws-text");
    let mut reading = station.reading(Scheme::EcdsaP256Text, TRAFALGAR_SQUARE, 12.0);
    reading.signature = station.sign(Scheme::EcdsaP256Decoded, &reading.packet);

    let dir = tempfile::tempdir().unwrap();
    let path = write_telemetry(dir.path(), &[reading], 8);
    let resolver = Resolver::new(london(), &PipelineConfig::default()).unwrap();

    for mode in [LoadMode::WholeFile, LoadMode::RowGroups] {
        assert!(matches!(
            resolver.decide(&path, mode),
            Err(DecisionError::EmptyAggregationInput)
        ));
    }
}

#[test]
fn test_missing_model_column() {
    init_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = write_without_model(dir.path(), &mixed_fleet());
    let registry = london();

    let attesting = Resolver::new(Arc::clone(&registry), &PipelineConfig::default()).unwrap();
    assert!(matches!(
        attesting.decide(&path, LoadMode::RowGroups),
        Err(DecisionError::EmptyAggregationInput)
    ));

    let trusting = PipelineConfig {
        verify_signatures: false,
        ..PipelineConfig::default()
    };
    let resolver = Resolver::new(registry, &trusting).unwrap();
    let resolution = resolver.decide(&path, LoadMode::WholeFile).unwrap();

    // In-region, quality-passing rows only; signatures are not consulted.
    let expected = (15.0 + 90.0 + 16.0 + 20.0 + 80.0) / 5.0;
    assert_eq!(resolution.decision.value, expected);
    assert!(resolution.verification.is_none());
}
