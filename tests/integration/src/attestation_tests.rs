//! Scheme configuration flowing through the full pipeline.

use std::collections::BTreeMap;
use std::path::PathBuf;

use wxresolve_core::{BoundaryConfig, DeviceRecord, PipelineConfig};
use wxresolve_decision::{DecisionError, LoadMode, Resolver};
use wxresolve_identity::Scheme;

use crate::test_utils::*;

/// One station per firmware generation, both claiming model WS1000.
fn firmware_generations() -> Vec<DeviceRecord> {
    let legacy = TestStation::new("ws-legacy");
    let upgraded = TestStation::new("ws-upgraded");

    let mut upgraded_reading = upgraded.reading(Scheme::EcdsaP256Decoded, GREENWICH, 16.0);
    upgraded_reading.model = Some(model_for(Scheme::EcdsaP256Text).to_string());

    vec![
        legacy.reading(Scheme::EcdsaP256Text, TRAFALGAR_SQUARE, 10.0),
        upgraded_reading,
    ]
}

#[test]
fn test_scheme_override_changes_admitted_devices() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_telemetry(dir.path(), &firmware_generations(), 8);

    let stock = Resolver::new(london(), &PipelineConfig::default()).unwrap();
    let resolution = stock.decide(&path, LoadMode::WholeFile).unwrap();
    assert_eq!(resolution.decision.value, 10.0);

    let overridden = PipelineConfig {
        schemes: BTreeMap::from([("WS1000".to_string(), "ecdsa-p256-decoded".to_string())]),
        ..PipelineConfig::default()
    };
    let resolver = Resolver::new(london(), &overridden).unwrap();
    let resolution = resolver.decide(&path, LoadMode::RowGroups).unwrap();
    assert_eq!(resolution.decision.value, 16.0);
    assert_eq!(resolution.verification.unwrap().rejected_records, 1);
}

#[test]
fn test_unknown_scheme_override_rejected() {
    let config = PipelineConfig {
        schemes: BTreeMap::from([("WS1000".to_string(), "ed25519".to_string())]),
        ..PipelineConfig::default()
    };
    assert!(matches!(
        Resolver::new(london(), &config),
        Err(DecisionError::Identity(_))
    ));
}

#[test]
fn test_resolver_from_config_at_coarser_resolution() {
    let station = TestStation::new("ws-rsa");
    let records = vec![
        station.reading(Scheme::RsaPkcs1Sha256, TRAFALGAR_SQUARE, 11.0),
        station.reading(Scheme::RsaPkcs1Sha256, TRAFALGAR_SQUARE, 13.0),
    ];
    let config = PipelineConfig {
        boundary: BoundaryConfig {
            path: PathBuf::from(env!("CARGO_MANIFEST_DIR"))
                .join("../../geojson/boundary_coords.txt"),
            resolution: 7,
        },
        ..PipelineConfig::default()
    };
    let dir = tempfile::tempdir().unwrap();
    let path = write_telemetry(dir.path(), &records, 1);

    let resolver = Resolver::from_config(&config).unwrap();
    assert!(resolver.verifies_signatures());
    let resolution = resolver.decide_streaming(&path).unwrap();
    assert_eq!(resolution.decision.value, 12.0);
    assert_eq!(resolution.filter.chunks, 2);

    // Cells are tiled at the configured resolution, so resolution 6 cell ids
    // in the file would not match a resolution 7 registry.
    let coarse = PipelineConfig {
        boundary: BoundaryConfig {
            resolution: 6,
            ..config.boundary.clone()
        },
        ..config
    };
    let coarse_resolver = Resolver::from_config(&coarse).unwrap();
    assert!(matches!(
        coarse_resolver.decide(&path, LoadMode::WholeFile),
        Err(DecisionError::EmptyAggregationInput)
    ));
}
