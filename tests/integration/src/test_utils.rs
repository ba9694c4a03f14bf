//! Fixtures for end-to-end pipeline tests: signing stations, the London
//! jurisdiction and Parquet telemetry files.

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;
use p256::ecdsa::signature::Signer as _;
use p256::ecdsa::{Signature, SigningKey};
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::traits::PublicKeyParts;
use rsa::{Pkcs1v15Sign, RsaPrivateKey};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use wxresolve_core::{columns, DeviceRecord};
use wxresolve_geo::{BoundaryRegistry, BoundarySource};
use wxresolve_identity::{Scheme, REFERENCE_CATALOG};

const RSA_TEST_KEY_PEM: &str = include_str!("../../../crates/identity/testdata/rsa_test_key.pem");

/// Cached outline of Greater London.
pub const LONDON_OUTLINE: &str = include_str!("../../../geojson/boundary_coords.txt");

pub const TRAFALGAR_SQUARE: (f64, f64) = (51.5074, -0.1278);
pub const GREENWICH: (f64, f64) = (51.4826, -0.0077);
pub const MANCHESTER: (f64, f64) = (53.4808, -2.2426);

/// Install a test subscriber once; later calls are no-ops.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("warn"))
        .with_test_writer()
        .try_init();
}

pub fn london() -> Arc<BoundaryRegistry> {
    Arc::new(
        BoundaryRegistry::init(BoundarySource::from_text(LONDON_OUTLINE), 7)
            .expect("London outline tiles"),
    )
}

/// First catalog model signing with `scheme`.
pub fn model_for(scheme: Scheme) -> &'static str {
    REFERENCE_CATALOG
        .iter()
        .find(|(_, s)| *s == scheme)
        .map(|(model, _)| *model)
        .expect("every scheme has a catalog model")
}

/// A weather station holding key material for every scheme.
pub struct TestStation {
    pub name: String,
    ec_key: SigningKey,
    rsa_key: RsaPrivateKey,
}

impl TestStation {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ec_key: SigningKey::random(&mut rand::rngs::OsRng),
            rsa_key: RsaPrivateKey::from_pkcs1_pem(RSA_TEST_KEY_PEM).expect("test key parses"),
        }
    }

    pub fn public_key_hex(&self, scheme: Scheme) -> String {
        match scheme {
            Scheme::RsaPkcs1Sha256 => format!(
                "{}{}",
                hex::encode(self.rsa_key.n().to_bytes_be()),
                hex::encode(self.rsa_key.e().to_bytes_be())
            ),
            Scheme::EcdsaP256Text | Scheme::EcdsaP256Decoded => {
                let point = self.ec_key.verifying_key().to_encoded_point(false);
                format!(
                    "{}{}",
                    hex::encode(point.x().expect("uncompressed point")),
                    hex::encode(point.y().expect("uncompressed point"))
                )
            }
        }
    }

    pub fn sign(&self, scheme: Scheme, packet: &str) -> String {
        let raw = match scheme {
            Scheme::EcdsaP256Text => {
                let signature: Signature = self.ec_key.sign(packet.as_bytes());
                signature.to_bytes().to_vec()
            }
            Scheme::EcdsaP256Decoded => {
                let message = URL_SAFE.decode(packet).expect("packet is base64url");
                let signature: Signature = self.ec_key.sign(&message);
                signature.to_bytes().to_vec()
            }
            Scheme::RsaPkcs1Sha256 => self
                .rsa_key
                .sign(
                    Pkcs1v15Sign::new::<Sha256>(),
                    &Sha256::digest(packet.as_bytes()),
                )
                .expect("RSA signing"),
        };
        URL_SAFE.encode(raw)
    }

    /// A correctly signed reading from `at` that passes the default quality gate.
    pub fn reading(&self, scheme: Scheme, at: (f64, f64), temperature: f64) -> DeviceRecord {
        let registry = london();
        let cell = registry
            .cell_at(at.0, at.1)
            .expect("valid coordinate")
            .to_string();
        let packet = URL_SAFE.encode(format!(
            r#"{{"device":"{}","temp":{temperature}}}"#,
            self.name
        ));
        DeviceRecord {
            name: self.name.clone(),
            model: Some(model_for(scheme).to_string()),
            cell_id: cell,
            public_key: self.public_key_hex(scheme),
            signature: self.sign(scheme, &packet),
            packet,
            lat: at.0,
            lon: at.1,
            qod_score: 0.9,
            pol_score: 1,
            temperature,
        }
    }
}

/// Write records as Parquet with at most `row_group_size` rows per group.
pub fn write_telemetry(dir: &Path, records: &[DeviceRecord], row_group_size: usize) -> PathBuf {
    let path = dir.join(format!("telemetry-{row_group_size}.parquet"));
    wxresolve_stream::write_parquet(&path, records, row_group_size).expect("fixture written");
    path
}

/// Write records without the model column.
pub fn write_without_model(dir: &Path, records: &[DeviceRecord]) -> PathBuf {
    let path = dir.join("telemetry-no-model.parquet");
    let batch = wxresolve_stream::records_to_batch(records).expect("fixture batch");
    let keep: Vec<usize> = batch
        .schema()
        .fields()
        .iter()
        .enumerate()
        .filter(|(_, field)| field.name() != columns::MODEL)
        .map(|(index, _)| index)
        .collect();
    let batch = batch.project(&keep).expect("projection");

    let props = WriterProperties::builder().set_max_row_group_size(3).build();
    let file = File::create(&path).expect("fixture file");
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props)).expect("writer");
    writer.write(&batch).expect("write");
    writer.close().expect("close");
    path
}
