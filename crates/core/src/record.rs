//! Telemetry records submitted by weather stations.

use serde::{Deserialize, Serialize};

/// Column names of the telemetry input.
pub mod columns {
    pub const NAME: &str = "name";
    pub const MODEL: &str = "model";
    pub const CELL_ID: &str = "cell_id";
    pub const PUBLIC_KEY: &str = "public_key";
    pub const PACKET: &str = "ws_packet_b64";
    pub const SIGNATURE: &str = "ws_packet_sig";
    pub const LAT: &str = "lat";
    pub const LON: &str = "lon";
    pub const QOD_SCORE: &str = "qod_score";
    pub const POL_SCORE: &str = "pol_score";
    pub const TEMPERATURE: &str = "temperature";

    /// Columns every input must carry.
    pub const REQUIRED: [&str; 10] = [
        NAME,
        CELL_ID,
        PUBLIC_KEY,
        PACKET,
        SIGNATURE,
        LAT,
        LON,
        QOD_SCORE,
        POL_SCORE,
        TEMPERATURE,
    ];

    /// Columns projected when present.
    pub const OPTIONAL: [&str; 1] = [MODEL];
}

/// One telemetry submission from a weather station.
///
/// A device may submit many records; `name` is not unique across a file.
/// Records are never mutated once loaded, pipeline stages only select subsets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    /// Device identifier
    pub name: String,
    /// Hardware model code, absent when the input has no model column
    pub model: Option<String>,
    /// H3 cell containing the reported position (lowercase hex)
    pub cell_id: String,
    /// Hex-encoded public key, layout depends on the model
    pub public_key: String,
    /// Signed payload, base64 text
    pub packet: String,
    /// Base64 signature over the payload
    pub signature: String,
    /// Reported latitude (informational)
    pub lat: f64,
    /// Reported longitude (informational)
    pub lon: f64,
    /// Quality-of-data score
    pub qod_score: f64,
    /// Proof-of-location flag
    pub pol_score: i64,
    /// Temperature reading in Celsius
    pub temperature: f64,
}

impl DeviceRecord {
    /// Hardware model code, or the empty string when unknown.
    pub fn model_code(&self) -> &str {
        self.model.as_deref().unwrap_or_default()
    }
}
