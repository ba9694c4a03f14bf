//! Jurisdiction filter over telemetry records.

use tracing::debug;

use wxresolve_core::DeviceRecord;

use crate::BoundaryRegistry;

/// Keep records whose reported cell lies inside the jurisdiction.
pub fn within_jurisdiction(
    records: Vec<DeviceRecord>,
    registry: &BoundaryRegistry,
) -> Vec<DeviceRecord> {
    let total = records.len();
    let kept: Vec<DeviceRecord> = records
        .into_iter()
        .filter(|record| registry.contains_cell(&record.cell_id))
        .collect();
    debug!(total, kept = kept.len(), "Jurisdiction filter applied");
    kept
}
