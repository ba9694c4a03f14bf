//! Per-chunk jurisdiction and quality filtering.

use arrow::array::{Array, AsArray, BooleanArray};
use arrow::compute::filter_record_batch;
use arrow::datatypes::{DataType, Float64Type, Int32Type, Int64Type};
use arrow::record_batch::RecordBatch;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use wxresolve_core::{columns, QualityPredicate};
use wxresolve_geo::BoundaryRegistry;

use crate::schema::{cast_column, dictionary_utf8};
use crate::{StreamError, StreamResult};

/// Jurisdiction membership followed by quality admission.
///
/// The two predicates are independent; jurisdiction runs first because it
/// is evaluated once per distinct cell rather than once per row.
#[derive(Clone)]
pub struct ChunkFilter {
    registry: Arc<BoundaryRegistry>,
    quality: Arc<dyn QualityPredicate>,
}

impl fmt::Debug for ChunkFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkFilter")
            .field("resolution", &self.registry.resolution())
            .field("cells", &self.registry.cell_count())
            .finish_non_exhaustive()
    }
}

impl ChunkFilter {
    /// Create a filter over a shared registry and quality predicate.
    pub fn new(registry: Arc<BoundaryRegistry>, quality: Arc<dyn QualityPredicate>) -> Self {
        Self { registry, quality }
    }

    /// The boundary registry used for membership.
    pub fn registry(&self) -> &Arc<BoundaryRegistry> {
        &self.registry
    }

    /// Keep rows inside the jurisdiction whose scores pass the predicate.
    pub fn apply(
        &self,
        batch: &RecordBatch,
        stats: &mut StatsTracker,
    ) -> StreamResult<RecordBatch> {
        let in_region = self.membership_mask(batch)?;
        let admitted = self.quality_mask(batch, &in_region)?;
        stats.observe(batch, &in_region, &admitted)?;

        let mask = BooleanArray::from(admitted);
        Ok(filter_record_batch(batch, &mask)?)
    }

    /// Membership per row, evaluated once per distinct cell identifier.
    fn membership_mask(&self, batch: &RecordBatch) -> StreamResult<Vec<bool>> {
        let cells = cast_column(batch, columns::CELL_ID, &dictionary_utf8())?;
        let dictionary = cells
            .as_dictionary_opt::<Int32Type>()
            .ok_or_else(|| unsupported(columns::CELL_ID, cells.data_type()))?;
        let values = dictionary
            .values()
            .as_string_opt::<i32>()
            .ok_or_else(|| unsupported(columns::CELL_ID, dictionary.values().data_type()))?;

        let members: Vec<bool> = (0..values.len())
            .map(|i| values.is_valid(i) && self.registry.contains_cell(values.value(i)))
            .collect();

        let keys = dictionary.keys();
        Ok((0..keys.len())
            .map(|row| {
                keys.is_valid(row)
                    && usize::try_from(keys.value(row))
                        .ok()
                        .and_then(|key| members.get(key).copied())
                        .unwrap_or(false)
            })
            .collect())
    }

    /// Quality admission for rows already inside the jurisdiction.
    fn quality_mask(&self, batch: &RecordBatch, in_region: &[bool]) -> StreamResult<Vec<bool>> {
        let qod = cast_column(batch, columns::QOD_SCORE, &DataType::Float64)?;
        let qod = qod
            .as_primitive_opt::<Float64Type>()
            .ok_or_else(|| unsupported(columns::QOD_SCORE, qod.data_type()))?;
        let pol = cast_column(batch, columns::POL_SCORE, &DataType::Int64)?;
        let pol = pol
            .as_primitive_opt::<Int64Type>()
            .ok_or_else(|| unsupported(columns::POL_SCORE, pol.data_type()))?;

        Ok(in_region
            .iter()
            .enumerate()
            .map(|(row, &inside)| {
                inside
                    && qod.is_valid(row)
                    && pol.is_valid(row)
                    && self.quality.admits(qod.value(row), pol.value(row))
            })
            .collect())
    }
}

fn unsupported(column: &str, data_type: &DataType) -> StreamError {
    StreamError::UnsupportedColumnType {
        column: column.to_string(),
        data_type: data_type.to_string(),
    }
}

/// Row and device counts at each filtering stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FilterStats {
    /// Chunks read
    pub chunks: usize,
    /// Rows read from the file
    pub rows_read: usize,
    /// Rows whose cell lies inside the jurisdiction
    pub rows_in_jurisdiction: usize,
    /// Rows also admitted by the quality predicate
    pub rows_admitted: usize,
    /// Distinct devices read
    pub devices_read: usize,
    /// Distinct devices with a row inside the jurisdiction
    pub devices_in_jurisdiction: usize,
    /// Distinct devices with an admitted row
    pub devices_admitted: usize,
}

impl FilterStats {
    /// Emit the per-stage counts.
    pub fn log(&self) {
        info!(
            devices_read = self.devices_read,
            devices_in_jurisdiction = self.devices_in_jurisdiction,
            devices_admitted = self.devices_admitted,
            rows_read = self.rows_read,
            rows_admitted = self.rows_admitted,
            chunks = self.chunks,
            "Telemetry filtered"
        );
    }
}

/// Accumulates [`FilterStats`] across chunks, counting each device once.
#[derive(Debug, Default)]
pub struct StatsTracker {
    stats: FilterStats,
    read: HashSet<String>,
    in_jurisdiction: HashSet<String>,
    admitted: HashSet<String>,
}

impl StatsTracker {
    /// Start with zero counts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the counts so far.
    pub fn stats(&self) -> FilterStats {
        FilterStats {
            devices_read: self.read.len(),
            devices_in_jurisdiction: self.in_jurisdiction.len(),
            devices_admitted: self.admitted.len(),
            ..self.stats
        }
    }

    fn observe(
        &mut self,
        batch: &RecordBatch,
        in_region: &[bool],
        admitted: &[bool],
    ) -> StreamResult<()> {
        let names = cast_column(batch, columns::NAME, &DataType::Utf8)?;
        let names = names
            .as_string_opt::<i32>()
            .ok_or_else(|| unsupported(columns::NAME, names.data_type()))?;

        for row in 0..batch.num_rows() {
            let name = if names.is_valid(row) { names.value(row) } else { "" };
            insert(&mut self.read, name);
            if in_region[row] {
                insert(&mut self.in_jurisdiction, name);
            }
            if admitted[row] {
                insert(&mut self.admitted, name);
            }
        }

        let in_region_rows = in_region.iter().filter(|&&kept| kept).count();
        let admitted_rows = admitted.iter().filter(|&&kept| kept).count();
        self.stats.chunks += 1;
        self.stats.rows_read += batch.num_rows();
        self.stats.rows_in_jurisdiction += in_region_rows;
        self.stats.rows_admitted += admitted_rows;
        debug!(
            chunk = self.stats.chunks,
            rows = batch.num_rows(),
            in_jurisdiction = in_region_rows,
            admitted = admitted_rows,
            "Chunk filtered"
        );
        Ok(())
    }
}

fn insert(set: &mut HashSet<String>, name: &str) {
    if !set.contains(name) {
        set.insert(name.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::records_to_batch;
    use crate::schema::narrow_batch;
    use crate::tests::{filter, sample_records};

    #[test]
    fn test_filter_applies_both_predicates() {
        let batch = records_to_batch(&sample_records()).unwrap();
        let mut tracker = StatsTracker::new();

        let kept = filter().apply(&batch, &mut tracker).unwrap();
        let names = cast_column(&kept, columns::NAME, &DataType::Utf8).unwrap();
        let names: Vec<&str> = names.as_string::<i32>().iter().flatten().collect();
        assert_eq!(names, vec!["ws-a", "ws-a", "ws-b", "ws-c", "ws-c"]);

        let stats = tracker.stats();
        assert_eq!(stats.rows_read, 10);
        assert_eq!(stats.rows_in_jurisdiction, 8);
        assert_eq!(stats.rows_admitted, 5);
        assert_eq!(stats.devices_read, 6);
        assert_eq!(stats.devices_in_jurisdiction, 5);
        assert_eq!(stats.devices_admitted, 3);
    }

    #[test]
    fn test_narrowed_chunk_admits_same_rows() {
        let batch = records_to_batch(&sample_records()).unwrap();
        let narrowed = narrow_batch(&batch).unwrap();

        let wide = filter().apply(&batch, &mut StatsTracker::new()).unwrap();
        let narrow = filter().apply(&narrowed, &mut StatsTracker::new()).unwrap();
        assert_eq!(wide.num_rows(), narrow.num_rows());
    }

    #[test]
    fn test_devices_counted_once_across_chunks() {
        let records = sample_records();
        let mut tracker = StatsTracker::new();
        for chunk in records.chunks(3) {
            let batch = records_to_batch(chunk).unwrap();
            filter().apply(&batch, &mut tracker).unwrap();
        }

        let stats = tracker.stats();
        assert_eq!(stats.chunks, 4);
        assert_eq!(stats.devices_read, 6);
        assert_eq!(stats.devices_admitted, 3);
    }
}
