//! Telemetry loading in whole-file or row-group mode.

use arrow::compute::concat_batches;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

use wxresolve_core::DeviceRecord;

use crate::chunks::FilteredChunks;
use crate::export::batch_to_records;
use crate::filter::{ChunkFilter, FilterStats, StatsTracker};
use crate::schema::ColumnSelection;
use crate::StreamResult;

/// How a file is brought into memory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoadMode {
    /// Read all projected columns at once, then filter once
    #[default]
    WholeFile,
    /// Read, narrow and filter one row group at a time
    RowGroups,
}

impl LoadMode {
    /// Mode selected by a low-memory flag.
    pub fn from_lowmem(lowmem: bool) -> Self {
        if lowmem {
            LoadMode::RowGroups
        } else {
            LoadMode::WholeFile
        }
    }
}

/// Records that passed the jurisdiction and quality filters.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedTelemetry {
    /// Surviving records
    pub records: Vec<DeviceRecord>,
    /// Per-stage counts
    pub stats: FilterStats,
    /// Whether the file carried a model column
    pub has_model: bool,
}

/// Reads telemetry files through a [`ChunkFilter`].
#[derive(Debug, Clone)]
pub struct Loader {
    filter: ChunkFilter,
    batch_size: usize,
}

impl Loader {
    /// Create a loader decoding `batch_size` rows at a time.
    pub fn new(filter: ChunkFilter, batch_size: usize) -> Self {
        Self {
            filter,
            batch_size: batch_size.max(1),
        }
    }

    /// Load a file, returning only filtered records.
    pub fn load<P: AsRef<Path>>(&self, path: P, mode: LoadMode) -> StreamResult<LoadedTelemetry> {
        let path = path.as_ref();
        info!(path = %path.display(), mode = ?mode, "Loading telemetry");

        let (batch, stats, has_model) = match mode {
            LoadMode::WholeFile => self.load_whole(path)?,
            LoadMode::RowGroups => self.load_row_groups(path)?,
        };
        stats.log();

        let records = match batch {
            Some(batch) => batch_to_records(&batch)?,
            None => Vec::new(),
        };
        Ok(LoadedTelemetry {
            records,
            stats,
            has_model,
        })
    }

    /// Filtered row groups of a file, for streaming consumers.
    pub fn chunks<P: AsRef<Path>>(&self, path: P) -> StreamResult<FilteredChunks> {
        FilteredChunks::open(path, self.filter.clone(), self.batch_size)
    }

    fn load_whole(&self, path: &Path) -> StreamResult<(Option<RecordBatch>, FilterStats, bool)> {
        let builder = ParquetRecordBatchReaderBuilder::try_new(File::open(path)?)?;
        let selection = ColumnSelection::resolve(builder.parquet_schema())?;
        let mask = selection.mask(builder.parquet_schema());
        let reader = builder
            .with_projection(mask)
            .with_batch_size(self.batch_size)
            .build()?;

        let batches = reader.collect::<Result<Vec<_>, _>>()?;
        let mut tracker = StatsTracker::new();
        let filtered = match batches.first() {
            Some(first) => {
                let whole = concat_batches(&first.schema(), &batches)?;
                debug!(rows = whole.num_rows(), "Whole file read");
                Some(self.filter.apply(&whole, &mut tracker)?)
            }
            None => None,
        };
        Ok((filtered, tracker.stats(), selection.has_model))
    }

    fn load_row_groups(
        &self,
        path: &Path,
    ) -> StreamResult<(Option<RecordBatch>, FilterStats, bool)> {
        let mut chunks = self.chunks(path)?;
        let has_model = chunks.has_model();

        let mut survivors = Vec::new();
        for chunk in chunks.by_ref() {
            let chunk = chunk?;
            if chunk.num_rows() > 0 {
                survivors.push(chunk);
            }
        }
        let combined = match survivors.first() {
            Some(first) => Some(concat_batches(&first.schema(), &survivors)?),
            None => None,
        };
        Ok((combined, chunks.stats(), has_model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{filter, sample_records, write_fixture};
    use crate::StreamError;

    fn sorted_names(telemetry: &LoadedTelemetry) -> Vec<(String, u64)> {
        let mut rows: Vec<(String, u64)> = telemetry
            .records
            .iter()
            .map(|r| (r.name.clone(), r.temperature.to_bits()))
            .collect();
        rows.sort();
        rows
    }

    #[test]
    fn test_modes_yield_same_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(dir.path(), &sample_records(), 3, true);
        let loader = Loader::new(filter(), 2);

        let whole = loader.load(&path, LoadMode::WholeFile).unwrap();
        let chunked = loader.load(&path, LoadMode::RowGroups).unwrap();

        assert_eq!(whole.records.len(), 5);
        assert_eq!(sorted_names(&whole), sorted_names(&chunked));
        assert_eq!(whole.stats.rows_admitted, chunked.stats.rows_admitted);
        assert_eq!(whole.stats.devices_admitted, chunked.stats.devices_admitted);
        assert_eq!(whole.stats.chunks, 1);
        assert_eq!(chunked.stats.chunks, 4);
        assert!(whole.has_model && chunked.has_model);
    }

    #[test]
    fn test_model_column_is_optional() {
        let dir = tempfile::tempdir().unwrap();
        let records: Vec<DeviceRecord> = sample_records();
        let path = write_fixture(dir.path(), &records, 4, true);
        assert!(Loader::new(filter(), 64).chunks(&path).unwrap().has_model());

        let lean = crate::tests::write_without_model(dir.path(), &records);
        assert!(!Loader::new(filter(), 64).chunks(&lean).unwrap().has_model());

        let loaded = Loader::new(filter(), 64).load(&lean, LoadMode::RowGroups).unwrap();
        assert_eq!(loaded.records.len(), 5);
        assert!(loaded.records.iter().all(|r| r.model.is_none()));
        assert!(!loaded.has_model);
    }

    #[test]
    fn test_nothing_admitted_is_empty_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let outside: Vec<DeviceRecord> = sample_records()
            .into_iter()
            .filter(|r| r.name == "ws-f")
            .collect();
        let path = write_fixture(dir.path(), &outside, 1, false);

        for mode in [LoadMode::WholeFile, LoadMode::RowGroups] {
            let loaded = Loader::new(filter(), 16).load(&path, mode).unwrap();
            assert!(loaded.records.is_empty());
            assert_eq!(loaded.stats.rows_read, 2);
        }
    }

    #[test]
    fn test_missing_file() {
        let err = Loader::new(filter(), 16)
            .load("/nonexistent/telemetry.parquet", LoadMode::WholeFile)
            .unwrap_err();
        assert!(matches!(err, StreamError::Io(_)));
    }

    #[test]
    fn test_lowmem_flag_selects_mode() {
        assert_eq!(LoadMode::from_lowmem(true), LoadMode::RowGroups);
        assert_eq!(LoadMode::from_lowmem(false), LoadMode::WholeFile);
        assert_eq!(LoadMode::default(), LoadMode::WholeFile);
    }
}
