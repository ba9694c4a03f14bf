//! Lazy row-group iteration.

use arrow::compute::concat_batches;
use arrow::datatypes::Schema;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::{ArrowReaderMetadata, ParquetRecordBatchReaderBuilder};
use parquet::arrow::ProjectionMask;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::filter::{ChunkFilter, FilterStats, StatsTracker};
use crate::schema::{narrow_batch, ColumnSelection};
use crate::StreamResult;

/// Filtered row groups of one Parquet file, read one at a time.
///
/// Each item is a single row group with only the pipeline's columns,
/// narrowed to compact types and already passed through the [`ChunkFilter`].
/// Peak memory is one row group plus the survivors. The iterator is finite
/// and can be rewound to read the file again.
///
/// The footer is parsed once on open; every row group is read through the
/// same file handle and metadata.
#[derive(Debug)]
pub struct FilteredChunks {
    path: PathBuf,
    file: File,
    metadata: ArrowReaderMetadata,
    mask: ProjectionMask,
    has_model: bool,
    filter: ChunkFilter,
    batch_size: usize,
    row_groups: usize,
    next: usize,
    tracker: StatsTracker,
    failed: bool,
}

impl FilteredChunks {
    /// Open a file and read its footer; no row group is decoded yet.
    pub fn open<P: AsRef<Path>>(
        path: P,
        filter: ChunkFilter,
        batch_size: usize,
    ) -> StreamResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        let metadata = ArrowReaderMetadata::load(&file, Default::default())?;
        let parquet_schema = metadata.metadata().file_metadata().schema_descr();
        // Fail on schema problems before the first chunk
        let selection = ColumnSelection::resolve(parquet_schema)?;
        let mask = selection.mask(parquet_schema);
        let row_groups = metadata.metadata().num_row_groups();
        debug!(path = %path.display(), row_groups, "Opened telemetry for chunked read");

        Ok(Self {
            path,
            file,
            metadata,
            mask,
            has_model: selection.has_model,
            filter,
            batch_size: batch_size.max(1),
            row_groups,
            next: 0,
            tracker: StatsTracker::new(),
            failed: false,
        })
    }

    /// Row groups in the file.
    pub fn row_groups(&self) -> usize {
        self.row_groups
    }

    /// Whether the file carries the optional model column.
    pub fn has_model(&self) -> bool {
        self.has_model
    }

    /// Counts over the chunks yielded so far.
    pub fn stats(&self) -> FilterStats {
        self.tracker.stats()
    }

    /// Start again from the first row group with fresh counts.
    pub fn rewind(&mut self) {
        self.next = 0;
        self.tracker = StatsTracker::new();
        self.failed = false;
    }

    fn read_row_group(&mut self, index: usize) -> StreamResult<RecordBatch> {
        let file = self.file.try_clone()?;
        let builder =
            ParquetRecordBatchReaderBuilder::new_with_metadata(file, self.metadata.clone());
        let reader = builder
            .with_projection(self.mask.clone())
            .with_row_groups(vec![index])
            .with_batch_size(self.batch_size)
            .build()?;

        let mut narrowed = Vec::new();
        for batch in reader {
            narrowed.push(narrow_batch(&batch?)?);
        }
        debug!(path = %self.path.display(), row_group = index, "Row group decoded");
        let Some(first) = narrowed.first() else {
            return Ok(RecordBatch::new_empty(Arc::new(Schema::empty())));
        };
        let chunk = concat_batches(&first.schema(), &narrowed)?;
        self.filter.apply(&chunk, &mut self.tracker)
    }
}

impl Iterator for FilteredChunks {
    type Item = StreamResult<RecordBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.next >= self.row_groups {
            return None;
        }
        let index = self.next;
        self.next += 1;

        let chunk = self.read_row_group(index);
        if chunk.is_err() {
            self.failed = true;
        }
        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            return (0, Some(0));
        }
        let remaining = self.row_groups.saturating_sub(self.next);
        (0, Some(remaining))
    }
}
