//! Process-wide jurisdiction cell set.

use geo::MultiPolygon;
use h3o::geom::{ContainmentMode, TilerBuilder};
use h3o::{CellIndex, LatLng, Resolution};
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

use wxresolve_core::BoundaryConfig;

use crate::boundary::{coordinate_cache, BoundarySource};
use crate::{GeoError, GeoResult};

/// The jurisdiction polygon and the H3 cells that tile it.
///
/// Built once per process and read-only afterwards; share it behind an
/// `Arc` across stages. Cells are selected by centroid containment, the
/// classic polyfill rule.
#[derive(Debug, Clone)]
pub struct BoundaryRegistry {
    jurisdiction: MultiPolygon<f64>,
    resolution: Resolution,
    cell_ids: HashSet<String>,
}

impl BoundaryRegistry {
    /// Parse the boundary and tile it at `resolution`.
    pub fn init(source: BoundarySource, resolution: u8) -> GeoResult<Self> {
        let resolution =
            Resolution::try_from(resolution).map_err(|_| GeoError::InvalidResolution(resolution))?;
        let jurisdiction = source.into_geometry()?;

        let mut tiler = TilerBuilder::new(resolution)
            .containment_mode(ContainmentMode::ContainsCentroid)
            .build();
        tiler.add_batch(jurisdiction.0.iter().cloned())?;
        let cell_ids: HashSet<String> = tiler
            .into_coverage()
            .map(|cell| cell.to_string())
            .collect();

        if cell_ids.is_empty() {
            warn!(
                resolution = u8::from(resolution),
                "Jurisdiction covers no cells at this resolution; every record will be excluded"
            );
        }
        info!(
            resolution = u8::from(resolution),
            polygons = jurisdiction.0.len(),
            cells = cell_ids.len(),
            "Boundary registry initialized"
        );

        Ok(Self {
            jurisdiction,
            resolution,
            cell_ids,
        })
    }

    pub fn from_path<P: AsRef<Path>>(path: P, resolution: u8) -> GeoResult<Self> {
        Self::init(BoundarySource::from_path(path)?, resolution)
    }

    pub fn from_config(config: &BoundaryConfig) -> GeoResult<Self> {
        Self::from_path(&config.path, config.resolution)
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn cell_count(&self) -> usize {
        self.cell_ids.len()
    }

    /// Cell identifiers in lowercase hex, in no particular order.
    pub fn cell_ids(&self) -> impl Iterator<Item = &str> {
        self.cell_ids.iter().map(String::as_str)
    }

    /// Exact membership of a hex cell identifier. Upper-case input is
    /// normalized; anything else must match the canonical form.
    pub fn contains_cell(&self, cell_id: &str) -> bool {
        if cell_id.bytes().any(|b| b.is_ascii_uppercase()) {
            self.cell_ids.contains(&cell_id.to_ascii_lowercase())
        } else {
            self.cell_ids.contains(cell_id)
        }
    }

    pub fn contains(&self, cell: CellIndex) -> bool {
        self.cell_ids.contains(&cell.to_string())
    }

    /// The cell at this registry's resolution containing a point.
    pub fn cell_at(&self, lat: f64, lon: f64) -> GeoResult<CellIndex> {
        let point = LatLng::new(lat, lon).map_err(|_| GeoError::InvalidCoordinate { lat, lon })?;
        Ok(point.to_cell(self.resolution))
    }

    /// Serialize the jurisdiction into the cached coordinate-list form.
    pub fn to_coordinate_cache(&self) -> GeoResult<String> {
        coordinate_cache(&self.jurisdiction)
    }
}
