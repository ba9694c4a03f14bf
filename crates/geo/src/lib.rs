//! Jurisdiction membership for telemetry records.
//!
//! A [`BoundaryRegistry`] tiles the jurisdiction polygon with H3 cells once,
//! then answers exact membership queries for the `cell_id` a station reports.
//! The registry performs no network access: boundaries come from GeoJSON or
//! from the cached coordinate list kept next to the deployment.
//!
//! ```no_run
//! use wxresolve_geo::{within_jurisdiction, BoundaryRegistry};
//!
//! let registry = BoundaryRegistry::from_path("geojson/boundary_coords.txt", 7)?;
//! let records = Vec::new();
//! let local = within_jurisdiction(records, &registry);
//! # Ok::<(), wxresolve_geo::GeoError>(())
//! ```

pub mod boundary;
pub mod error;
pub mod filter;
pub mod registry;

pub use boundary::BoundarySource;
pub use error::{GeoError, GeoResult};
pub use filter::within_jurisdiction;
pub use registry::BoundaryRegistry;
