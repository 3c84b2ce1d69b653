//! Avalanche Runout Core Library
//!
//! Estimates avalanche runout extent from a terrain elevation grid and a set
//! of trigger points using the alpha-angle heuristic: a cell is reachable
//! from a trigger when the depression angle between the trigger and the cell
//! exceeds a configured threshold angle.
//!
//! The library owns three things:
//! - the grid model (elevations plus affine georeferencing),
//! - the trigger set (projected start candidates with sampled elevations),
//! - the runout evaluator (per-trigger reachability, OR-accumulated into one
//!   mask).
//!
//! Raster file formats, GeoJSON parsing and polygon extraction are external
//! collaborators behind the [`grid::RasterSource`] and
//! [`trigger::CoordinateTransform`] seams; the `runout` CLI provides the
//! concrete realizations.

pub mod error;
pub mod evaluate;
pub mod grid;
pub mod trigger;

// Re-export core types
pub use error::{Result, RunoutError};
pub use evaluate::{evaluate, evaluate_sequential, RunoutConfig, RunoutOutcome};
pub use grid::{CoordinateMesh, GeoTransform, RasterSource, RunoutMask, TerrainGrid};
pub use trigger::{
    CoordinateTransform, IdentityProjection, TriggerGeometry, TriggerPoint, TriggerSet,
    WebMercator,
};
