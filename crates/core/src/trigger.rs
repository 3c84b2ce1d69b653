//! Trigger points: avalanche-start candidates projected into the grid CRS.
//!
//! Input geometries arrive as geographic (lon, lat) points or paths; paths
//! flatten to their constituent waypoints. Each point is projected into the
//! terrain grid's CRS through a [`CoordinateTransform`] and its elevation is
//! sampled from the nearest grid cell.
//!
//! The caller must pick a transform whose target CRS matches the grid's CRS;
//! the core does not detect a mismatch on its own.

use nalgebra::Point2;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::grid::TerrainGrid;

/// An input trigger geometry in geographic (lon, lat) coordinates.
///
/// Point order inside a path is irrelevant to the final result: the runout
/// mask is a union over all triggers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TriggerGeometry {
    /// A single trigger point
    Point(Point2<f64>),
    /// Waypoints of a line, route or track, each one a trigger
    Path(Vec<Point2<f64>>),
}

impl TriggerGeometry {
    fn flatten_into(&self, out: &mut Vec<Point2<f64>>) {
        match self {
            TriggerGeometry::Point(p) => out.push(*p),
            TriggerGeometry::Path(points) => out.extend_from_slice(points),
        }
    }
}

/// Projection from geographic (lon, lat) into a planar CRS.
///
/// Concrete map projections live outside the core's responsibility; the two
/// implementations here cover pre-projected inputs and the spherical web
/// mercator case the CLI needs.
pub trait CoordinateTransform {
    /// CRS identifier of the projected output, e.g. `"EPSG:3857"`.
    fn target_crs(&self) -> &str;

    /// Project a (lon, lat) coordinate into the target CRS.
    fn project(&self, lon_lat: Point2<f64>) -> Point2<f64>;
}

/// Pass-through for trigger coordinates that are already planar.
#[derive(Debug, Clone)]
pub struct IdentityProjection {
    crs: String,
}

impl IdentityProjection {
    /// Identity transform tagged with the CRS the coordinates are in.
    pub fn new(crs: impl Into<String>) -> Self {
        Self { crs: crs.into() }
    }
}

impl CoordinateTransform for IdentityProjection {
    fn target_crs(&self) -> &str {
        &self.crs
    }

    fn project(&self, lon_lat: Point2<f64>) -> Point2<f64> {
        lon_lat
    }
}

/// Spherical web mercator (EPSG:4326 -> EPSG:3857) forward transform.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebMercator;

/// WGS84 semi-major axis in meters.
const WGS84_RADIUS: f64 = 6378137.0;

/// Latitude bound beyond which web mercator diverges.
const MAX_LATITUDE: f64 = 85.05112878;

impl CoordinateTransform for WebMercator {
    fn target_crs(&self) -> &str {
        "EPSG:3857"
    }

    fn project(&self, lon_lat: Point2<f64>) -> Point2<f64> {
        let lon = lon_lat.x.to_radians();
        let lat = lon_lat
            .y
            .clamp(-MAX_LATITUDE, MAX_LATITUDE)
            .to_radians();
        let x = WGS84_RADIUS * lon;
        let y = WGS84_RADIUS * (std::f64::consts::FRAC_PI_4 + lat / 2.0).tan().ln();
        Point2::new(x, y)
    }
}

/// One projected trigger, ready for evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerPoint {
    /// Geographic (lon, lat) coordinate as supplied by the input source
    pub geographic: Point2<f64>,
    /// Coordinate in the grid's CRS
    pub projected: Point2<f64>,
    /// Nearest-cell elevation, `None` when the trigger lands outside the
    /// grid extent or on a no-data cell
    pub elevation: Option<f64>,
}

/// All triggers of a run: flattened, de-duplicated, projected and sampled.
#[derive(Debug, Clone)]
pub struct TriggerSet {
    triggers: Vec<TriggerPoint>,
    duplicates_dropped: usize,
    sampling_gaps: usize,
}

impl TriggerSet {
    /// Flatten the input geometries to points, project each into the grid's
    /// CRS and sample its elevation.
    ///
    /// Exact duplicate coordinates are evaluated once; closed GeoJSON rings
    /// repeat their first vertex, and a duplicate trigger costs a full grid
    /// pass without changing the mask. Triggers that land outside the grid
    /// or on a no-data cell are kept with `elevation = None` so the
    /// evaluator can skip and count them.
    pub fn from_geometries<T: CoordinateTransform>(
        geometries: &[TriggerGeometry],
        transform: &T,
        grid: &TerrainGrid,
    ) -> Self {
        let mut points = Vec::new();
        for geometry in geometries {
            geometry.flatten_into(&mut points);
        }

        let mut seen: FxHashSet<(u64, u64)> = FxHashSet::default();
        let mut triggers = Vec::with_capacity(points.len());
        let mut duplicates_dropped = 0;
        let mut sampling_gaps = 0;

        for geographic in points {
            if !seen.insert((geographic.x.to_bits(), geographic.y.to_bits())) {
                duplicates_dropped += 1;
                continue;
            }

            let projected = transform.project(geographic);
            let elevation = grid.sample(projected.x, projected.y);
            if elevation.is_none() {
                sampling_gaps += 1;
                warn!(
                    lon = geographic.x,
                    lat = geographic.y,
                    easting = projected.x,
                    northing = projected.y,
                    "Trigger outside grid extent or on no-data cell, it will contribute no runout"
                );
            }

            triggers.push(TriggerPoint {
                geographic,
                projected,
                elevation,
            });
        }

        Self {
            triggers,
            duplicates_dropped,
            sampling_gaps,
        }
    }

    /// The projected triggers, in input order.
    pub fn triggers(&self) -> &[TriggerPoint] {
        &self.triggers
    }

    /// Number of distinct triggers.
    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    /// Whether the set holds no triggers.
    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }

    /// Exact duplicate coordinates dropped during flattening.
    pub fn duplicates_dropped(&self) -> usize {
        self.duplicates_dropped
    }

    /// Triggers whose elevation could not be sampled.
    pub fn sampling_gaps(&self) -> usize {
        self.sampling_gaps
    }
}
