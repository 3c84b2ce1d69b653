//! Runout evaluation: the alpha-angle reachability test.
//!
//! For a trigger at elevation `te` and a cell at planar distance `d` and
//! elevation `ze`, the cell lies in the trigger's runout zone when the
//! depression angle from trigger to cell exceeds the configured alpha angle:
//!
//! ```text
//! (te - ze) / d > tan(alpha)        with te - ze clipped at 0
//! ```
//!
//! Both sides are squared so the hot loop runs on `drop^2 / d^2` against a
//! precomputed `tan^2(alpha)` and never takes a square root or a tangent per
//! cell. Per-trigger results are folded into one mask by logical OR; the
//! fold is commutative and associative, so triggers can be evaluated in any
//! order or in parallel without changing the result.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, RunoutError};
use crate::grid::{CoordinateMesh, GeoTransform, RunoutMask, TerrainGrid};
use crate::trigger::{TriggerPoint, TriggerSet};

/// Runout angle configuration.
///
/// The angle is converted once to a squared-tangent threshold for the whole
/// run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunoutConfig {
    alpha_degrees: f64,
    tan_squared: f64,
}

impl RunoutConfig {
    /// Default runout angle in degrees.
    pub const DEFAULT_ANGLE_DEGREES: f64 = 19.0;

    /// Create a configuration with the given runout angle.
    ///
    /// # Errors
    /// The angle must be strictly between 0 and 90 degrees.
    pub fn new(alpha_degrees: f64) -> Result<Self> {
        if !(alpha_degrees > 0.0 && alpha_degrees < 90.0) {
            return Err(RunoutError::InvalidAngle {
                degrees: alpha_degrees,
            });
        }
        let tan = alpha_degrees.to_radians().tan();
        Ok(Self {
            alpha_degrees,
            tan_squared: tan * tan,
        })
    }

    /// The configured angle in degrees.
    #[inline]
    pub fn alpha_degrees(&self) -> f64 {
        self.alpha_degrees
    }

    /// The precomputed `tan^2(alpha)` threshold.
    #[inline]
    pub fn tan_squared(&self) -> f64 {
        self.tan_squared
    }
}

impl Default for RunoutConfig {
    fn default() -> Self {
        let tan = Self::DEFAULT_ANGLE_DEGREES.to_radians().tan();
        Self {
            alpha_degrees: Self::DEFAULT_ANGLE_DEGREES,
            tan_squared: tan * tan,
        }
    }
}

/// Result of a full evaluation run.
///
/// Carries the grid geometry alongside the mask so a downstream raster
/// writer can georeference its output without holding the terrain grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunoutOutcome {
    /// Cells reachable from at least one trigger
    pub mask: RunoutMask,
    /// The grid's affine transform
    pub transform: GeoTransform,
    /// The grid's CRS identifier
    pub crs: String,
    /// Triggers whose contribution was computed
    pub triggers_evaluated: usize,
    /// Triggers skipped for lack of a sampled elevation
    pub triggers_skipped: usize,
}

/// Reachability of every cell from a single trigger.
///
/// A trigger without a sampled elevation contributes an empty mask. A cell
/// at exactly zero distance from the trigger is reachable by definition:
/// the trigger marks the top of the avalanche path, so its own cell belongs
/// to the runout zone. No-data cells never qualify.
fn trigger_mask(
    trigger: &TriggerPoint,
    grid: &TerrainGrid,
    mesh: &CoordinateMesh,
    tan_squared: f64,
) -> RunoutMask {
    let mut mask = RunoutMask::new(grid.width(), grid.height());
    let Some(trigger_elevation) = trigger.elevation else {
        return mask;
    };
    let (tx, ty) = (trigger.projected.x, trigger.projected.y);

    let elevations = grid.elevations();
    let eastings = mesh.eastings();
    let northings = mesh.northings();

    for idx in 0..elevations.len() {
        let cell_elevation = elevations[idx];
        if grid.is_missing(cell_elevation) {
            continue;
        }

        let dx = eastings[idx] - tx;
        let dy = northings[idx] - ty;
        let dist_squared = dx * dx + dy * dy;

        if dist_squared == 0.0 {
            mask.set_index(idx);
            continue;
        }

        let drop = (trigger_elevation - cell_elevation).max(0.0);
        if drop * drop / dist_squared > tan_squared {
            mask.set_index(idx);
        }
    }

    mask
}

fn outcome(mask: RunoutMask, grid: &TerrainGrid, triggers: &TriggerSet) -> RunoutOutcome {
    let skipped = triggers
        .triggers()
        .iter()
        .filter(|t| t.elevation.is_none())
        .count();
    RunoutOutcome {
        mask,
        transform: *grid.transform(),
        crs: grid.crs().to_string(),
        triggers_evaluated: triggers.len() - skipped,
        triggers_skipped: skipped,
    }
}

/// Evaluate all triggers in parallel and OR-reduce their masks.
///
/// Each worker owns its per-trigger mask; partial results only meet in the
/// reduction, so no mask is ever mutated by two writers.
pub fn evaluate(grid: &TerrainGrid, triggers: &TriggerSet, config: &RunoutConfig) -> RunoutOutcome {
    let mesh = grid.coordinate_mesh();
    let total = triggers.len();
    info!(
        triggers = total,
        alpha_degrees = config.alpha_degrees(),
        cells = grid.width() * grid.height(),
        "Evaluating runout in parallel"
    );

    let mask = triggers
        .triggers()
        .par_iter()
        .enumerate()
        .map(|(index, trigger)| {
            let partial = trigger_mask(trigger, grid, &mesh, config.tan_squared());
            debug!(trigger = index + 1, total, "Trigger evaluated");
            partial
        })
        .reduce(
            || RunoutMask::new(grid.width(), grid.height()),
            |mut acc, partial| {
                acc.or_assign(&partial);
                acc
            },
        );

    outcome(mask, grid, triggers)
}

/// Evaluate all triggers one at a time, in input order.
///
/// Produces the same mask as [`evaluate`]; kept as the single-threaded
/// baseline for reproducibility runs and benchmarks.
pub fn evaluate_sequential(
    grid: &TerrainGrid,
    triggers: &TriggerSet,
    config: &RunoutConfig,
) -> RunoutOutcome {
    let mesh = grid.coordinate_mesh();
    let total = triggers.len();
    let mut mask = RunoutMask::new(grid.width(), grid.height());

    for (index, trigger) in triggers.triggers().iter().enumerate() {
        info!(trigger = index + 1, total, "Evaluating trigger");
        let partial = trigger_mask(trigger, grid, &mesh, config.tan_squared());
        mask.or_assign(&partial);
    }

    outcome(mask, grid, triggers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GeoTransform;
    use crate::trigger::{IdentityProjection, TriggerGeometry, TriggerSet};
    use nalgebra::Point2;

    /// 1x2 grid with the given cell size; trigger cell at 1000 m, the other
    /// cell at 0 m. Cell centers sit one cell size apart.
    fn two_cell_grid(cell_size: f64) -> TerrainGrid {
        let transform = GeoTransform::from_origin(0.0, cell_size, cell_size, -cell_size);
        TerrainGrid::new(2, 1, vec![1000.0, 0.0], None, transform, "local").unwrap()
    }

    fn single_trigger_at_first_cell(grid: &TerrainGrid) -> TriggerSet {
        let (x, y) = grid.transform().cell_center(0, 0);
        TriggerSet::from_geometries(
            &[TriggerGeometry::Point(Point2::new(x, y))],
            &IdentityProjection::new("local"),
            grid,
        )
    }

    #[test]
    fn test_angle_validation() {
        assert!(RunoutConfig::new(19.0).is_ok());
        assert!(RunoutConfig::new(0.1).is_ok());
        assert!(RunoutConfig::new(89.9).is_ok());
        assert_eq!(
            RunoutConfig::new(0.0),
            Err(RunoutError::InvalidAngle { degrees: 0.0 })
        );
        assert_eq!(
            RunoutConfig::new(90.0),
            Err(RunoutError::InvalidAngle { degrees: 90.0 })
        );
        assert_eq!(
            RunoutConfig::new(-5.0),
            Err(RunoutError::InvalidAngle { degrees: -5.0 })
        );
        assert!(RunoutConfig::new(f64::NAN).is_err());
    }

    #[test]
    fn test_default_config_is_19_degrees() {
        let config = RunoutConfig::default();
        assert_eq!(config.alpha_degrees(), 19.0);
        // tan(19 deg)^2
        assert!((config.tan_squared() - 0.1186).abs() < 1e-3);
    }

    #[test]
    fn test_steep_drop_is_reachable() {
        // 1000 m drop over 100 m distance: ratio 100 >> tan^2(19 deg)
        let grid = two_cell_grid(100.0);
        let triggers = single_trigger_at_first_cell(&grid);
        let config = RunoutConfig::default();

        let result = evaluate(&grid, &triggers, &config);
        assert!(result.mask.is_set(0, 1));
        assert_eq!(result.triggers_evaluated, 1);
        assert_eq!(result.triggers_skipped, 0);
    }

    #[test]
    fn test_shallow_drop_is_not_reachable() {
        // 1000 m drop over 10 000 m distance: ratio 0.01 < tan^2(19 deg)
        let grid = two_cell_grid(10000.0);
        let triggers = single_trigger_at_first_cell(&grid);
        let config = RunoutConfig::default();

        let result = evaluate(&grid, &triggers, &config);
        assert!(!result.mask.is_set(0, 1));
    }

    #[test]
    fn test_trigger_cell_is_reachable_by_definition() {
        let grid = two_cell_grid(10000.0);
        let triggers = single_trigger_at_first_cell(&grid);
        let config = RunoutConfig::default();

        // Trigger coincides exactly with its cell center; zero distance must
        // be deterministic, never NaN
        let result = evaluate(&grid, &triggers, &config);
        assert!(result.mask.is_set(0, 0));
        assert_eq!(result.mask.count_set(), 1);
    }

    #[test]
    fn test_gap_trigger_contributes_nothing() {
        let grid = two_cell_grid(100.0);
        let triggers = TriggerSet::from_geometries(
            &[TriggerGeometry::Point(Point2::new(-1e6, -1e6))],
            &IdentityProjection::new("local"),
            &grid,
        );
        let config = RunoutConfig::default();

        let result = evaluate(&grid, &triggers, &config);
        assert_eq!(result.mask.count_set(), 0);
        assert_eq!(result.triggers_evaluated, 0);
        assert_eq!(result.triggers_skipped, 1);
    }

    #[test]
    fn test_nodata_cells_never_marked() {
        let transform = GeoTransform::from_origin(0.0, 100.0, 100.0, -100.0);
        let grid = TerrainGrid::new(
            3,
            1,
            vec![1000.0, -9999.0, 0.0],
            Some(-9999.0),
            transform,
            "local",
        )
        .unwrap();
        let triggers = single_trigger_at_first_cell(&grid);
        let config = RunoutConfig::default();

        let result = evaluate(&grid, &triggers, &config);
        // Steep drop would mark both neighbors, but the no-data cell stays out
        assert!(result.mask.is_set(0, 0));
        assert!(!result.mask.is_set(0, 1));
        assert!(result.mask.is_set(0, 2));
    }

    #[test]
    fn test_outcome_carries_grid_geometry() {
        let grid = two_cell_grid(100.0);
        let triggers = single_trigger_at_first_cell(&grid);
        let result = evaluate(&grid, &triggers, &RunoutConfig::default());

        assert_eq!(result.transform, *grid.transform());
        assert_eq!(result.crs, "local");
    }
}
