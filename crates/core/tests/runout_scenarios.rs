//! Scenario tests for runout evaluation: accumulation semantics, threshold
//! behavior and the documented edge-case policies, exercised through the
//! public API only.

use nalgebra::Point2;
use runout_core::{
    evaluate, evaluate_sequential, GeoTransform, IdentityProjection, RunoutConfig, RunoutMask,
    TerrainGrid, TriggerGeometry, TriggerSet,
};

fn triggers_at(grid: &TerrainGrid, points: &[(f64, f64)]) -> TriggerSet {
    let geometries: Vec<TriggerGeometry> = points
        .iter()
        .map(|&(x, y)| TriggerGeometry::Point(Point2::new(x, y)))
        .collect();
    TriggerSet::from_geometries(&geometries, &IdentityProjection::new("local"), grid)
}

/// Every cell set in `a` is also set in `b`.
fn is_subset(a: &RunoutMask, b: &RunoutMask) -> bool {
    a.as_slice()
        .iter()
        .zip(b.as_slice())
        .all(|(&in_a, &in_b)| !in_a || in_b)
}

/// One row of cells at `cell_size` spacing with the given elevations.
fn row_grid(cell_size: f64, elevations: Vec<f64>) -> TerrainGrid {
    let width = elevations.len();
    let transform = GeoTransform::from_origin(0.0, cell_size, cell_size, -cell_size);
    TerrainGrid::new(width, 1, elevations, None, transform, "local").unwrap()
}

#[test]
fn test_flat_terrain_yields_empty_mask() {
    // No elevation drop anywhere, so 0 / d^2 never exceeds tan^2(19 deg).
    // Triggers sit off cell centers so the zero-distance policy is not in
    // play.
    let grid = TerrainGrid::flat(30, 30, 10.0, 2500.0);
    let triggers = triggers_at(&grid, &[(33.3, 47.1), (151.2, 260.9), (287.4, 12.6)]);
    let config = RunoutConfig::default();

    let result = evaluate(&grid, &triggers, &config);
    assert_eq!(result.mask.count_set(), 0);
    assert_eq!(result.triggers_evaluated, 3);
}

#[test]
fn test_steep_drop_reachable_shallow_drop_not() {
    // 1000 m of drop: reachable over 100 m of distance, not over 10 000 m
    let near = row_grid(100.0, vec![1000.0, 0.0]);
    let near_triggers = triggers_at(&near, &[near.transform().cell_center(0, 0)]);
    let result = evaluate(&near, &near_triggers, &RunoutConfig::default());
    assert!(result.mask.is_set(0, 1));

    let far = row_grid(10000.0, vec![1000.0, 0.0]);
    let far_triggers = triggers_at(&far, &[far.transform().cell_center(0, 0)]);
    let result = evaluate(&far, &far_triggers, &RunoutConfig::default());
    assert!(!result.mask.is_set(0, 1));
}

#[test]
fn test_disjoint_triggers_union_exactly() {
    // Two 100 m bumps on a flat row, far enough apart that their runout
    // zones cannot touch: 100 m of drop stops qualifying beyond ~290 m
    let mut elevations = vec![0.0; 20];
    elevations[4] = 100.0;
    elevations[15] = 100.0;
    let grid = row_grid(100.0, elevations);
    let config = RunoutConfig::default();

    let first = triggers_at(&grid, &[grid.transform().cell_center(0, 4)]);
    let second = triggers_at(&grid, &[grid.transform().cell_center(0, 15)]);
    let both = triggers_at(
        &grid,
        &[
            grid.transform().cell_center(0, 4),
            grid.transform().cell_center(0, 15),
        ],
    );

    let mask_first = evaluate(&grid, &first, &config).mask;
    let mask_second = evaluate(&grid, &second, &config).mask;
    let mask_both = evaluate(&grid, &both, &config).mask;

    // Individually disjoint
    assert!(mask_first
        .as_slice()
        .iter()
        .zip(mask_second.as_slice())
        .all(|(&a, &b)| !(a && b)));

    // Combined mask is exactly the union
    let mut union = mask_first.clone();
    union.merge(&mask_second).unwrap();
    assert_eq!(mask_both, union);
    assert_eq!(
        mask_both.count_set(),
        mask_first.count_set() + mask_second.count_set()
    );
}

#[test]
fn test_monotonic_union_over_trigger_subsets() {
    let grid = TerrainGrid::single_peak(40, 40, 25.0, 1000.0, 800.0, 150.0);
    let config = RunoutConfig::default();

    let subset = triggers_at(&grid, &[(500.0, 500.0), (430.0, 570.0)]);
    let superset = triggers_at(
        &grid,
        &[(500.0, 500.0), (430.0, 570.0), (620.0, 380.0), (700.0, 700.0)],
    );

    let mask_subset = evaluate(&grid, &subset, &config).mask;
    let mask_superset = evaluate(&grid, &superset, &config).mask;

    assert!(is_subset(&mask_subset, &mask_superset));
    assert!(mask_superset.count_set() >= mask_subset.count_set());
}

#[test]
fn test_order_independence_and_parallel_merge() {
    let grid = TerrainGrid::single_peak(40, 40, 25.0, 1000.0, 800.0, 150.0);
    let config = RunoutConfig::default();

    let points = [
        (500.0, 500.0),
        (430.0, 570.0),
        (620.0, 380.0),
        (150.0, 850.0),
        (850.0, 150.0),
    ];
    let forward = triggers_at(&grid, &points);
    let mut reversed_points = points;
    reversed_points.reverse();
    let reversed = triggers_at(&grid, &reversed_points);

    let parallel_forward = evaluate(&grid, &forward, &config).mask;
    let parallel_reversed = evaluate(&grid, &reversed, &config).mask;
    let sequential_forward = evaluate_sequential(&grid, &forward, &config).mask;
    let sequential_reversed = evaluate_sequential(&grid, &reversed, &config).mask;

    assert_eq!(parallel_forward, parallel_reversed);
    assert_eq!(parallel_forward, sequential_forward);
    assert_eq!(parallel_forward, sequential_reversed);
}

#[test]
fn test_uphill_cells_never_marked() {
    // Elevation climbs steeply to the east; everything east of the trigger
    // is higher and must stay unmarked no matter how close
    let elevations: Vec<f64> = (0..20).map(|col| f64::from(col) * 50.0).collect();
    let grid = row_grid(10.0, elevations);
    let trigger_cell = 10;
    let triggers = triggers_at(&grid, &[grid.transform().cell_center(0, trigger_cell)]);

    let result = evaluate(&grid, &triggers, &RunoutConfig::default());

    for col in (trigger_cell + 1)..20 {
        assert!(
            !result.mask.is_set(0, col),
            "uphill cell {col} must not be reachable"
        );
    }
    // The slope itself is far steeper than 19 deg, so downhill neighbors are
    // reachable
    assert!(result.mask.is_set(0, trigger_cell - 1));
    assert!(result.mask.is_set(0, 0));
}

#[test]
fn test_threshold_monotonicity() {
    let grid = TerrainGrid::single_peak(40, 40, 25.0, 1000.0, 800.0, 150.0);
    let triggers = triggers_at(&grid, &[(500.0, 500.0)]);

    let shallow = evaluate(&grid, &triggers, &RunoutConfig::new(10.0).unwrap()).mask;
    let default = evaluate(&grid, &triggers, &RunoutConfig::default()).mask;
    let steep = evaluate(&grid, &triggers, &RunoutConfig::new(45.0).unwrap()).mask;

    assert!(is_subset(&steep, &default));
    assert!(is_subset(&default, &shallow));
    assert!(shallow.count_set() >= default.count_set());
    assert!(default.count_set() >= steep.count_set());
}

#[test]
fn test_self_location_policy_is_deterministic() {
    let grid = TerrainGrid::single_peak(21, 21, 10.0, 1000.0, 500.0, 50.0);
    // Exactly on the center cell's center
    let center = grid.transform().cell_center(10, 10);
    let triggers = triggers_at(&grid, &[center]);
    let config = RunoutConfig::default();

    let first = evaluate(&grid, &triggers, &config);
    assert!(first.mask.is_set(10, 10));

    // Same answer on every run and on both execution paths
    for _ in 0..5 {
        let repeat = evaluate(&grid, &triggers, &config);
        assert_eq!(repeat.mask, first.mask);
    }
    let sequential = evaluate_sequential(&grid, &triggers, &config);
    assert_eq!(sequential.mask, first.mask);
}

#[test]
fn test_sampling_gaps_contribute_nothing() {
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
    let config = RunoutConfig::default();

    let good = grid.transform().cell_center(0, 0);
    let on_nodata = grid.transform().cell_center(0, 1);
    let outside = (-5000.0, -5000.0);

    let clean = evaluate(&grid, &triggers_at(&grid, &[good]), &config);
    let with_gaps = evaluate(
        &grid,
        &triggers_at(&grid, &[good, on_nodata, outside]),
        &config,
    );

    // The bad triggers are skipped, not fatal, and add nothing to the mask
    assert_eq!(with_gaps.mask, clean.mask);
    assert_eq!(with_gaps.triggers_evaluated, 1);
    assert_eq!(with_gaps.triggers_skipped, 2);
}

#[test]
fn test_path_waypoints_accumulate_like_points() {
    let grid = TerrainGrid::single_peak(40, 40, 25.0, 1000.0, 800.0, 150.0);
    let config = RunoutConfig::default();

    let points = [(430.0, 570.0), (500.0, 500.0), (570.0, 430.0)];
    let as_points = triggers_at(&grid, &points);

    let as_path = TriggerSet::from_geometries(
        &[TriggerGeometry::Path(
            points.iter().map(|&(x, y)| Point2::new(x, y)).collect(),
        )],
        &IdentityProjection::new("local"),
        &grid,
    );

    let mask_points = evaluate(&grid, &as_points, &config).mask;
    let mask_path = evaluate(&grid, &as_path, &config).mask;
    assert_eq!(mask_points, mask_path);
}
