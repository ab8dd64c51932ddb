//! Edge case tests for `Triangulation`.
//!
//! These tests cover:
//! - Inputs with fewer than three points
//! - Non-finite coordinates
//! - Collinear and nearly collinear inputs
//! - Legalization modes and per-step validation
//! - Input-order mapping and serialization

use approx::assert_relative_eq;
use sweep_delaunay::core::algorithms::incremental_insertion::{HullSweep, sweep};
use sweep_delaunay::core::util::{find_delaunay_violations, validate_neighbors};
use sweep_delaunay::geometry::point_buffer::PointBufferError;
use sweep_delaunay::prelude::*;

// =========================================================================
// Small inputs
// =========================================================================

#[test]
fn test_fewer_than_three_points_yield_no_triangles() {
    for n in 0..3_u32 {
        let points: Vec<[f64; 2]> = (0..n).map(|k| [f64::from(k), 0.0]).collect();
        let dt = triangulate(&points).unwrap();
        assert_eq!(dt.number_of_triangles(), 0);
        assert!(dt.triangles().is_empty());
        assert!(dt.neighbors().is_empty());
        assert_eq!(dt.statistics().points, points.len());
    }
}

#[test]
fn test_three_points_in_either_winding() {
    for points in [
        [[0.0, 0.0], [1.0, 1.0], [2.0, 0.0]],
        [[0.0, 0.0], [1.0, -1.0], [2.0, 0.0]],
    ] {
        let dt = Triangulation::new_with_config(&points, &SweepConfig::exact()).unwrap();
        assert_eq!(dt.number_of_triangles(), 1);
        let [a, b, c] = dt.triangle(0).unwrap().map(|v| dt.points().point(v));
        assert!(orientation(a, b, c) > 0.0, "triangle must be counter-clockwise");
    }
}

// =========================================================================
// Invalid input
// =========================================================================

#[test]
fn test_non_finite_coordinates_are_rejected() {
    for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        let err = triangulate(&[[0.0, 0.0], [1.0, 0.0], [bad, 1.0]]).unwrap_err();
        match err {
            SweepError::InvalidInput(PointBufferError::NonFinite { index, .. }) => {
                assert_eq!(index, 2);
            }
            other => panic!("unexpected error {other}"),
        }
    }
}

#[test]
fn test_unsorted_packed_buffer_is_rejected() {
    assert!(PointBuffer::from_packed(vec![1.0, 0.0, 0.0, 0.0, 2.0, 0.0]).is_err());
}

// =========================================================================
// Degenerate configurations
// =========================================================================

#[test]
fn test_collinear_points_with_jitter() {
    let points: Vec<[f64; 2]> = (0..25_u32).map(|k| [f64::from(k), 0.0]).collect();
    let dt = Triangulation::new_with_config(&points, &SweepConfig::seeded(17)).unwrap();
    assert!(dt.is_valid().is_ok());
    assert!(dt.validate_delaunay().is_ok());
    assert_eq!(dt.number_of_triangles(), 2 * 25 - 2 - dt.hull().len());
}

#[test]
fn test_collinear_points_without_jitter_fail() {
    let points = [[0.0, 0.0], [1.0, 0.0], [2.0, 0.0], [3.0, 0.0]];
    let err = Triangulation::new_with_config(&points, &SweepConfig::exact()).unwrap_err();
    assert_eq!(err, SweepError::InvisiblePoint { point: 3 });
}

#[test]
fn test_collinear_point_on_hull_edge_is_not_visible() {
    // Point 3 continues the edge 0 -> 2 exactly; it is still attached through
    // the other edge it sees.
    let points = [[0.0, 0.0], [1.0, 1.0], [1.0, -1.0], [2.0, -2.0]];
    let dt = Triangulation::new_with_config(&points, &SweepConfig::exact()).unwrap();
    assert!(dt.is_valid().is_ok());
    assert_eq!(dt.number_of_triangles(), 2);
    assert_eq!(dt.hull().len(), 4);
}

#[test]
fn test_shared_x_coordinates() {
    // Columns of points that share x before jitter.
    let mut points = Vec::new();
    for i in 0..6_u32 {
        for j in 0..5_u32 {
            points.push([f64::from(i), f64::from(j) * 0.7 + f64::from(i) * 0.01]);
        }
    }
    let dt = Triangulation::new_with_config(&points, &SweepConfig::seeded(21)).unwrap();
    assert!(dt.is_valid().is_ok());
    assert!(dt.validate_delaunay().is_ok());
}

#[test]
fn test_large_coordinate_offset() {
    let points: Vec<[f64; 2]> = generate_random_points_seeded(80, (0.0, 1.0), 4)
        .unwrap()
        .into_iter()
        .map(|[x, y]| [x + 1.0e6, y - 1.0e6])
        .collect();
    let dt = Triangulation::new_with_config(&points, &SweepConfig::seeded(4)).unwrap();
    assert!(dt.is_valid().is_ok());
    assert!(dt.validate_delaunay().is_ok());
}

// =========================================================================
// Legalization modes
// =========================================================================

/// Triangles as sorted vertex triples, in sorted order.
fn normalized(triangles: &[usize]) -> Vec<[usize; 3]> {
    let mut tris: Vec<[usize; 3]> = triangles
        .chunks_exact(3)
        .map(|t| {
            let mut tri = [t[0], t[1], t[2]];
            tri.sort_unstable();
            tri
        })
        .collect();
    tris.sort_unstable();
    tris
}

#[test]
fn test_propagate_is_delaunay_where_single_check_may_not_be() {
    let points = generate_random_points_seeded(300, (-1.0, 1.0), 8).unwrap();
    let buffer = PointBuffer::prepare(&points, &SweepConfig::seeded(8)).unwrap();

    let full = sweep(&buffer, &SweepConfig::seeded(8)).unwrap();
    let single_config = SweepConfig {
        legalization: Legalization::SingleCheck,
        ..SweepConfig::seeded(8)
    };
    let single = sweep(&buffer, &single_config).unwrap();

    // Same point set, same hull, same triangle count.
    assert_eq!(full.triangles.len(), single.triangles.len());
    assert_eq!(full.hull, single.hull);
    assert_eq!(single.statistics.max_queue_len, 0);
    assert!(single.statistics.flips <= single.statistics.edges_checked);
    assert!(validate_neighbors(&single.triangles, &single.neighbors).is_ok());

    let full_violations = find_delaunay_violations(&full.triangles, &buffer);
    let single_violations = find_delaunay_violations(&single.triangles, &buffer);
    assert!(full_violations.is_empty(), "{full_violations:?}");

    // Random points are in general position, so the Delaunay triangulation
    // is unique: single-check output differs from it exactly when it leaves
    // illegal edges behind.
    let same_mesh = normalized(&full.triangles) == normalized(&single.triangles);
    assert_eq!(
        same_mesh,
        single_violations.is_empty(),
        "single-check left {} violations",
        single_violations.len()
    );
    println!(
        "single-check: {} flips, {} violations; propagate: {} flips",
        single.statistics.flips,
        single_violations.len(),
        full.statistics.flips
    );

    let full_dt = Triangulation::from_buffer(buffer, &SweepConfig::seeded(8)).unwrap();
    assert!(full_dt.validate_delaunay().is_ok());
    assert_eq!(full_dt.triangles(), full.triangles.as_slice());
}

#[test]
fn test_validate_steps_matches_plain_run() {
    let points = generate_random_points_seeded(120, (0.0, 10.0), 31).unwrap();
    let plain = Triangulation::new_with_config(&points, &SweepConfig::seeded(31)).unwrap();
    let checked_config = SweepConfigBuilder::default()
        .seed(31)
        .validate_steps(true)
        .build()
        .unwrap();
    let checked = Triangulation::new_with_config(&points, &checked_config).unwrap();
    assert_eq!(plain.triangles(), checked.triangles());
    assert_eq!(plain.statistics(), checked.statistics());
}

#[test]
fn test_step_by_step_sweep() {
    let buffer = PointBuffer::prepare(
        &generate_random_points_seeded(30, (0.0, 1.0), 12).unwrap(),
        &SweepConfig::seeded(12),
    )
    .unwrap();
    let mut hull_sweep = HullSweep::new(&buffer, &SweepConfig::seeded(12)).unwrap();
    for i in 3..buffer.len() {
        hull_sweep.insert(i).unwrap();
        hull_sweep.hull().validate().unwrap();
        hull_sweep.hull().validate_tags(hull_sweep.store()).unwrap();
        assert_eq!(hull_sweep.store().len(), 2 * (i + 1) - 2 - hull_sweep.hull().len());
    }
    let output = hull_sweep.finish().unwrap();
    assert_eq!(output.statistics.points, 30);
}

// =========================================================================
// Output mapping and serialization
// =========================================================================

#[test]
fn test_input_order_mapping_recovers_coordinates() {
    let points = generate_random_points_seeded(40, (-3.0, 3.0), 5).unwrap();
    let dt = Triangulation::new_with_config(&points, &SweepConfig::seeded(5)).unwrap();
    let mapped = dt.triangles_in_input_order();
    for (&sorted, &original) in dt.triangles().iter().zip(&mapped) {
        let jittered = dt.points().point(sorted);
        assert_relative_eq!(jittered[0], points[original][0], epsilon = 1e-5);
        assert_relative_eq!(jittered[1], points[original][1], epsilon = 1e-5);
        assert_eq!(dt.original_index(sorted), Some(original));
    }
}

#[test]
fn test_json_roundtrip() {
    let points = generate_random_points_seeded(25, (0.0, 1.0), 6).unwrap();
    let dt = Triangulation::new_with_config(&points, &SweepConfig::seeded(6)).unwrap();
    let json = serde_json::to_string(&dt).unwrap();
    let back: Triangulation = serde_json::from_str(&json).unwrap();
    assert_eq!(back.triangles(), dt.triangles());
    assert_eq!(back.neighbors(), dt.neighbors());
    assert_eq!(back.hull(), dt.hull());
    assert_eq!(back.original_indices(), dt.original_indices());
    assert_eq!(back.statistics(), dt.statistics());
    assert!(back.is_valid().is_ok());
}
