//! End-to-end gridding scenarios: XYZ points in, GeoTIFF grid out.

use std::io::Write;

use approx::assert_relative_eq;
use tinspline_algorithms::interpolation::{
    points_from_features, tps_tin_interpolation, tps_tin_interpolation_with_progress,
    NeighborhoodLevel, SamplePoint, TpsTinOutput, TpsTinParams,
};
use tinspline_core::io::{read_geotiff, read_xyz, write_geotiff};
use tinspline_core::{Error, GridDefinition, Raster};

fn params(grid: GridDefinition) -> TpsTinParams {
    TpsTinParams {
        grid,
        ..TpsTinParams::default()
    }
}

/// Grid lies inside the data hull; no frame needed
fn interior(grid: GridDefinition) -> TpsTinParams {
    TpsTinParams {
        add_frame: false,
        ..params(grid)
    }
}

/// Smooth test surface sampled on a jittered lattice
fn terrain_points() -> Vec<SamplePoint> {
    let mut points = Vec::new();
    for i in 0..12 {
        for j in 0..12 {
            let x = i as f64 * 20.0 + ((i * 13 + j * 7) % 9) as f64;
            let y = j as f64 * 20.0 + ((i * 5 + j * 11) % 9) as f64;
            points.push(SamplePoint::new(x, y, surface(x, y)));
        }
    }
    points
}

fn surface(x: f64, y: f64) -> f64 {
    100.0 + 0.2 * x - 0.1 * y + 5.0 * (x / 40.0).sin() * (y / 50.0).cos()
}

#[test]
fn saddle_on_unit_square() {
    let points = vec![
        SamplePoint::new(0.0, 0.0, 0.0),
        SamplePoint::new(1.0, 0.0, 0.0),
        SamplePoint::new(0.0, 1.0, 0.0),
        SamplePoint::new(1.0, 1.0, 1.0),
    ];
    let grid = GridDefinition::from_extent(0.0, 0.0, 1.0, 1.0, 0.1).unwrap();
    let raster = tps_tin_interpolation(&points, &params(grid)).unwrap();

    let (col, row) = raster.geo_to_pixel(0.5, 0.5);
    assert_relative_eq!(
        raster.get(row.floor() as usize, col.floor() as usize).unwrap(),
        0.25,
        epsilon = 1e-6
    );
}

#[test]
fn smooth_surface_is_recovered() {
    let points = terrain_points();
    let grid = GridDefinition::from_extent(20.0, 20.0, 200.0, 200.0, 4.0).unwrap();
    let raster = tps_tin_interpolation(&points, &interior(grid)).unwrap();

    let mut max_err: f64 = 0.0;
    for row in 0..grid.rows {
        for col in 0..grid.cols {
            let (x, y) = grid.cell_center(col, row);
            let v = raster.get(row, col).unwrap();
            assert!(v.is_finite(), "cell ({}, {}) not written", row, col);
            max_err = max_err.max((v - surface(x, y)).abs());
        }
    }
    assert!(max_err < 0.5, "max error {:.4} too large", max_err);
}

/// Grid the terrain lattice after mapping every coordinate to `offset + k * coord`
fn georeferenced_run(k: f64, offset: (f64, f64), add_frame: bool) -> TpsTinOutput {
    let (ox, oy) = offset;
    let points: Vec<SamplePoint> = terrain_points()
        .iter()
        .map(|p| SamplePoint::new(ox + k * p.x, oy + k * p.y, p.value))
        .collect();
    let grid =
        GridDefinition::from_extent(ox + 20.0 * k, oy + 20.0 * k, ox + 200.0 * k, oy + 200.0 * k, 4.0 * k).unwrap();
    tps_tin_interpolation_with_progress(&points, &TpsTinParams { add_frame, ..params(grid) }, |_, _| {}).unwrap()
}

fn assert_matches_local_run(k: f64, offset: (f64, f64), add_frame: bool) {
    let local = georeferenced_run(1.0, (0.0, 0.0), add_frame);
    let shifted = georeferenced_run(k, offset, add_frame);

    assert_eq!(shifted.raster.shape(), local.raster.shape());
    assert_eq!(shifted.report.skipped_singular, 0);
    assert_eq!(shifted.report.triangles, local.report.triangles);
    assert_eq!(shifted.report.fitted, local.report.fitted);
    assert_eq!(shifted.report.outside_grid, local.report.outside_grid);

    let mut max_diff: f64 = 0.0;
    let mut sum_diff = 0.0;
    let mut same = 0usize;
    for (a, b) in local.raster.data().iter().zip(shifted.raster.data().iter()) {
        assert!(b.is_finite(), "cell left empty");
        let d = (a - b).abs();
        max_diff = max_diff.max(d);
        sum_diff += d;
        if d < 1e-5 {
            same += 1;
        }
    }
    assert!(same * 100 >= local.raster.len() * 95, "only {} cells agree", same);
    let mean_diff = sum_diff / local.raster.len() as f64;
    // Cells on a shared edge may be written by either neighbour
    assert!(max_diff < 1.0, "max difference {:.6}", max_diff);
    assert!(mean_diff < 1e-2, "mean difference {:.6}", mean_diff);
}

#[test]
fn projected_coordinates_match_local_run() {
    assert_matches_local_run(1.0, (500_000.0, 4_000_000.0), false);
    assert_matches_local_run(1.0, (500_000.0, 4_000_000.0), true);
}

#[test]
fn geographic_coordinates_match_local_run() {
    assert_matches_local_run(1e-5, (-70.65, -33.45), false);
    assert_matches_local_run(1e-5, (-70.65, -33.45), true);
}

#[test]
fn projected_grid_survives_geotiff_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("utm.tif");

    let out = georeferenced_run(1.0, (500_000.0, 4_000_000.0), true);
    write_geotiff(&out.raster, &path, None).unwrap();
    let back: Raster<f64> = read_geotiff(&path).unwrap();

    assert_relative_eq!(back.transform().origin_x, out.raster.transform().origin_x, epsilon = 1e-6);
    assert_relative_eq!(back.transform().origin_y, out.raster.transform().origin_y, epsilon = 1e-6);
    let (col, row) = back.geo_to_pixel(500_100.0, 4_000_100.0);
    assert_eq!((col.floor() as usize, row.floor() as usize), (20, 25));
}

#[test]
fn neighborhood_levels_agree_on_smooth_data() {
    let points = terrain_points();
    let grid = GridDefinition::from_extent(40.0, 40.0, 180.0, 180.0, 5.0).unwrap();

    let rasters: Vec<Raster<f64>> = [
        NeighborhoodLevel::Immediate,
        NeighborhoodLevel::Level1,
        NeighborhoodLevel::Level2,
    ]
    .into_iter()
    .map(|level| tps_tin_interpolation(&points, &TpsTinParams { level, ..interior(grid) }).unwrap())
    .collect();

    for pair in rasters.windows(2) {
        for (a, b) in pair[0].data().iter().zip(pair[1].data().iter()) {
            assert!((a - b).abs() < 1.0);
        }
    }
}

#[test]
fn xyz_to_geotiff() {
    let dir = tempfile::tempdir().unwrap();
    let xyz_path = dir.path().join("points.xyz");
    let tif_path = dir.path().join("grid.tif");

    {
        let mut file = std::fs::File::create(&xyz_path).unwrap();
        writeln!(file, "X\tY\tELEV").unwrap();
        for p in terrain_points() {
            writeln!(file, "{}\t{}\t{}", p.x, p.y, p.value).unwrap();
        }
    }

    let features = read_xyz(&xyz_path).unwrap();
    let points = points_from_features(&features, "ELEV").unwrap();
    assert_eq!(points.len(), 144);

    let grid = GridDefinition::from_extent(0.0, 0.0, 240.0, 240.0, 8.0).unwrap();
    let out = tps_tin_interpolation_with_progress(&points, &params(grid), |_, _| {}).unwrap();
    assert_eq!(out.report.skipped_singular, 0);
    write_geotiff(&out.raster, &tif_path, None).unwrap();

    let back: Raster<f64> = read_geotiff(&tif_path).unwrap();
    assert_eq!(back.shape(), (grid.rows, grid.cols));
    assert_relative_eq!(back.transform().origin_x, grid.transform.origin_x, epsilon = 1e-9);
    assert_relative_eq!(back.transform().origin_y, grid.transform.origin_y, epsilon = 1e-9);

    let (row, col) = (grid.rows / 2, grid.cols / 2);
    assert_relative_eq!(
        back.get(row, col).unwrap(),
        out.raster.get(row, col).unwrap(),
        epsilon = 1e-3
    );
}

#[test]
fn collinear_input_is_rejected() {
    let points: Vec<SamplePoint> = (0..10).map(|i| SamplePoint::new(i as f64, 2.0 * i as f64, 1.0)).collect();
    let grid = GridDefinition::from_extent(0.0, 0.0, 10.0, 20.0, 1.0).unwrap();
    let result = tps_tin_interpolation(&points, &interior(grid));
    assert!(matches!(result, Err(Error::Triangulation(_))));
}
