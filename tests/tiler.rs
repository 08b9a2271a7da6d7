//! Integration tests for window generation over rasters

use geoslicer::coordinate::{GeoTransform, SpatialReference};
use geoslicer::raster::{MemoryRaster, RasterSource};
use geoslicer::{RasterTiler, ScanParameters, Window};

fn all_windows(params: ScanParameters, width: u32, height: u32) -> Vec<Window> {
    RasterTiler::new(params, width, height).unwrap().map(|step| step.window).collect()
}

/// Number of windows covering each pixel, row-major
fn coverage(windows: &[Window], width: u32, height: u32) -> Vec<u32> {
    let mut counts = vec![0u32; (width * height) as usize];
    for window in windows {
        for y in window.y..window.end_y() {
            for x in window.x..window.end_x() {
                counts[(y * width + x) as usize] += 1;
            }
        }
    }
    counts
}

#[test]
fn test_windows_stay_inside_raster() {
    for (width, height) in [(1, 1), (499, 501), (1000, 1000), (1234, 77), (3, 2000)] {
        for (slice, overlap) in [(500, 50), (100, 0), (64, 63), (7, 3)] {
            for window in all_windows(ScanParameters::new(slice, overlap), width, height) {
                assert!(!window.is_empty());
                assert!(window.end_x() <= width && window.end_y() <= height,
                        "{:?} outside {}x{} for slice {} overlap {}", window, width, height, slice, overlap);
            }
        }
    }
}

#[test]
fn test_overlap_covered_twice_core_once() {
    let (slice, overlap, width) = (100, 20, 430);
    let windows = all_windows(ScanParameters::new(slice, overlap), width, 1);
    let counts = coverage(&windows, width, 1);

    for x in 0..width {
        let near_boundary = (1..=width / slice)
            .map(|k| k * slice)
            .filter(|boundary| *boundary < width)
            .any(|boundary| x + overlap >= boundary && x < boundary + overlap);
        let expected = if near_boundary { 2 } else { 1 };
        assert_eq!(counts[x as usize], expected, "pixel {}", x);
    }
}

#[test]
fn test_every_pixel_covered_in_2d() {
    let (width, height) = (733, 512);
    let windows = all_windows(ScanParameters::new(200, 30), width, height);
    assert_eq!(windows.len(), 4 * 3);
    assert!(coverage(&windows, width, height).iter().all(|count| (1..=4).contains(count)));
}

#[test]
fn test_row_partitions_reproduce_full_scan() {
    let params = ScanParameters::new(128, 16);
    let full = all_windows(params, 700, 700);

    let mut partitioned = Vec::new();
    for row in 0..6 {
        partitioned.extend(all_windows(params.with_range(0, row, None, Some(1)), 700, 700));
    }
    assert_eq!(partitioned, full);

    let mut blocks = Vec::new();
    for (column, columns) in [(0, 2), (2, 4)] {
        blocks.extend(all_windows(params.with_range(column, 0, Some(columns), None), 700, 700));
    }
    blocks.sort_by_key(|w| (w.y, w.x));
    assert_eq!(blocks, full);
}

#[test]
fn test_run_reads_exactly_each_window() {
    let raster = MemoryRaster::from_fn(
        120, 90, 2,
        GeoTransform::north_up(0.0, 90.0, 1.0, -1.0),
        SpatialReference::Unknown,
        |band, x, y| (band as u32 * 1000 + y * 120 + x) as f32,
    ).unwrap();

    let mut tiler = RasterTiler::for_source(ScanParameters::new(50, 10), &raster).unwrap();
    let mut seen = Vec::new();
    let driven = tiler.run(&raster, |data, step| {
        assert_eq!(*data.window(), step.window);
        let (x, y) = (step.window.x, step.window.y);
        assert_eq!(data.value(0, 0, 0), Some((y * 120 + x) as f32));
        assert_eq!(data.value(1, data.width() - 1, data.height() - 1),
                   Some((1000 + (step.window.end_y() - 1) * 120 + step.window.end_x() - 1) as f32));
        seen.push((step.column, step.row));
        Ok(())
    }).unwrap();

    assert_eq!(driven, 6);
    assert_eq!(seen, vec![(0, 0), (1, 0), (2, 0), (0, 1), (1, 1), (2, 1)]);
    assert!(tiler.is_finished());
    assert_eq!(raster.info().width, 120);
}

#[test]
fn test_callback_error_stops_and_allows_resume() {
    let raster = MemoryRaster::from_fn(
        100, 100, 1, GeoTransform::default(), SpatialReference::Unknown, |_, _, _| 0.0,
    ).unwrap();

    let mut tiler = RasterTiler::for_source(ScanParameters::new(50, 5), &raster).unwrap();
    let result = tiler.run(&raster, |_, step| {
        if step.row == 1 {
            Err(geoslicer::SlicerError::GenericError("stop".to_string()))
        } else {
            Ok(())
        }
    });

    assert!(result.is_err());
    assert_eq!(tiler.steps(), 3);
    assert_eq!(tiler.resume_position(), Some((1, 1)));
    assert_eq!(tiler.next_step().map(|step| (step.column, step.row)), Some((1, 1)));
}
