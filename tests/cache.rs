//! Integration tests for the tile ring cache

use std::cell::Cell;
use std::path::Path;

use geoslicer::cache::{AuxMetadata, RasterWindow, TileEncoder};
use geoslicer::raster::WindowData;
use geoslicer::{GeoTransform, SlicerError, SlicerResult, SpatialReference, TileCache, Window};

fn window_data(width: u32, height: u32) -> WindowData {
    let pixels = (width * height) as usize;
    let bands = (0..3).map(|band| (0..pixels).map(|i| ((i + band * 50) % 256) as f32).collect()).collect();
    WindowData::new(Window::new(0, 0, width, height), bands).unwrap()
}

/// Encoder that fails every tile after the first `succeed` ones
struct FlakyEncoder {
    succeed: u32,
    calls: Cell<u32>,
}

impl TileEncoder for FlakyEncoder {
    fn encode(&self, _tile: &RasterWindow<'_>, path: &Path) -> SlicerResult<()> {
        self.calls.set(self.calls.get() + 1);
        if self.calls.get() > self.succeed {
            return Err(SlicerError::EncodeError(format!("refusing {}", path.display())));
        }
        std::fs::write(path, b"tile")?;
        Ok(())
    }

    fn extension(&self) -> &'static str {
        "raw"
    }
}

#[test]
fn test_capacity_plus_one_recycles_first_slot() {
    let dir = tempfile::tempdir().unwrap();
    let data = window_data(8, 8);
    let srs = SpatialReference::Epsg(32633);
    let tile = RasterWindow::new(&data, GeoTransform::north_up(10.0, 20.0, 0.5, -0.5), &srs);

    let mut cache = TileCache::with_encoder(3, Some(dir.path()), geoslicer::cache::PngTileEncoder).unwrap();
    let handles: Vec<_> = (0..4).map(|_| cache.materialize(&tile, None).unwrap()).collect();

    assert_eq!(cache.materialized(), 4);
    assert!(matches!(handles[0].path(), Err(SlicerError::InvalidatedHandle(_))));
    assert!(matches!(handles[0].aux_path(), Err(SlicerError::InvalidatedHandle(_))));
    for handle in &handles[1..] {
        assert!(handle.is_valid());
        assert!(handle.path().unwrap().exists());
    }

    assert_eq!(handles[3].slot(), Some(0));
    assert_eq!(handles[3].path().unwrap(), cache.slot_path(0));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 6);
}

#[test]
fn test_slot_tiles_decode_and_carry_metadata() {
    let data = window_data(12, 5);
    let srs = SpatialReference::Epsg(3857);
    let gt = GeoTransform::north_up(1234.5, 6789.0, 2.0, -2.0);

    let mut cache = TileCache::new(2).unwrap();
    let handle = cache.materialize(&RasterWindow::new(&data, gt, &srs), None).unwrap();

    let image = image::open(handle.path().unwrap()).unwrap().to_rgb8();
    assert_eq!(image.dimensions(), (12, 5));
    assert_eq!(image.get_pixel(1, 0).0, [1, 51, 101]);

    let xml = std::fs::read_to_string(handle.aux_path().unwrap()).unwrap();
    assert!(xml.contains("<PAMDataset>"));
    assert!(xml.contains("<SRS>EPSG:3857</SRS>"));

    let metadata = AuxMetadata::read(handle.path().unwrap()).unwrap();
    assert_eq!(metadata, AuxMetadata::new(srs.clone(), gt));
}

#[test]
fn test_explicit_path_outlives_cache() {
    let out = tempfile::tempdir().unwrap();
    let target = out.path().join("keep.png");
    let data = window_data(4, 4);
    let srs = SpatialReference::Unknown;
    let tile = RasterWindow::new(&data, GeoTransform::default(), &srs);

    let explicit = {
        let mut cache = TileCache::new(1).unwrap();
        let explicit = cache.materialize(&tile, Some(&target)).unwrap();
        for _ in 0..3 {
            cache.materialize(&tile, None).unwrap();
        }
        assert!(explicit.is_valid());
        explicit
    };

    assert!(explicit.is_valid());
    assert_eq!(explicit.slot(), None);
    assert!(target.exists());
    assert!(AuxMetadata::sidecar_path(&target).exists());

    let aux = AuxMetadata::read(&target).unwrap();
    assert_eq!(aux.spatial_ref, SpatialReference::Unknown);

    explicit.remove().unwrap();
    assert!(!target.exists());
    assert!(!AuxMetadata::sidecar_path(&target).exists());
}

#[test]
fn test_drop_removes_slot_files() {
    let data = window_data(4, 4);
    let srs = SpatialReference::Epsg(4326);
    let tile = RasterWindow::new(&data, GeoTransform::default(), &srs);

    let owned_dir;
    let handle;
    {
        let mut cache = TileCache::new(2).unwrap();
        handle = cache.materialize(&tile, None).unwrap();
        owned_dir = cache.directory().to_path_buf();
        assert!(owned_dir.exists());
    }
    assert!(!handle.is_valid());
    assert!(!owned_dir.exists());

    let shared = tempfile::tempdir().unwrap();
    {
        let mut cache = TileCache::with_encoder(2, Some(shared.path()), geoslicer::cache::PngTileEncoder).unwrap();
        cache.materialize(&tile, None).unwrap();
        std::fs::write(shared.path().join("unrelated.txt"), "stays").unwrap();
    }
    let left: Vec<_> = std::fs::read_dir(shared.path()).unwrap()
        .map(|entry| entry.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(left, vec!["unrelated.txt".to_string()]);
}

#[test]
fn test_encode_failure_is_reported_and_cache_continues() {
    let dir = tempfile::tempdir().unwrap();
    let data = window_data(2, 2);
    let srs = SpatialReference::Unknown;
    let tile = RasterWindow::new(&data, GeoTransform::default(), &srs);

    let encoder = FlakyEncoder { succeed: 1, calls: Cell::new(0) };
    let mut cache = TileCache::with_encoder(2, Some(dir.path()), encoder).unwrap();

    let first = cache.materialize(&tile, None).unwrap();
    assert_eq!(first.path().unwrap().extension().unwrap(), "raw");
    assert!(matches!(cache.materialize(&tile, None), Err(SlicerError::EncodeError(_))));
    assert_eq!(cache.materialized(), 1);
    assert!(first.is_valid());
}

#[test]
fn test_zero_capacity_rejected() {
    assert!(matches!(TileCache::new(0), Err(SlicerError::InvalidParameters(_))));
}
