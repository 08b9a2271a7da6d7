//! Fixed-capacity ring of materialised tiles
//!
//! Batch runs touch thousands of windows, so tiles without an explicit
//! destination are written into a small fixed set of slot files that are
//! reused round-robin. Reusing a slot invalidates the handle that pointed
//! at it; the stale handle then refuses to hand out its path.

use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use log::{debug, warn};
use tempfile::TempDir;

use super::aux_metadata::AuxMetadata;
use super::encoder::{PngTileEncoder, RasterWindow, TileEncoder};
use crate::errors::{SlicerError, SlicerResult};

/// Default number of ring slots
pub const DEFAULT_CAPACITY: usize = 10;

/// Reference to a materialised tile and its metadata sidecar
///
/// Handles from the ring share a validity flag with their slot. Handles for
/// explicit paths are never invalidated; their files belong to the caller.
#[derive(Debug)]
pub struct TileHandle {
    path: PathBuf,
    aux_path: PathBuf,
    slot: Option<usize>,
    valid: Rc<Cell<bool>>,
}

impl TileHandle {
    /// Path of the encoded tile
    ///
    /// # Returns
    /// The path, or `InvalidatedHandle` once the slot has been reused
    pub fn path(&self) -> SlicerResult<&Path> {
        self.check()?;
        Ok(&self.path)
    }

    /// Path of the `.aux.xml` sidecar, with the same validity rule as [`path`](Self::path)
    pub fn aux_path(&self) -> SlicerResult<&Path> {
        self.check()?;
        Ok(&self.aux_path)
    }

    pub fn is_valid(&self) -> bool {
        self.valid.get()
    }

    /// Ring slot backing this handle, `None` for explicit paths
    pub fn slot(&self) -> Option<usize> {
        self.slot
    }

    /// Delete the files of an explicit-path tile
    ///
    /// Slot files belong to the cache, so ring handles cannot be removed.
    pub fn remove(self) -> SlicerResult<()> {
        if self.slot.is_some() {
            return Err(SlicerError::InvalidParameters(format!(
                "{} is a cache slot and is removed with its cache", self.path.display()
            )));
        }

        fs::remove_file(&self.path)?;
        if self.aux_path.exists() {
            fs::remove_file(&self.aux_path)?;
        }
        Ok(())
    }

    fn check(&self) -> SlicerResult<()> {
        if self.valid.get() {
            Ok(())
        } else {
            Err(SlicerError::InvalidatedHandle(self.path.clone()))
        }
    }
}

/// Ring buffer of `capacity` tile slots
///
/// Not shareable across threads: the validity flags are plain `Rc<Cell>`s.
/// Parallel workers each need their own cache.
pub struct TileCache<E: TileEncoder = PngTileEncoder> {
    encoder: E,
    directory: PathBuf,
    /// Held so a self-created directory is removed with the cache
    _owned_directory: Option<TempDir>,
    slots: Vec<Option<Rc<Cell<bool>>>>,
    next_slot: usize,
    materialized: u64,
}

impl TileCache<PngTileEncoder> {
    /// Cache of PNG tiles in a fresh temporary directory
    pub fn new(capacity: usize) -> SlicerResult<Self> {
        TileCache::with_encoder(capacity, None, PngTileEncoder)
    }
}

impl<E: TileEncoder> TileCache<E> {
    /// Create a cache
    ///
    /// # Arguments
    /// * `capacity` - Number of ring slots, at least 1
    /// * `directory` - Where slot files live; a temporary directory removed
    ///   on drop is created when `None`
    /// * `encoder` - Encoder used for every tile
    pub fn with_encoder(capacity: usize, directory: Option<&Path>, encoder: E) -> SlicerResult<Self> {
        if capacity == 0 {
            return Err(SlicerError::InvalidParameters("tile cache capacity must be at least 1".to_string()));
        }

        let (directory, owned) = match directory {
            Some(dir) => {
                fs::create_dir_all(dir)?;
                (dir.to_path_buf(), None)
            },
            None => {
                let temp = tempfile::Builder::new().prefix("geoslicer-tiles-").tempdir()?;
                (temp.path().to_path_buf(), Some(temp))
            },
        };

        debug!("Tile cache with {} slots in {}", capacity, directory.display());

        Ok(TileCache {
            encoder,
            directory,
            _owned_directory: owned,
            slots: vec![None; capacity],
            next_slot: 0,
            materialized: 0,
        })
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Number of successful materialisations so far
    pub fn materialized(&self) -> u64 {
        self.materialized
    }

    /// File backing a ring slot
    pub fn slot_path(&self, slot: usize) -> PathBuf {
        self.directory.join(format!("tile-{}.{}", slot, self.encoder.extension()))
    }

    /// Encode a tile and its metadata sidecar
    ///
    /// With `explicit_path` the tile is written there and the handle is
    /// never invalidated. Otherwise the next ring slot is taken: the handle
    /// previously in that slot is invalidated before anything is written.
    ///
    /// # Returns
    /// The handle, or `EncodeError` when the tile could not be written
    pub fn materialize(&mut self, tile: &RasterWindow<'_>, explicit_path: Option<&Path>) -> SlicerResult<TileHandle> {
        let (path, slot) = match explicit_path {
            Some(path) => (path.to_path_buf(), None),
            None => {
                let slot = self.next_slot;
                self.next_slot = (self.next_slot + 1) % self.slots.len();

                if let Some(previous) = self.slots[slot].take() {
                    previous.set(false);
                }
                (self.slot_path(slot), Some(slot))
            },
        };

        self.encoder.encode(tile, &path)?;
        let aux_path = AuxMetadata::new(tile.spatial_ref.clone(), tile.geotransform)
            .write(&path)
            .map_err(|e| SlicerError::EncodeError(format!("Cannot write metadata for {}: {}", path.display(), e)))?;

        let valid = Rc::new(Cell::new(true));
        if let Some(slot) = slot {
            self.slots[slot] = Some(Rc::clone(&valid));
        }

        self.materialized += 1;
        Ok(TileHandle { path, aux_path, slot, valid })
    }
}

impl<E: TileEncoder> Drop for TileCache<E> {
    fn drop(&mut self) {
        for slot in 0..self.slots.len() {
            if let Some(valid) = self.slots[slot].take() {
                valid.set(false);
            }

            let path = self.slot_path(slot);
            for file in [AuxMetadata::sidecar_path(&path), path] {
                if file.exists() {
                    if let Err(e) = fs::remove_file(&file) {
                        warn!("Could not remove cached tile {}: {}", file.display(), e);
                    }
                }
            }
        }
    }
}
