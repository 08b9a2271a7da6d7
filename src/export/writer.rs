//! Reading and atomically writing feature collections

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use log::debug;
use tempfile::NamedTempFile;

use super::feature_collection::FeatureCollection;
use crate::errors::SlicerResult;

/// Write `collection` to `path`, replacing any previous file
///
/// The JSON goes to a temporary file in the target directory which is then
/// renamed over `path`, so readers never see a truncated collection.
pub fn write_collection(collection: &FeatureCollection, path: &Path) -> SlicerResult<()> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(directory)?;

    let mut temp = NamedTempFile::new_in(directory)?;
    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        serde_json::to_writer(&mut writer, collection)?;
        writer.flush()?;
    }
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    debug!("Wrote {} features to {}", collection.len(), path.display());
    Ok(())
}

/// Read a feature collection from a GeoJSON file
pub fn read_collection(path: &Path) -> SlicerResult<FeatureCollection> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}
