//! GDAL PAM sidecar files (`<tile>.aux.xml`)
//!
//! A materialised tile is a plain image; the sidecar carries its spatial
//! reference and geotransform so the tile stays georeferenced.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::coordinate::{GeoTransform, SpatialReference};
use crate::errors::{SlicerError, SlicerResult};

const PAM_DATASET: &str = "PAMDataset";
const SRS: &str = "SRS";
const GEO_TRANSFORM: &str = "GeoTransform";

/// Georeferencing written next to a tile
#[derive(Debug, Clone, PartialEq)]
pub struct AuxMetadata {
    pub spatial_ref: SpatialReference,
    pub geotransform: GeoTransform,
}

impl AuxMetadata {
    pub fn new(spatial_ref: SpatialReference, geotransform: GeoTransform) -> Self {
        AuxMetadata { spatial_ref, geotransform }
    }

    /// Sidecar path of a tile: the tile path with `.aux.xml` appended
    pub fn sidecar_path(tile_path: &Path) -> PathBuf {
        let mut name = OsString::from(tile_path.as_os_str());
        name.push(".aux.xml");
        PathBuf::from(name)
    }

    /// Serialise as a `PAMDataset` document
    pub fn to_xml(&self) -> SlicerResult<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

        write_event(&mut writer, Event::Start(BytesStart::new(PAM_DATASET)))?;

        if self.spatial_ref.is_known() {
            let srs = self.spatial_ref.to_string();
            write_event(&mut writer, Event::Start(BytesStart::new(SRS)))?;
            write_event(&mut writer, Event::Text(BytesText::new(&srs)))?;
            write_event(&mut writer, Event::End(BytesEnd::new(SRS)))?;
        }

        let coefficients = self.geotransform.to_gdal()
            .iter()
            .map(|value| format!("{:.16e}", value))
            .collect::<Vec<_>>()
            .join(", ");
        write_event(&mut writer, Event::Start(BytesStart::new(GEO_TRANSFORM)))?;
        write_event(&mut writer, Event::Text(BytesText::new(&coefficients)))?;
        write_event(&mut writer, Event::End(BytesEnd::new(GEO_TRANSFORM)))?;

        write_event(&mut writer, Event::End(BytesEnd::new(PAM_DATASET)))?;

        String::from_utf8(writer.into_inner())
            .map_err(|e| SlicerError::EncodeError(format!("Invalid UTF-8 in metadata: {}", e)))
    }

    /// Parse a `PAMDataset` document
    ///
    /// Missing `SRS` gives an unknown spatial reference; a missing or
    /// malformed `GeoTransform` is a format error.
    pub fn from_xml(xml: &str) -> SlicerResult<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut current: Option<Vec<u8>> = None;
        let mut spatial_ref = SpatialReference::Unknown;
        let mut geotransform = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(element)) => current = Some(element.name().as_ref().to_vec()),
                Ok(Event::End(_)) => current = None,
                Ok(Event::Text(text)) => {
                    let value = text.unescape()
                        .map_err(|e| SlicerError::FormatError(format!("Invalid metadata text: {}", e)))?;
                    match current.as_deref() {
                        Some(name) if name == SRS.as_bytes() => spatial_ref = SpatialReference::parse(&value),
                        Some(name) if name == GEO_TRANSFORM.as_bytes() => geotransform = Some(parse_coefficients(&value)?),
                        _ => {}
                    }
                },
                Ok(Event::Eof) => break,
                Ok(_) => {},
                Err(e) => return Err(SlicerError::FormatError(format!("Invalid metadata XML: {}", e))),
            }
        }

        let geotransform = geotransform
            .ok_or_else(|| SlicerError::FormatError("Metadata has no GeoTransform".to_string()))?;
        Ok(AuxMetadata { spatial_ref, geotransform })
    }

    /// Write the sidecar of `tile_path`
    pub fn write(&self, tile_path: &Path) -> SlicerResult<PathBuf> {
        let path = AuxMetadata::sidecar_path(tile_path);
        fs::write(&path, self.to_xml()?)?;
        Ok(path)
    }

    /// Read the sidecar of `tile_path`
    pub fn read(tile_path: &Path) -> SlicerResult<Self> {
        AuxMetadata::from_xml(&fs::read_to_string(AuxMetadata::sidecar_path(tile_path))?)
    }
}

fn write_event(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> SlicerResult<()> {
    writer.write_event(event)
        .map(|_| ())
        .map_err(|e| SlicerError::EncodeError(format!("Metadata XML error: {}", e)))
}

fn parse_coefficients(text: &str) -> SlicerResult<GeoTransform> {
    let values = text.split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| SlicerError::FormatError(format!("Invalid GeoTransform '{}': {}", text, e)))?;

    let coefficients: [f64; 6] = values.try_into()
        .map_err(|_| SlicerError::FormatError(format!("GeoTransform '{}' needs 6 values", text)))?;

    Ok(GeoTransform::from_gdal(coefficients))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sidecar_path() {
        assert_eq!(
            AuxMetadata::sidecar_path(Path::new("/tmp/tiles/tile-3.png")),
            PathBuf::from("/tmp/tiles/tile-3.png.aux.xml")
        );
    }

    #[test]
    fn test_xml_keeps_full_precision() {
        let metadata = AuxMetadata::new(
            SpatialReference::Epsg(32632),
            GeoTransform::north_up(445_022.55, 6_649_952.45, 0.05, -0.05),
        );

        let xml = metadata.to_xml().unwrap();
        assert!(xml.contains("<SRS>EPSG:32632</SRS>"));
        assert_eq!(AuxMetadata::from_xml(&xml).unwrap(), metadata);
    }

    #[test]
    fn test_wkt_survives_escaping() {
        let wkt = r#"PROJCS["WGS 84 / UTM zone 32N",AUTHORITY["EPSG","32632"]]"#;
        let metadata = AuxMetadata::new(SpatialReference::Wkt(wkt.to_string()), GeoTransform::default());

        let parsed = AuxMetadata::from_xml(&metadata.to_xml().unwrap()).unwrap();
        assert_eq!(parsed.spatial_ref.epsg(), Some(32632));
    }

    #[test]
    fn test_missing_geotransform() {
        assert!(AuxMetadata::from_xml("<PAMDataset><SRS>EPSG:4326</SRS></PAMDataset>").is_err());
    }
}
