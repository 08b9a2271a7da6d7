//! Georeferencing read from GeoTIFF tags and keys

use log::{debug, warn};

use super::ifd::Ifd;
use super::tags::{geo_keys, tags};
use crate::coordinate::{GeoTransform, SpatialReference};
use crate::errors::{SlicerError, SlicerResult};
use crate::io::{ByteOrderHandler, SeekableReader};

/// One entry of the GeoKey directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeoKeyEntry {
    pub key_id: u16,
    pub tiff_tag_location: u16,
    pub count: u16,
    pub value_offset: u16,
}

/// Georeferencing of a raster
#[derive(Debug, Clone, PartialEq)]
pub struct GeoReference {
    pub geotransform: GeoTransform,
    pub spatial_ref: SpatialReference,
    /// Whether the file carried a geotransform at all
    pub is_georeferenced: bool,
}

impl GeoReference {
    /// Read the geotransform and spatial reference from an IFD
    ///
    /// `ModelTransformationTag` takes precedence over the tiepoint/scale
    /// pair. Files with neither get the identity-like default transform,
    /// which keeps pixel coordinates unchanged apart from the Y flip.
    pub fn read(ifd: &Ifd, reader: &mut dyn SeekableReader,
                handler: &dyn ByteOrderHandler) -> SlicerResult<Self> {
        let keys = parse_geo_key_directory(ifd, reader, handler)?;
        let key_value = |id: u16| keys.iter()
            .find(|key| key.key_id == id && key.tiff_tag_location == 0)
            .map(|key| key.value_offset);

        let geotransform = match read_transformation(ifd, reader, handler)? {
            Some(geotransform) => Some(geotransform),
            None => read_tiepoint_and_scale(ifd, reader, handler)?,
        };

        let is_georeferenced = geotransform.is_some();
        let mut geotransform = geotransform.unwrap_or_else(|| {
            warn!("Raster has no georeferencing tags, using pixel coordinates");
            GeoTransform::default()
        });

        if key_value(geo_keys::RASTER_TYPE) == Some(geo_keys::RASTER_PIXEL_IS_POINT) {
            debug!("Raster is pixel-is-point, shifting origin by half a pixel");
            geotransform = geotransform.with_origin(geotransform.apply(-0.5, -0.5));
        }

        let spatial_ref = [geo_keys::PROJECTED_CS_TYPE, geo_keys::GEOGRAPHIC_TYPE].iter()
            .filter_map(|id| key_value(*id))
            .find(|code| *code != 0 && *code != geo_keys::USER_DEFINED)
            .map(|code| SpatialReference::Epsg(code as u32))
            .unwrap_or_default();

        debug!("Georeference: transform {:?}, spatial reference {}", geotransform.to_gdal(), spatial_ref);

        Ok(GeoReference { geotransform, spatial_ref, is_georeferenced })
    }
}

/// Parse the GeoKey directory, empty when the tag is absent
pub fn parse_geo_key_directory(ifd: &Ifd, reader: &mut dyn SeekableReader,
                               handler: &dyn ByteOrderHandler) -> SlicerResult<Vec<GeoKeyEntry>> {
    let values = match ifd.read_unsigned(reader, handler, tags::GEO_KEY_DIRECTORY_TAG)? {
        Some(values) => values,
        None => return Ok(Vec::new()),
    };

    // Header: KeyDirectoryVersion, KeyRevision, MinorRevision, NumberOfKeys
    if values.len() < 4 {
        return Err(SlicerError::FormatError("Invalid GeoKey directory header".to_string()));
    }

    let num_keys = values[3] as usize;
    if values.len() < 4 + num_keys * 4 {
        return Err(SlicerError::FormatError(format!(
            "GeoKey directory declares {} keys but holds {} values", num_keys, values.len()
        )));
    }

    Ok(values[4..4 + num_keys * 4]
        .chunks_exact(4)
        .map(|key| GeoKeyEntry {
            key_id: key[0] as u16,
            tiff_tag_location: key[1] as u16,
            count: key[2] as u16,
            value_offset: key[3] as u16,
        })
        .collect())
}

fn read_transformation(ifd: &Ifd, reader: &mut dyn SeekableReader,
                       handler: &dyn ByteOrderHandler) -> SlicerResult<Option<GeoTransform>> {
    let matrix = match ifd.read_doubles(reader, handler, tags::MODEL_TRANSFORMATION_TAG)? {
        Some(matrix) => matrix,
        None => return Ok(None),
    };

    if matrix.len() < 16 {
        return Err(SlicerError::FormatError(format!(
            "ModelTransformationTag holds {} values instead of 16", matrix.len()
        )));
    }

    // Row-major 4x4 matrix; only the 2D affine part is used
    Ok(Some(GeoTransform::from_gdal([
        matrix[3], matrix[0], matrix[1],
        matrix[7], matrix[4], matrix[5],
    ])))
}

fn read_tiepoint_and_scale(ifd: &Ifd, reader: &mut dyn SeekableReader,
                           handler: &dyn ByteOrderHandler) -> SlicerResult<Option<GeoTransform>> {
    let tiepoint = ifd.read_doubles(reader, handler, tags::MODEL_TIEPOINT_TAG)?;
    let scale = ifd.read_doubles(reader, handler, tags::MODEL_PIXEL_SCALE_TAG)?;

    match (tiepoint, scale) {
        (Some(tiepoint), Some(scale)) if tiepoint.len() >= 6 && scale.len() >= 2 => {
            let (i, j, x, y) = (tiepoint[0], tiepoint[1], tiepoint[3], tiepoint[4]);
            let (scale_x, scale_y) = (scale[0], scale[1]);

            Ok(Some(GeoTransform::north_up(
                x - i * scale_x,
                y + j * scale_y,
                scale_x,
                -scale_y,
            )))
        },
        (None, None) => Ok(None),
        _ => {
            warn!("Incomplete tiepoint/pixel scale tags, ignoring georeferencing");
            Ok(None)
        }
    }
}
