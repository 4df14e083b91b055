use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use gdal::spatial_ref::{CoordTransform, SpatialRef};
use gdal::vector::LayerAccess;
use gdal::Dataset;
use geo::algorithm::bounding_rect::BoundingRect;
use geo::Geometry as GeoGeometry;
use geojson::{Feature, FeatureCollection, GeoJson};

use crate::geo_core::BoundingBox;

/// Ice shelf boundary structure.
/// Holds the polygon outline(s) read from a vector file (shapefile, GeoJSON,
/// anything the GDAL vector drivers handle). All features are treated as one
/// combined region; attributes are ignored.
pub struct ShelfBoundary {
    /// Boundary geometries, one per source feature
    geometries: Vec<GeoGeometry<f64>>,
    /// Spatial reference of the geometries, when known
    srs: Option<SpatialRef>,
    /// Path the boundary was read from
    source: PathBuf,
}

impl ShelfBoundary {
    /// Read every feature of the first layer of a vector file.
    ///
    /// `declared_epsg` stands in for the file's CRS when the file itself does
    /// not carry one (a shapefile without a .prj sidecar). When both the
    /// boundary and `align_to` declare an EPSG authority and the codes
    /// differ, the geometries are reprojected into the `align_to` reference;
    /// otherwise the inputs are assumed pre-aligned.
    pub fn open<P: AsRef<Path>>(
        path: P,
        declared_epsg: Option<i32>,
        align_to: Option<&SpatialRef>,
    ) -> Result<Self> {
        let path = path.as_ref();
        let dataset =
            Dataset::open(path).context(format!("Failed to open boundary file: {:?}", path))?;

        let mut layer = dataset
            .layer(0)
            .context(format!("Failed to access first layer of {:?}", path))?;

        let source_srs = match layer.spatial_ref() {
            Some(srs) => Some(srs),
            None => match declared_epsg {
                Some(epsg) => Some(
                    SpatialRef::from_epsg(epsg as u32)
                        .context(format!("Failed to create SRS for EPSG:{}", epsg))?,
                ),
                None => None,
            },
        };

        let transform = match (&source_srs, align_to) {
            (Some(src), Some(dst)) if differing_authorities(src, dst) => Some(
                CoordTransform::new(src, dst)
                    .context("Failed to create coordinate transformation")?,
            ),
            _ => None,
        };

        let mut geometries = Vec::new();
        for feature in layer.features() {
            if let Some(geom_ref) = feature.geometry() {
                let geom = match &transform {
                    Some(ct) => geom_ref
                        .transform(ct)
                        .context("Failed to reproject boundary geometry")?,
                    None => geom_ref.clone(),
                };
                geometries.push(gdal_to_geo_geometry(&geom)?);
            }
        }

        if geometries.is_empty() {
            anyhow::bail!("No geometry found in boundary file: {:?}", path);
        }

        let srs = match (transform.is_some(), align_to) {
            (true, Some(dst)) => Some(dst.clone()),
            _ => source_srs,
        };

        Ok(ShelfBoundary {
            geometries,
            srs,
            source: path.to_path_buf(),
        })
    }

    pub fn geometries(&self) -> &[GeoGeometry<f64>] {
        &self.geometries
    }

    /// Number of features read from the source
    pub fn len(&self) -> usize {
        self.geometries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.geometries.is_empty()
    }

    pub fn srs(&self) -> Option<&SpatialRef> {
        self.srs.as_ref()
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Combined bounding box over all boundary geometries.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let mut bbox: Option<BoundingBox> = None;
        for geom in &self.geometries {
            if let Some(rect) = geom.bounding_rect() {
                bbox = Some(match bbox {
                    Some(acc) => BoundingBox::new(
                        acc.min_x.min(rect.min().x),
                        acc.min_y.min(rect.min().y),
                        acc.max_x.max(rect.max().x),
                        acc.max_y.max(rect.max().y),
                    ),
                    None => BoundingBox::new(
                        rect.min().x,
                        rect.min().y,
                        rect.max().x,
                        rect.max().y,
                    ),
                });
            }
        }
        bbox
    }

    /// Save the combined boundary to a GeoJSON file.
    pub fn to_geojson(&self, output_file: &Path) -> Result<()> {
        let mut features = Vec::new();
        for geom in &self.geometries {
            let geojson_geom: geojson::Geometry = geom
                .try_into()
                .context("Failed to convert geometry to GeoJSON")?;
            features.push(Feature::from(geojson_geom));
        }

        let collection = GeoJson::FeatureCollection(FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        });

        if let Some(parent) = output_file.parent() {
            std::fs::create_dir_all(parent)
                .context(format!("Failed to create output directory: {:?}", parent))?;
        }
        std::fs::write(output_file, collection.to_string())
            .context(format!("Failed to write GeoJSON file: {:?}", output_file))?;

        println!("Boundary saved to: {:?}", output_file);

        Ok(())
    }
}

/// Convert a GDAL geometry to geo::Geometry by way of WKT and GEOS.
fn gdal_to_geo_geometry(geom: &gdal::vector::Geometry) -> Result<GeoGeometry<f64>> {
    let wkt = geom.wkt().context("Failed to get WKT from GDAL geometry")?;

    let geos_geom =
        geos::Geometry::new_from_wkt(&wkt).context("Failed to parse WKT with GEOS")?;

    let geo_geom: GeoGeometry<f64> = geos_geom
        .try_into()
        .context("Failed to convert GEOS geometry to geo")?;

    Ok(geo_geom)
}

/// True when both references resolve to EPSG authorities with different
/// codes. Unknown authorities are treated as pre-aligned.
fn differing_authorities(src: &SpatialRef, dst: &SpatialRef) -> bool {
    match (src.auth_code(), dst.auth_code()) {
        (Ok(a), Ok(b)) => a != b,
        _ => false,
    }
}
