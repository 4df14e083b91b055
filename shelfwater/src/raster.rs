use anyhow::{Context, Result};
use gdal::spatial_ref::SpatialRef;
use gdal::Dataset;
use std::path::Path;

use crate::geo_core::BoundingBox;

/// Single-band raster grid held in memory.
/// Wraps the first band of a classified raster together with the affine
/// geotransform that maps cell indices to world coordinates.
pub struct RasterGrid {
    /// Cell values, row-major, top row first
    data: Vec<f64>,
    width: usize,
    height: usize,
    /// GDAL-style affine transform: [origin_x, px_w, rot_x, origin_y, rot_y, px_h]
    geo_transform: [f64; 6],
    /// Spatial reference of the raster, when the file declares one
    srs: Option<SpatialRef>,
}

impl RasterGrid {
    /// Open a raster file and read band 1 into memory.
    /// The dataset handle is released when this function returns,
    /// on the error paths included.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let dataset =
            Dataset::open(path).context(format!("Failed to open raster: {:?}", path))?;

        if dataset.raster_count() < 1 {
            anyhow::bail!("Raster has no bands: {:?}", path);
        }

        let (width, height) = dataset.raster_size();
        let geo_transform = dataset
            .geo_transform()
            .context(format!("Raster has no usable geotransform: {:?}", path))?;

        let band = dataset.rasterband(1).context("Failed to get band 1")?;
        let buffer = band
            .read_as::<f64>((0, 0), (width, height), (width, height), None)
            .context("Failed to read band 1")?;

        let srs = dataset.spatial_ref().ok();

        Ok(RasterGrid {
            data: buffer.data,
            width,
            height,
            geo_transform,
            srs,
        })
    }

    /// Build a grid from raw parts. Rows are stored top-down, row-major.
    pub fn from_parts(
        data: Vec<f64>,
        width: usize,
        height: usize,
        geo_transform: [f64; 6],
    ) -> Result<Self> {
        if data.len() != width * height {
            anyhow::bail!(
                "Grid data length {} does not match shape {}x{}",
                data.len(),
                width,
                height
            );
        }
        Ok(RasterGrid {
            data,
            width,
            height,
            geo_transform,
            srs: None,
        })
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Grid shape as (width, height)
    pub fn shape(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn geo_transform(&self) -> &[f64; 6] {
        &self.geo_transform
    }

    pub fn spatial_ref(&self) -> Option<&SpatialRef> {
        self.srs.as_ref()
    }

    /// World coordinates of the center of cell (col, row).
    pub fn cell_center(&self, col: usize, row: usize) -> (f64, f64) {
        let gt = &self.geo_transform;
        let c = col as f64 + 0.5;
        let r = row as f64 + 0.5;
        let x = gt[0] + c * gt[1] + r * gt[2];
        let y = gt[3] + c * gt[4] + r * gt[5];
        (x, y)
    }

    /// Spatial extent covered by the grid, from the four corner cells.
    pub fn bounding_box(&self) -> BoundingBox {
        let gt = &self.geo_transform;
        let corners = [
            (0.0, 0.0),
            (self.width as f64, 0.0),
            (0.0, self.height as f64),
            (self.width as f64, self.height as f64),
        ];

        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for (c, r) in corners {
            let x = gt[0] + c * gt[1] + r * gt[2];
            let y = gt[3] + c * gt[4] + r * gt[5];
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }

        BoundingBox::new(min_x, min_y, max_x, max_y)
    }
}
