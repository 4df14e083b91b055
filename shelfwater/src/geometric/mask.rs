use geo::algorithm::bounding_rect::BoundingRect;
use geo::algorithm::intersects::Intersects;
use geo::{Geometry as GeoGeometry, Point, Rect};

use crate::raster::RasterGrid;

/// Boolean inclusion mask over a raster grid.
/// True marks cells whose center lies inside the ice shelf boundary.
pub struct Mask {
    /// Row-major, same ordering as the raster data
    bits: Vec<bool>,
    width: usize,
    height: usize,
}

impl Mask {
    /// Rasterize boundary geometries against the grid of `raster`.
    ///
    /// A cell is inside when its center point intersects any geometry
    /// (cell centers on the boundary line count as inside). Geometries
    /// that miss the grid entirely yield an all-false mask.
    pub fn rasterize(geometries: &[GeoGeometry<f64>], raster: &RasterGrid) -> Mask {
        let (width, height) = raster.shape();
        let mut bits = vec![false; width * height];

        // Bounding rectangles let most cells skip the point-in-polygon test.
        let rects: Vec<Option<Rect<f64>>> =
            geometries.iter().map(|g| g.bounding_rect()).collect();

        for row in 0..height {
            for col in 0..width {
                let (x, y) = raster.cell_center(col, row);
                let point = Point::new(x, y);

                let inside = geometries.iter().zip(&rects).any(|(geom, rect)| {
                    match rect {
                        Some(r) => r.intersects(&point) && geom.intersects(&point),
                        None => geom.intersects(&point),
                    }
                });
                bits[row * width + col] = inside;
            }
        }

        Mask {
            bits,
            width,
            height,
        }
    }

    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    /// Mask shape as (width, height)
    pub fn shape(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Number of cells inside the boundary
    pub fn count_inside(&self) -> usize {
        self.bits.iter().filter(|b| **b).count()
    }
}
