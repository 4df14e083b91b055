/// Default location for exported reports and other artifacts.
pub const DEFAULT_OUTPUT_PATH: &str = "./output";

/// Base struct for geospatial bookkeeping.
/// Holds the working CRS and the output path for exported artifacts.
#[derive(Clone)]
pub struct GeoCore {
    /// EPSG code of the declared CRS
    pub epsg: i32,
    /// Output path for processed data
    pub output_path: Option<String>,
}

impl GeoCore {
    /// Create a new GeoCore with the given EPSG code
    pub fn new(epsg: i32) -> Self {
        GeoCore {
            epsg,
            output_path: None,
        }
    }

    /// Create default GeoCore
    pub fn default() -> Self {
        // Default to EPSG:3031 (Antarctic Polar Stereographic)
        GeoCore::new(3031)
    }

    /// Get EPSG code
    pub fn get_epsg(&self) -> i32 {
        self.epsg
    }

    /// Set EPSG code
    pub fn set_epsg(&mut self, epsg: i32) {
        self.epsg = epsg;
    }

    /// Get output path
    pub fn get_output_path(&self) -> Option<&String> {
        self.output_path.as_ref()
    }

    /// Set output path
    pub fn set_output_path(&mut self, output_path: Option<String>) {
        self.output_path = output_path;
    }
}

/// Bounding box structure
#[derive(Debug, Clone, Copy)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        BoundingBox {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Whether two boxes share any area (touching edges count).
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geo_core_default() {
        let gc = GeoCore::default();
        assert_eq!(gc.get_epsg(), 3031);
    }

    #[test]
    fn test_geo_core_set_epsg() {
        let mut gc = GeoCore::default();
        gc.set_epsg(4326);
        assert_eq!(gc.get_epsg(), 4326);
    }

    #[test]
    fn test_bounding_box_intersects() {
        let a = BoundingBox::new(0.0, 0.0, 4.0, 4.0);
        let b = BoundingBox::new(2.0, 2.0, 6.0, 6.0);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
    }

    #[test]
    fn test_bounding_box_disjoint() {
        let a = BoundingBox::new(0.0, 0.0, 4.0, 4.0);
        let b = BoundingBox::new(10.0, 10.0, 12.0, 12.0);
        assert!(!a.intersects(&b));
    }

    #[test]
    fn test_bounding_box_touching_edge() {
        let a = BoundingBox::new(0.0, 0.0, 4.0, 4.0);
        let b = BoundingBox::new(4.0, 0.0, 8.0, 4.0);
        assert!(a.intersects(&b));
    }
}
