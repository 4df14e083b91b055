use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::geo_core::{GeoCore, DEFAULT_OUTPUT_PATH};
use crate::geometric::boundary::ShelfBoundary;
use crate::geometric::mask::Mask;
use crate::raster::RasterGrid;

/// Default raster value classified as water.
pub const WATER_VALUE: f64 = 0.0;

/// Coverage numbers for one boundary/raster pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageReport {
    /// Cells whose center lies inside the boundary
    pub total_cells: usize,
    /// Cells inside the boundary classified as water
    pub water_cells: usize,
    /// water_cells / total_cells, in percent; 0.0 when nothing is inside
    pub percent: f64,
}

/// Water coverage structure.
/// Computes the share of water-classified cells inside an ice shelf
/// boundary, from a vector outline and a co-registered classified raster.
pub struct WaterCoverage {
    /// Path to the boundary vector file
    boundary_path: PathBuf,
    /// Path to the single-band classified raster
    raster_path: PathBuf,
    /// Output path for exported reports
    output_path: PathBuf,
    /// Raster value counted as water
    water_value: f64,
    /// CRS to assume for a boundary file that declares none
    declared_epsg: Option<i32>,
    /// GeoCore for CRS handling
    pub geo_core: GeoCore,
    /// Result of the last run
    report: Option<CoverageReport>,
}

impl WaterCoverage {
    /// Create a new WaterCoverage instance for one boundary/raster pair.
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(
        boundary_path: P,
        raster_path: Q,
        output_path: Option<String>,
    ) -> Self {
        let output_path_buf = PathBuf::from(
            output_path
                .as_ref()
                .map(|s| s.as_str())
                .unwrap_or(DEFAULT_OUTPUT_PATH),
        );

        let mut geo_core = GeoCore::default();
        geo_core.set_output_path(Some(output_path_buf.to_string_lossy().to_string()));

        WaterCoverage {
            boundary_path: boundary_path.as_ref().to_path_buf(),
            raster_path: raster_path.as_ref().to_path_buf(),
            output_path: output_path_buf,
            water_value: WATER_VALUE,
            declared_epsg: None,
            geo_core,
            report: None,
        }
    }

    /// Declare the CRS of a boundary file that carries none itself.
    pub fn set_crs(&mut self, epsg: i32) {
        self.geo_core.set_epsg(epsg);
        self.declared_epsg = Some(epsg);
    }

    /// Override the raster value counted as water.
    pub fn set_water_value(&mut self, value: f64) {
        self.water_value = value;
    }

    /// Run the coverage computation.
    pub fn run(mut self) -> Result<Self> {
        self.run_internal()?;
        Ok(self)
    }

    /// Internal run method that can be called mutably.
    pub fn run_internal(&mut self) -> Result<()> {
        let raster = RasterGrid::open(&self.raster_path)?;
        let boundary = ShelfBoundary::open(
            &self.boundary_path,
            self.declared_epsg,
            raster.spatial_ref(),
        )?;

        println!(
            "Boundary: {} feature(s) from {:?}",
            boundary.len(),
            boundary.source()
        );
        println!(
            "Raster grid: {}x{} cells",
            raster.width(),
            raster.height()
        );

        // A boundary that misses the raster entirely is legal and yields
        // 0.0, but almost always means misaligned inputs.
        if let Some(bbox) = boundary.bounding_box() {
            if !bbox.intersects(&raster.bounding_box()) {
                println!(
                    "Warning: boundary extent does not overlap the raster extent; coverage will be 0.00%"
                );
            }
        }

        let mask = Mask::rasterize(boundary.geometries(), &raster);
        self.report = Some(water_coverage_report(&raster, &mask, self.water_value)?);

        Ok(())
    }

    /// Result of the last run, if any.
    pub fn report(&self) -> Option<&CoverageReport> {
        self.report.as_ref()
    }

    /// Percentage from the last run, if any.
    pub fn percent(&self) -> Option<f64> {
        self.report.as_ref().map(|r| r.percent)
    }

    /// Get output path
    pub fn get_output_path(&self) -> &Path {
        &self.output_path
    }

    /// Save the coverage report to a JSON file in the output path.
    pub fn to_json(&self, name: Option<&str>) -> Result<()> {
        let report = self
            .report
            .as_ref()
            .context("No report available. Call run() first.")?;

        let name = name.unwrap_or("water_coverage");
        std::fs::create_dir_all(&self.output_path).context(format!(
            "Failed to create output directory: {:?}",
            self.output_path
        ))?;

        let output_file = self.output_path.join(format!("{}.json", name));
        let json = serde_json::to_string_pretty(report)
            .context("Failed to serialize coverage report")?;
        std::fs::write(&output_file, json)
            .context(format!("Failed to write report file: {:?}", output_file))?;

        println!("Coverage report saved to: {:?}", output_file);

        Ok(())
    }
}

/// Count masked cells and water-classified cells and form the percentage.
/// An empty selection yields 0.0 rather than a division by zero.
pub fn water_coverage_report(
    raster: &RasterGrid,
    mask: &Mask,
    water_value: f64,
) -> Result<CoverageReport> {
    if mask.shape() != raster.shape() {
        anyhow::bail!(
            "Mask shape {:?} does not match raster shape {:?}",
            mask.shape(),
            raster.shape()
        );
    }

    let mut total_cells = 0usize;
    let mut water_cells = 0usize;
    for (value, inside) in raster.data().iter().zip(mask.bits()) {
        if *inside {
            total_cells += 1;
            if *value == water_value {
                water_cells += 1;
            }
        }
    }

    let percent = if total_cells > 0 {
        (water_cells as f64 / total_cells as f64) * 100.0
    } else {
        0.0
    };

    Ok(CoverageReport {
        total_cells,
        water_cells,
        percent,
    })
}

/// Calculate the percentage of water-classified cells inside the boundary.
/// This is the single-call form of the analysis; see `WaterCoverage` for
/// the configurable one.
pub fn calculate_water_coverage<P: AsRef<Path>, Q: AsRef<Path>>(
    boundary_path: P,
    raster_path: Q,
) -> Result<f64> {
    let coverage = WaterCoverage::new(boundary_path, raster_path, None).run()?;
    let report = coverage
        .report()
        .context("Coverage report missing after run")?;
    Ok(report.percent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdal::raster::Buffer;
    use gdal::spatial_ref::SpatialRef;
    use gdal::DriverManager;
    use geo::{Geometry as GeoGeometry, LineString, Polygon};

    const NORTH_UP_4X4: [f64; 6] = [0.0, 1.0, 0.0, 4.0, 0.0, -1.0];

    // The 4x4 classification used across these tests: three water cells
    // (value 0) out of sixteen.
    const CLASSIFIED: [f64; 16] = [
        0.0, 0.0, 1.0, 1.0, //
        0.0, 1.0, 1.0, 1.0, //
        1.0, 1.0, 1.0, 1.0, //
        1.0, 1.0, 1.0, 0.0,
    ];

    const BOUNDARY_GEOJSON: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {
      "type": "Feature",
      "properties": {},
      "geometry": {
        "type": "Polygon",
        "coordinates": [[[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0], [0.0, 0.0]]]
      }
    }
  ]
}"#;

    fn square(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> GeoGeometry<f64> {
        Polygon::new(
            LineString::from(vec![
                (min_x, min_y),
                (max_x, min_y),
                (max_x, max_y),
                (min_x, max_y),
                (min_x, min_y),
            ]),
            vec![],
        )
        .into()
    }

    fn classified_grid() -> RasterGrid {
        RasterGrid::from_parts(CLASSIFIED.to_vec(), 4, 4, NORTH_UP_4X4).unwrap()
    }

    fn write_classified_raster(path: &Path) {
        let driver = DriverManager::get_driver_by_name("GTiff").unwrap();
        let mut dataset = driver
            .create_with_band_type::<f64, _>(path, 4, 4, 1)
            .unwrap();
        dataset.set_geo_transform(&NORTH_UP_4X4).unwrap();
        let srs = SpatialRef::from_epsg(4326).unwrap();
        dataset.set_spatial_ref(&srs).unwrap();
        let mut band = dataset.rasterband(1).unwrap();
        let buffer = Buffer::new((4, 4), CLASSIFIED.to_vec());
        band.write((0, 0), (4, 4), &buffer).unwrap();
    }

    #[test]
    fn test_full_cover_percentage() {
        let grid = classified_grid();
        let mask = Mask::rasterize(&[square(0.0, 0.0, 4.0, 4.0)], &grid);
        let report = water_coverage_report(&grid, &mask, WATER_VALUE).unwrap();
        assert_eq!(report.total_cells, 16);
        assert_eq!(report.water_cells, 3);
        assert!((report.percent - 18.75).abs() < 1e-12);
    }

    #[test]
    fn test_boundary_off_grid_is_zero() {
        let grid = classified_grid();
        let mask = Mask::rasterize(&[square(10.0, 10.0, 12.0, 12.0)], &grid);
        let report = water_coverage_report(&grid, &mask, WATER_VALUE).unwrap();
        assert_eq!(report.total_cells, 0);
        assert_eq!(report.percent, 0.0);
    }

    #[test]
    fn test_partial_cover_stays_in_range() {
        let grid = classified_grid();
        // Left two columns: 8 cells, 3 of them water
        let mask = Mask::rasterize(&[square(0.0, 0.0, 2.0, 4.0)], &grid);
        let report = water_coverage_report(&grid, &mask, WATER_VALUE).unwrap();
        assert_eq!(report.total_cells, 8);
        assert_eq!(report.water_cells, 3);
        assert!(report.percent >= 0.0 && report.percent <= 100.0);
        assert!((report.percent - 37.5).abs() < 1e-12);
    }

    #[test]
    fn test_shape_mismatch_is_error() {
        let grid = classified_grid();
        let small = RasterGrid::from_parts(vec![0.0; 9], 3, 3, NORTH_UP_4X4).unwrap();
        let mask = Mask::rasterize(&[square(0.0, 0.0, 4.0, 4.0)], &small);
        let result = water_coverage_report(&grid, &mask, WATER_VALUE);
        assert!(result.is_err());
    }

    #[test]
    fn test_set_crs() {
        let mut coverage = WaterCoverage::new("boundary.shp", "classified.tif", None);
        coverage.set_crs(3031);
        assert_eq!(coverage.geo_core.get_epsg(), 3031);
    }

    #[test]
    fn test_custom_water_value() {
        let grid = classified_grid();
        let mask = Mask::rasterize(&[square(0.0, 0.0, 4.0, 4.0)], &grid);
        // Counting the non-water class instead
        let report = water_coverage_report(&grid, &mask, 1.0).unwrap();
        assert_eq!(report.water_cells, 13);
        assert!((report.percent - 81.25).abs() < 1e-12);
    }

    #[test]
    fn test_missing_input_files() {
        let result = calculate_water_coverage("/nonexistent/boundary.shp", "/nonexistent/raster.tif");
        assert!(result.is_err());
    }

    #[test]
    fn test_end_to_end_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let raster_path = dir.path().join("classified.tif");
        let boundary_path = dir.path().join("boundary.geojson");
        write_classified_raster(&raster_path);
        std::fs::write(&boundary_path, BOUNDARY_GEOJSON).unwrap();

        let percent = calculate_water_coverage(&boundary_path, &raster_path).unwrap();
        assert!((percent - 18.75).abs() < 1e-12);

        // Same unmodified files give the identical percentage
        let again = calculate_water_coverage(&boundary_path, &raster_path).unwrap();
        assert_eq!(percent, again);
    }

    #[test]
    fn test_report_export() {
        let dir = tempfile::tempdir().unwrap();
        let raster_path = dir.path().join("classified.tif");
        let boundary_path = dir.path().join("boundary.geojson");
        write_classified_raster(&raster_path);
        std::fs::write(&boundary_path, BOUNDARY_GEOJSON).unwrap();

        let output = dir.path().join("out");
        let coverage = WaterCoverage::new(
            &boundary_path,
            &raster_path,
            Some(output.to_string_lossy().to_string()),
        )
        .run()
        .unwrap();

        coverage.to_json(None).unwrap();

        let json = std::fs::read_to_string(output.join("water_coverage.json")).unwrap();
        let report: CoverageReport = serde_json::from_str(&json).unwrap();
        assert_eq!(report, *coverage.report().unwrap());
        assert_eq!(report.total_cells, 16);
        assert_eq!(report.water_cells, 3);
    }
}
