use anyhow::Result;
use shelfwater::geometric::coverage::WaterCoverage;

/// Example: full coverage run with a JSON report export
///
/// Arguments: boundary file, classified raster, optional output directory
/// for the report (defaults to ./output).
fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 2 {
        eprintln!("Usage: coverage_report <boundary.shp> <classified.tif> [output_dir]");
        std::process::exit(1);
    }

    let mut coverage = WaterCoverage::new(&args[0], &args[1], args.get(2).cloned());
    // Classified rasters from the thresholding step mark water as 0
    coverage.set_water_value(0.0);

    let coverage = coverage.run()?;

    if let Some(report) = coverage.report() {
        println!("Cells inside boundary: {}", report.total_cells);
        println!("Water cells: {}", report.water_cells);
        println!(
            "Water coverage within ice shelf boundary: {:.2}%",
            report.percent
        );
    }

    coverage.to_json(None)?;
    println!("Output directory: {:?}", coverage.get_output_path());

    Ok(())
}
