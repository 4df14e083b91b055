use shelfwater::geometric::coverage::calculate_water_coverage;

/// Example: water coverage for one boundary/raster pair
///
/// Takes the path to the ice shelf boundary vector file and the path to the
/// classified raster (water = 0) as positional arguments.
fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() != 2 {
        eprintln!("Usage: water_coverage_from_files <boundary.shp> <classified.tif>");
        std::process::exit(1);
    }

    match calculate_water_coverage(&args[0], &args[1]) {
        Ok(percent) => {
            println!("Water coverage within ice shelf boundary: {:.2}%", percent);
        }
        Err(e) => {
            println!("An error occurred: {:#}", e);
        }
    }
}
