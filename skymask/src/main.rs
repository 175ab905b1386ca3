mod options;
mod request;

use anyhow::Error as AnyError;
use clap::Parser;
use horizon::{Config, DemSource, HorizonMask};
use log::info;
use options::{Cli, Command as CliCmd};
use request::{JsonEntry, Request};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::PathBuf,
};
use textplots::{Chart, Plot, Shape};

fn main() -> Result<(), AnyError> {
    let Cli {
        dem,
        half_window,
        bucket_width,
        scratch_dir,
        parallel,
        cmd,
    } = Cli::parse();

    env_logger::init();

    let config = Config {
        half_window_m: half_window,
        bucket_width_deg: bucket_width,
        ..Config::default()
    };

    let source = {
        let source = DemSource::new(&dem)?;
        match scratch_dir {
            Some(dir) => source.scratch_dir(dir),
            None => source,
        }
    };

    match cmd {
        CliCmd::Json(site) => print_json(&compute(&site.into(), config, parallel, &source)?),
        CliCmd::Csv(site) => print_csv(&compute(&site.into(), config, parallel, &source)?),
        CliCmd::Plot(site) => {
            plot_ascii(&compute(&site.into(), config, parallel, &source)?);
            Ok(())
        }
        CliCmd::Request { file } => {
            let request = read_request(file)?;
            print_json(&compute(&request, config, parallel, &source)?)
        }
    }
}

fn compute(
    request: &Request,
    config: Config,
    parallel: bool,
    source: &DemSource,
) -> Result<HorizonMask, AnyError> {
    let mask = HorizonMask::builder()
        .observer_at(request.coord())
        .eye_height(request.eye_height)
        .min_elevation_angle(
            request
                .min_elevation_angle
                .unwrap_or(config.min_elevation_angle_deg),
        )
        .ground_elevation(request.ground_elevation)
        .config(config)
        .parallel(parallel)
        .build(source)?;
    info!(
        "mask; at: {:?}, ground_elev: {}, eye_height: {}, observations: {}, buckets: {}",
        mask.observer.coord(),
        mask.observer.ground_elev_m(),
        mask.observer.eye_height_m(),
        mask.observation_count,
        mask.entries.len()
    );
    Ok(mask)
}

fn read_request(file: Option<PathBuf>) -> Result<Request, AnyError> {
    let request = match file {
        Some(path) => serde_json::from_reader(BufReader::new(File::open(path)?))?,
        None => serde_json::from_reader(std::io::stdin().lock())?,
    };
    Ok(request)
}

fn print_json(mask: &HorizonMask) -> Result<(), AnyError> {
    let reshaped: Vec<JsonEntry> = mask.entries.iter().map(JsonEntry::from).collect();
    let json = serde_json::to_string(&reshaped)?;
    println!("{json}");
    Ok(())
}

/// # Example with gnuplot
///
/// ```sh
/// cargo run -- --dem=dem.tif csv --at=2600000,1200000 --eye-height=1.6 | tr ',' ' ' > ~/.tmp/mask && gnuplot -p -e "plot '~/.tmp/mask' using 1:2 with lines"
/// ```
fn print_csv(mask: &HorizonMask) -> Result<(), AnyError> {
    let mut stdout = std::io::stdout().lock();
    writeln!(
        stdout,
        "Azimuth,ElevationAngle,Distance,Row,Col,TargetEast,TargetNorth,TargetAltitude"
    )?;
    for entry in &mask.entries {
        let azimuth = entry.azimuth_deg;
        let elevation = entry.elevation_angle_deg;
        match entry.source {
            Some(obs) => writeln!(
                stdout,
                "{azimuth},{elevation},{},{},{},{},{},{}",
                obs.distance_m, obs.row, obs.col, obs.target.x, obs.target.y, obs.target_alt_m
            )?,
            None => writeln!(stdout, "{azimuth},{elevation},,,,,,")?,
        }
    }
    Ok(())
}

fn plot_ascii(mask: &HorizonMask) {
    #[allow(clippy::cast_possible_truncation)]
    let plot_data: Vec<(f32, f32)> = mask
        .entries
        .iter()
        .map(|entry| (entry.azimuth_deg as f32, entry.elevation_angle_deg as f32))
        .collect();
    Chart::new(300, 150, 0.0, 360.0)
        .lineplot(&Shape::Lines(&plot_data))
        .display();
}
