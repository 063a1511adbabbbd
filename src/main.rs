//! CLI wrapper: load a kinematic profile and a move history, print the
//! estimated plot time.

use clap::Parser;
use plotsim::{Waypoint, estimate_plot_time, load_config};

#[derive(Parser, Debug)]
#[command(name = "plotsim", about = "Estimate pen plotter draw time without hardware")]
struct Args {
    /// Kinematic profile TOML.
    #[arg(short, long, default_value = "plotter.toml")]
    config: String,

    /// Move history: a JSON array of {x, y, pen_down} waypoints.
    moves: String,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    tracing::info!("Loading kinematic profile from: {}", args.config);
    let config = load_config(&args.config)?;

    let moves = std::fs::read_to_string(&args.moves)?;
    let history: Vec<Waypoint> = serde_json::from_str(&moves)?;
    tracing::info!("Loaded {} waypoints from {}", history.len(), args.moves);

    let seconds = estimate_plot_time(&history, &config.plotter);
    tracing::info!("Estimated plot time: {:.1}s", seconds);
    println!("{seconds:.3}");

    Ok(())
}
