use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info};

use chromamarch::{Config, Result};

mod cli;
mod logger;
mod output;

use cli::Args;
use logger::init_logger;
use output::{save_image, send_image_to_tev, OutputFormat};

/// Load the configuration file, or the defaults when it does not exist.
fn load_config(args: &Args) -> Result<Config> {
    let path = Path::new(&args.config);
    let mut config = if path.exists() {
        Config::load(path)?
    } else {
        info!("No configuration at {}, using built-in defaults", path.display());
        Config::default()
    };

    if let Some(width) = args.width {
        config.render.width = width;
    }
    if let Some(height) = args.height {
        config.render.height = height;
    }
    if let Some(frames) = args.frames {
        config.render.frames = frames;
    }
    config.validate()?;
    Ok(config)
}

fn run(args: &Args, format: OutputFormat) -> Result<()> {
    let config = load_config(args)?;
    let renderer = config.build_renderer()?;

    let render = &config.render;
    info!(
        "Image resolution: {}x{}, frames: {}, max bounces: {}",
        render.width, render.height, render.frames, render.max_bounces
    );
    let image = renderer.render_progressive(
        render.width,
        render.height,
        render.frames,
        args.seed_time,
        render.time_step,
    );

    if args.tev || args.tev_address.is_some() {
        let tev_address = args.tev_address.as_deref().unwrap_or("localhost:14158");
        send_image_to_tev(&image, tev_address);
    }
    save_image(&image, &args.output, format);
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    init_logger(args.debug_level.clone().into());

    info!("ChromaMarch - Git Version {} ({})", env!("GIT_HASH"), env!("GIT_DATE"));

    let Some(format) = OutputFormat::from_path(&args.output) else {
        error!(
            "Unsupported file extension '{}'. Only .png and .exr formats are supported.",
            Path::new(&args.output).extension().unwrap_or_default().to_string_lossy()
        );
        return ExitCode::FAILURE;
    };

    match run(&args, format) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
