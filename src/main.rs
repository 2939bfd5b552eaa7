mod app;
mod camera;
mod config;
mod hover;
mod input;
mod interaction;
mod motion;
mod noise_field;
mod pick;
mod render;
mod scene;
mod shader;

use anyhow::{Context, Result};
use clap::Parser;
use config::{load_settings, save_settings_atomic, settings_path, Args};
use std::{fs::File, path::Path};

fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(path) = &args.log_file {
        init_logging(path)?;
    }

    let path = settings_path(&args)?;
    let settings = load_settings(&path).with_overrides(&args);
    settings
        .validate()
        .with_context(|| format!("invalid settings ({})", path.display()))?;

    if args.write_config {
        save_settings_atomic(&path, &settings)?;
        println!("wrote {}", path.display());
        return Ok(());
    }

    app::run(settings)
}

/// The alternate screen owns stdout/stderr, so logs only ever go to a file.
fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("opening log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}
