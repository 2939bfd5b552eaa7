use crate::hover::HoverTuning;
use crate::motion::MotionTuning;
use crate::render::RenderMode;
use anyhow::{Context, Result};
use clap::Parser;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Parser, Debug)]
#[command(about = "Two glass spheres you can grab, spin and throw")]
pub(crate) struct Args {
    /// settings file (defaults to the per-user config dir)
    #[arg(long)]
    pub(crate) config: Option<PathBuf>,

    /// frame cap
    #[arg(long)]
    pub(crate) fps: Option<u32>,

    /// objects follow the pointer 1:1 with no glide
    #[arg(long)]
    pub(crate) no_inertia: bool,

    /// disable film grain
    #[arg(long)]
    pub(crate) no_grain: bool,

    /// braille dots instead of half blocks
    #[arg(long)]
    pub(crate) braille: bool,

    /// start with the HUD hidden
    #[arg(long)]
    pub(crate) no_hud: bool,

    /// write logs here (RUST_LOG sets the filter)
    #[arg(long)]
    pub(crate) log_file: Option<PathBuf>,

    /// save the effective settings and exit
    #[arg(long)]
    pub(crate) write_config: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Settings {
    pub(crate) fps_cap: u32,
    pub(crate) inertia: bool,
    pub(crate) friction: f32,
    pub(crate) settle_epsilon: f32,
    pub(crate) rotate_sensitivity: f32,
    pub(crate) move_sensitivity: f32,
    pub(crate) depth_sensitivity: f32,
    pub(crate) hover_smoothing: f32,
    pub(crate) hover_time_step: f32,
    pub(crate) grain: bool,
    pub(crate) render_mode: RenderMode,
    pub(crate) noise_seed: u32,
    pub(crate) show_hud: bool,
}

impl Default for Settings {
    fn default() -> Self {
        let motion = MotionTuning::default();
        let hover = HoverTuning::default();
        Self {
            fps_cap: 60,
            inertia: motion.inertia,
            friction: motion.friction,
            settle_epsilon: motion.epsilon,
            rotate_sensitivity: motion.rotate_sensitivity,
            move_sensitivity: motion.move_sensitivity,
            depth_sensitivity: motion.depth_sensitivity,
            hover_smoothing: hover.smoothing,
            hover_time_step: hover.time_step,
            grain: true,
            render_mode: RenderMode::HalfBlock,
            noise_seed: 0,
            show_hud: true,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub(crate) enum ConfigError {
    #[error("friction must be in (0, 1), got {0}")]
    Friction(f32),
    #[error("settle epsilon must be positive, got {0}")]
    Epsilon(f32),
    #[error("hover smoothing must be in (0, 1], got {0}")]
    HoverSmoothing(f32),
    #[error("fps cap must be in [10, 240], got {0}")]
    Fps(u32),
}

impl Settings {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if !(self.friction > 0.0 && self.friction < 1.0) {
            return Err(ConfigError::Friction(self.friction));
        }
        if !(self.settle_epsilon > 0.0) {
            return Err(ConfigError::Epsilon(self.settle_epsilon));
        }
        if !(self.hover_smoothing > 0.0 && self.hover_smoothing <= 1.0) {
            return Err(ConfigError::HoverSmoothing(self.hover_smoothing));
        }
        if !(10..=240).contains(&self.fps_cap) {
            return Err(ConfigError::Fps(self.fps_cap));
        }
        Ok(())
    }

    /// CLI flags win over file values. Flags only ever switch things off
    /// (or to braille), so an absent flag leaves the file value alone.
    pub(crate) fn with_overrides(mut self, args: &Args) -> Self {
        if let Some(fps) = args.fps {
            self.fps_cap = fps;
        }
        if args.no_inertia {
            self.inertia = false;
        }
        if args.no_grain {
            self.grain = false;
        }
        if args.braille {
            self.render_mode = RenderMode::Braille;
        }
        if args.no_hud {
            self.show_hud = false;
        }
        self
    }

    pub(crate) fn motion_tuning(&self) -> MotionTuning {
        MotionTuning {
            friction: self.friction,
            epsilon: self.settle_epsilon,
            rotate_sensitivity: self.rotate_sensitivity,
            move_sensitivity: self.move_sensitivity,
            depth_sensitivity: self.depth_sensitivity,
            inertia: self.inertia,
        }
    }

    pub(crate) fn hover_tuning(&self) -> HoverTuning {
        HoverTuning {
            smoothing: self.hover_smoothing,
            time_step: self.hover_time_step,
            epsilon: self.settle_epsilon,
        }
    }
}

pub(crate) fn default_settings_path() -> Result<PathBuf> {
    let proj = ProjectDirs::from("com", "glass-spheres", "GlassSpheres")
        .context("could not resolve project directories")?;
    Ok(proj.config_dir().join("settings.json"))
}

pub(crate) fn settings_path(args: &Args) -> Result<PathBuf> {
    match &args.config {
        Some(p) => Ok(p.clone()),
        None => default_settings_path(),
    }
}

/// Missing or unreadable files fall back to defaults.
pub(crate) fn load_settings(path: &Path) -> Settings {
    match fs::read_to_string(path) {
        Ok(s) => match serde_json::from_str::<Settings>(&s) {
            Ok(v) => v,
            Err(e) => {
                log::warn!("ignoring {}: {e}", path.display());
                Settings::default()
            }
        },
        Err(_) => Settings::default(),
    }
}

pub(crate) fn save_settings_atomic(path: &Path, s: &Settings) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_vec_pretty(s)?;
    fs::write(&tmp, data).with_context(|| format!("writing {}", tmp.display()))?;
    atomic_rename(&tmp, path)?;
    Ok(())
}

fn atomic_rename(from: &Path, to: &Path) -> Result<()> {
    // rename over an existing file fails on some platforms
    if to.exists() {
        let _ = fs::remove_file(to);
    }
    fs::rename(from, to).with_context(|| format!("renaming to {}", to.display()))?;
    Ok(())
}
