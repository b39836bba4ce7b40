use crate::model::{Rules, Variant};
use anyhow::{Context, Result};
use clap::Parser;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Settings {
    pub(crate) variant: Variant,
    pub(crate) fps_cap: u32,
    pub(crate) enable_color: bool,
    /// Blink schedule seed; entropy when absent.
    pub(crate) seed: Option<u64>,
    pub(crate) log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            variant: Variant::Classic,
            fps_cap: 30,
            enable_color: true,
            seed: None,
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    pub(crate) fn rules(&self) -> Rules {
        Rules::for_variant(self.variant)
    }

    pub(crate) fn fps(&self) -> u32 {
        self.fps_cap.clamp(10, 240)
    }

    pub(crate) fn apply_args(&mut self, args: &Args) {
        if let Some(v) = args.variant {
            self.variant = v;
        }
        if let Some(seed) = args.seed {
            self.seed = Some(seed);
        }
        if let Some(fps) = args.fps {
            self.fps_cap = fps;
        }
        if args.no_color {
            self.enable_color = false;
        }
        if let Some(level) = &args.log_level {
            self.log_level = level.clone();
        }
    }
}

/// DIGI-CAT: keep your terminal cat fed and happy.
#[derive(Parser, Debug)]
#[command(version)]
pub(crate) struct Args {
    /// game variant (quick = faster decay, no dance)
    #[arg(long, value_enum)]
    pub(crate) variant: Option<Variant>,

    /// seed for the blink timing
    #[arg(long)]
    pub(crate) seed: Option<u64>,

    /// frame cap (10..=240)
    #[arg(long)]
    pub(crate) fps: Option<u32>,

    /// monochrome output
    #[arg(long)]
    pub(crate) no_color: bool,

    /// settings file (defaults to the per-user data dir)
    #[arg(long)]
    pub(crate) config: Option<PathBuf>,

    /// log filter, e.g. "debug" or "digicat=trace"
    #[arg(long)]
    pub(crate) log_level: Option<String>,
}

pub(crate) struct Paths {
    pub(crate) settings_path: PathBuf,
    pub(crate) log_path: PathBuf,
}

pub(crate) fn project_paths() -> Result<Paths> {
    let proj = ProjectDirs::from("com", "digicat", "DigiCat")
        .context("could not resolve project directories")?;
    let dir = proj.data_local_dir().to_path_buf();
    fs::create_dir_all(&dir)
        .with_context(|| format!("could not create {}", dir.display()))?;
    Ok(Paths {
        settings_path: dir.join("settings.json"),
        log_path: dir.join("digicat.log"),
    })
}

/// Reads settings, falling back to defaults when the file is missing or
/// malformed. Returns the parse error, if any, so it can be logged once
/// the subscriber is up.
pub(crate) fn load_settings(path: &Path) -> (Settings, Option<String>) {
    match fs::read_to_string(path) {
        Ok(s) => parse_settings(&s),
        Err(_) => (Settings::default(), None),
    }
}

fn parse_settings(s: &str) -> (Settings, Option<String>) {
    match serde_json::from_str::<Settings>(s) {
        Ok(v) => (v, None),
        Err(e) => (Settings::default(), Some(e.to_string())),
    }
}

/// File logger; stdout belongs to the terminal UI. `RUST_LOG` wins over
/// the configured level.
pub(crate) fn init_logging(path: &Path, level: &str) -> Result<()> {
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("could not open log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|e| anyhow::anyhow!("could not install logger: {e}"))?;
    Ok(())
}

pub(crate) fn resolve(args: &Args) -> Result<Settings> {
    let paths = project_paths()?;
    let settings_path = args
        .config
        .clone()
        .unwrap_or_else(|| paths.settings_path.clone());
    let (mut settings, parse_error) = load_settings(&settings_path);
    settings.apply_args(args);
    init_logging(&paths.log_path, &settings.log_level)?;
    if let Some(err) = parse_error {
        warn!(path = %settings_path.display(), %err, "bad settings file, using defaults");
    }
    Ok(settings)
}
