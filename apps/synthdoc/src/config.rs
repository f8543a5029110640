use std::path::PathBuf;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::errors::SynthError;

/// Default cache budget in characters (256 Mi). Blocks are held as UTF-8 plus one
/// index word per 64 characters, so memory is about the blocks' byte size.
pub const DEFAULT_CACHE_SIZE: usize = 1 << 28;
/// Default block size in characters (1 Mi).
pub const DEFAULT_BLOCK_SIZE: usize = 1 << 20;

// ────────────────────────────────────────────────────────────────────────────
// Config sections
// ────────────────────────────────────────────────────────────────────────────

/// Corpus reader settings.
///
/// `cache_size / block_size` is the number of blocks kept in memory at once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    pub path: PathBuf,
    pub cache_size: usize,
    pub block_size: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        ReaderConfig {
            path: PathBuf::new(),
            cache_size: DEFAULT_CACHE_SIZE,
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }
}

/// Text box settings. `fill` is the `[min, max]` fraction of the box width a line may use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextBoxConfig {
    pub fill: [f64; 2],
}

impl Default for TextBoxConfig {
    fn default() -> Self {
        TextBoxConfig { fill: [1.0, 1.0] }
    }
}

/// Settings for the built-in row-stack layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RowStackConfig {
    /// `[min, max]` row height in pixels, drawn per group.
    pub line_height: [f64; 2],
    /// Top-to-top row distance as a multiple of the row height.
    pub line_spacing: f64,
    pub rows_per_group: [usize; 2],
}

impl Default for RowStackConfig {
    fn default() -> Self {
        RowStackConfig {
            line_height: [16.0, 48.0],
            line_spacing: 1.5,
            rows_per_group: [1, 4],
        }
    }
}

/// Content (text area) settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// `[min, max]` margin as a fraction of the page width/height, drawn per pass.
    pub margin: [f64; 2],
    pub text: ReaderConfig,
    pub textbox: TextBoxConfig,
    pub layout: RowStackConfig,
}

impl Default for ContentConfig {
    fn default() -> Self {
        ContentConfig {
            margin: [0.0, 0.1],
            text: ReaderConfig::default(),
            textbox: TextBoxConfig::default(),
            layout: RowStackConfig::default(),
        }
    }
}

/// Page-size sampling settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    /// Probability that the page covers the whole canvas.
    pub fullscreen: f64,
    /// Probability that a non-fullscreen page is landscape.
    pub landscape: f64,
    pub short_size: [u32; 2],
    pub aspect_ratio: [f64; 2],
    pub content: ContentConfig,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        DocumentConfig {
            fullscreen: 0.5,
            landscape: 0.5,
            short_size: [480, 1024],
            aspect_ratio: [1.0, 2.0],
            content: ContentConfig::default(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub document: DocumentConfig,
    /// Fixed RNG seed. `None` seeds from the OS.
    pub seed: Option<u64>,
}

// ────────────────────────────────────────────────────────────────────────────
// Validation
// ────────────────────────────────────────────────────────────────────────────

impl ReaderConfig {
    pub fn validate(&self) -> Result<(), SynthError> {
        if self.block_size == 0 {
            return Err(SynthError::InvalidConfig(
                "text.block_size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl TextBoxConfig {
    pub fn validate(&self) -> Result<(), SynthError> {
        let [lo, hi] = self.fill;
        if !(lo > 0.0 && hi <= 1.0 && lo <= hi) {
            return Err(SynthError::InvalidConfig(format!(
                "textbox.fill must satisfy 0 < min <= max <= 1, got [{lo}, {hi}]"
            )));
        }
        Ok(())
    }
}

impl RowStackConfig {
    pub fn validate(&self) -> Result<(), SynthError> {
        let [h_lo, h_hi] = self.line_height;
        if !(h_lo > 0.0 && h_lo <= h_hi) {
            return Err(SynthError::InvalidConfig(format!(
                "layout.line_height must satisfy 0 < min <= max, got [{h_lo}, {h_hi}]"
            )));
        }
        if self.line_spacing < 1.0 {
            return Err(SynthError::InvalidConfig(format!(
                "layout.line_spacing must be at least 1, got {}",
                self.line_spacing
            )));
        }
        let [r_lo, r_hi] = self.rows_per_group;
        if r_lo == 0 || r_lo > r_hi {
            return Err(SynthError::InvalidConfig(format!(
                "layout.rows_per_group must satisfy 0 < min <= max, got [{r_lo}, {r_hi}]"
            )));
        }
        Ok(())
    }
}

impl ContentConfig {
    pub fn validate(&self) -> Result<(), SynthError> {
        let [lo, hi] = self.margin;
        if !(0.0..0.5).contains(&lo) || !(0.0..0.5).contains(&hi) || lo > hi {
            return Err(SynthError::InvalidConfig(format!(
                "margin must satisfy 0 <= min <= max < 0.5, got [{lo}, {hi}]"
            )));
        }
        self.text.validate()?;
        self.textbox.validate()?;
        self.layout.validate()
    }
}

impl DocumentConfig {
    pub fn validate(&self) -> Result<(), SynthError> {
        for (name, p) in [("fullscreen", self.fullscreen), ("landscape", self.landscape)] {
            if !(0.0..=1.0).contains(&p) {
                return Err(SynthError::InvalidConfig(format!(
                    "{name} must be a probability in [0, 1], got {p}"
                )));
            }
        }
        let [s_lo, s_hi] = self.short_size;
        if s_lo == 0 || s_lo > s_hi {
            return Err(SynthError::InvalidConfig(format!(
                "short_size must satisfy 0 < min <= max, got [{s_lo}, {s_hi}]"
            )));
        }
        let [a_lo, a_hi] = self.aspect_ratio;
        if !(a_lo > 0.0 && a_lo <= a_hi) {
            return Err(SynthError::InvalidConfig(format!(
                "aspect_ratio must satisfy 0 < min <= max, got [{a_lo}, {a_hi}]"
            )));
        }
        self.content.validate()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Environment loader
// ────────────────────────────────────────────────────────────────────────────

impl Config {
    /// Loads configuration from environment variables (and `.env` if present).
    ///
    /// `SYNTHDOC_CORPUS` is required; `SYNTHDOC_CACHE_SIZE`, `SYNTHDOC_BLOCK_SIZE`
    /// and `SYNTHDOC_SEED` are optional. Everything else keeps its default.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let mut config = Config::default();
        let text = &mut config.document.content.text;
        text.path = PathBuf::from(require_env("SYNTHDOC_CORPUS")?);
        if let Some(size) = optional_env::<usize>("SYNTHDOC_CACHE_SIZE")? {
            text.cache_size = size;
        }
        if let Some(size) = optional_env::<usize>("SYNTHDOC_BLOCK_SIZE")? {
            text.block_size = size;
        }
        config.seed = optional_env::<u64>("SYNTHDOC_SEED")?;

        config
            .document
            .validate()
            .context("Configuration loaded from environment is invalid")?;
        Ok(config)
    }

    /// Random source for a generation run: seeded from `seed` when set, else from the OS.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env<T>(key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(None),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
