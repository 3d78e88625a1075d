use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::fs;
use anyhow::{Context, Result};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub input: InputConfig,
    #[serde(default)]
    pub summary: SummaryConfig,
    #[serde(default)]
    pub map: MapConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    pub data_csv: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SummaryConfig {
    pub preview_rows: usize,
    pub histogram_bins: usize,
    pub density_points: usize, // KDE grid resolution
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            preview_rows: 5,
            histogram_bins: 30,
            density_points: 200,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MapConfig {
    pub width: u32,
    pub height: u32,
    pub zoom_start: u8,
    pub marker_radius: f64,
    pub fill_opacity: f64,
    pub tile_url: String,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            width: 700,
            height: 500,
            zoom_start: 7,
            marker_radius: 5.0,
            fill_opacity: 0.7,
            tile_url: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OutputConfig {
    pub html: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            html: PathBuf::from("output/dashboard.html"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8501 }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content)
            .with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }

    /// Config with every default and the given input file.
    pub fn for_input(data_csv: impl Into<PathBuf>) -> Self {
        Self {
            input: InputConfig { data_csv: data_csv.into() },
            summary: SummaryConfig::default(),
            map: MapConfig::default(),
            output: OutputConfig::default(),
            server: ServerConfig::default(),
        }
    }
}
