use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use tracing::warn;
use webplane_ui3d::PanelOptions;

pub const DEFAULT_CONFIG_PATH: &str = "config/webplane.toml";

const DEFAULT_MARKUP: &str = r#"<div width="320"><h1>webplane</h1><button method="save" width="160" height="48">Save</button><button method="load" width="160" height="48">Load</button></div>"#;

/// Headless demo session: one panel, a camera, and a script of host events.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Inline markup, used when `content_path` is unset or unreadable.
    pub content: String,
    /// HTML file to load instead of `content`, relative to the working directory.
    pub content_path: Option<String>,
    /// Method names wired to logging callbacks.
    pub methods: Vec<String>,
    pub panel: PanelOptions,
    pub panel_position: [f32; 3],
    pub camera_position: [f32; 3],
    /// RGBA fill painted by the demo rasterizer.
    pub fill: [u8; 4],
    pub duration_ms: u64,
    pub tick_ms: u64,
    pub images: Vec<ImageEvent>,
    pub clicks: Vec<ClickEvent>,
    pub resubmit: Vec<ResubmitEvent>,
}

/// Image `src` finishes loading (or fails) at `at_ms`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ImageEvent {
    pub at_ms: u64,
    pub src: String,
    #[serde(default = "default_true")]
    pub ok: bool,
}

/// Aim the camera at `target` and click at `at_ms`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ClickEvent {
    pub at_ms: u64,
    pub target: [f32; 3],
}

/// Replace the panel content at `at_ms`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ResubmitEvent {
    pub at_ms: u64,
    pub content: String,
}

fn default_true() -> bool {
    true
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            content: DEFAULT_MARKUP.to_string(),
            content_path: None,
            methods: vec!["save".to_string(), "load".to_string()],
            panel: PanelOptions::default(),
            panel_position: [0.0, 0.0, -1.0],
            camera_position: [0.0, 0.0, 0.0],
            fill: [240, 240, 240, 255],
            duration_ms: 1000,
            tick_ms: 16,
            images: Vec::new(),
            clicks: vec![ClickEvent {
                at_ms: 100,
                target: [-0.2, 0.04, -1.0],
            }],
            resubmit: Vec::new(),
        }
    }
}

impl DemoConfig {
    /// Load configuration from an explicit path, falling back to defaults on errors.
    pub fn load_from_path(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<DemoConfig>(&contents) {
                Ok(cfg) => cfg,
                Err(err) => {
                    warn!("Failed to parse {}: {err}. Using defaults", path.display());
                    DemoConfig::default()
                }
            },
            Err(err) => {
                if path != Path::new(DEFAULT_CONFIG_PATH)
                    || err.kind() != std::io::ErrorKind::NotFound
                {
                    warn!("Failed to read {}: {err}. Using defaults", path.display());
                } else {
                    warn!("Demo config not found at {}. Using defaults", path.display());
                }
                DemoConfig::default()
            }
        }
    }

    /// Save configuration to an explicit path.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let toml = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        Ok(())
    }

    /// Markup to show: the content file if set and readable, else `content`.
    pub fn markup(&self) -> String {
        let Some(path) = self.content_path.as_deref() else {
            return self.content.clone();
        };
        match fs::read_to_string(path) {
            Ok(markup) => markup,
            Err(err) => {
                warn!("Failed to read content {path}: {err}. Using inline content");
                self.content.clone()
            }
        }
    }
}
