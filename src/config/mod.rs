//! Configuration management for replbridge
//!
//! Engine selection, engine options, terminal presentation and plot device
//! defaults, loaded from TOML with sensible fallbacks.

pub mod loader;

pub use loader::ConfigLoader;

use serde::{Deserialize, Serialize};

/// Which concrete engine adapter a session should use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// Runs in the same execution context as the caller; blocking-style
    /// read loop with cooperative suspension
    #[default]
    Embedded,
    /// Runs on a dedicated worker reachable only through an asynchronous
    /// request/response channel
    Isolated,
}

impl EngineKind {
    /// Stable tag used in configuration files and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::Embedded => "embedded",
            EngineKind::Isolated => "isolated",
        }
    }
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EngineKind {
    type Err = crate::error::Error;

    /// Parse the configuration tag, e.g. from an embedder-supplied override
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "embedded" => Ok(EngineKind::Embedded),
            "isolated" => Ok(EngineKind::Isolated),
            other => Err(crate::error::Error::UnknownEngineKind {
                tag: other.to_string(),
            }),
        }
    }
}

/// Main configuration structure for replbridge
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Engine selection and options
    #[serde(default)]
    pub engine: EngineConfig,

    /// Terminal presentation configuration
    #[serde(default)]
    pub terminal: TerminalConfig,

    /// Plot device configuration
    #[serde(default)]
    pub plot: PlotConfig,
}

/// Engine-specific options bag
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Which adapter to construct
    #[serde(default)]
    pub kind: EngineKind,

    /// Extension packages side-loaded after init
    #[serde(default)]
    pub packages: Vec<String>,

    /// Base URL for engine runtime assets, when the runtime fetches them
    #[serde(default)]
    pub base_url: Option<String>,

    /// Prompt text presented when the engine requests input
    #[serde(default = "default_prompt")]
    pub prompt: String,
}

fn default_prompt() -> String {
    "> ".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            kind: EngineKind::Embedded,
            packages: Vec::new(),
            base_url: None,
            prompt: default_prompt(),
        }
    }
}

/// Terminal presentation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalConfig {
    /// Placeholder shown while the engine downloads/initializes
    pub loading_message: String,

    /// Wrap stderr lines in a highlight escape sequence
    pub highlight_stderr: bool,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            loading_message: "Engine is downloading, please wait...".to_string(),
            highlight_stderr: true,
        }
    }
}

/// Plot device configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    /// Width in pixels used for newly created graphics pages
    pub width: u32,

    /// Height in pixels used for newly created graphics pages
    pub height: u32,
}

impl Default for PlotConfig {
    fn default() -> Self {
        // Matches the default figure size of the canvas graphics device
        Self {
            width: 504,
            height: 504,
        }
    }
}
