// src/config/model.rs

use serde::Deserialize;

use crate::types::{ParallelFailureBehaviour, TriggerWhileRunningBehaviour};

/// Configuration as read from `Assetflow.toml`, before validation.
///
/// ```toml
/// [config]
/// parallel_failure = "cancel"
/// triggered_while_running_behaviour = "queue"
/// queue_length = 1
///
/// [server]
/// port = 3000
///
/// [transforms]
/// less = "lessc --include-path=app/styles/less -"
/// ```
///
/// Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub watch: WatchSection,
    #[serde(default)]
    pub transforms: TransformsSection,
}

/// Validated configuration. Build it through `TryFrom<RawConfigFile>`.
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub server: ServerSection,
    pub watch: WatchSection,
    pub transforms: TransformsSection,
}

impl ConfigFile {
    /// Internal constructor used by validation.
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            config: raw.config,
            server: raw.server,
            watch: raw.watch,
            transforms: raw.transforms,
        }
    }
}

/// `[config]` section: task-runner behaviour.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConfigSection {
    /// What a parallel composite does with its siblings when a child fails.
    pub parallel_failure: ParallelFailureBehaviour,

    /// `"queue"` (default) or `"cancel"`; applies to watch-triggered runs.
    pub triggered_while_running_behaviour: TriggerWhileRunningBehaviour,

    /// Maximum number of queued watch runs.
    pub queue_length: usize,
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            parallel_failure: ParallelFailureBehaviour::default(),
            triggered_while_running_behaviour: TriggerWhileRunningBehaviour::default(),
            queue_length: 1,
        }
    }
}

/// `[server]` section: the live-reload dev server.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub host: String,
    /// `0` picks an ephemeral port.
    pub port: u16,
    /// Change bursts within this window produce one reload.
    pub debounce_ms: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            debounce_ms: 100,
        }
    }
}

/// `[watch]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WatchSection {
    /// Only trigger a binding when the content hash of its files changed.
    pub use_hash: bool,
}

/// `[transforms]` section: shell commands for the external content steps.
///
/// Each command reads a file on stdin and writes the result to stdout. An
/// empty command disables the step.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TransformsSection {
    pub less: String,
    pub autoprefixer: String,
    pub cssnano: String,
    pub babel: String,
    pub uglify: String,
    pub imagemin: String,
    /// Target browsers for the prefixer, passed as `BROWSERSLIST`.
    pub browsers: Vec<String>,
}

pub const DEFAULT_BROWSERS: &[&str] = &[
    "last 10 Chrome versions",
    "last 10 Firefox versions",
    "last 2 Safari versions",
    "ie >= 10",
    "iOS >= 7",
    "Android >= 4.2",
];

impl TransformsSection {
    /// Every step disabled; handy for projects (and tests) that only need
    /// the concatenation pipeline.
    pub fn identity() -> Self {
        Self {
            less: String::new(),
            autoprefixer: String::new(),
            cssnano: String::new(),
            babel: String::new(),
            uglify: String::new(),
            imagemin: String::new(),
            browsers: Vec::new(),
        }
    }
}

impl Default for TransformsSection {
    fn default() -> Self {
        Self {
            less: "lessc --include-path=app/styles/less -".to_string(),
            autoprefixer: "npx postcss --use autoprefixer --no-map".to_string(),
            cssnano: "npx postcss --use cssnano --no-map".to_string(),
            babel: "npx babel --presets es2015".to_string(),
            uglify: "npx uglifyjs --compress --mangle".to_string(),
            imagemin: "npx imagemin".to_string(),
            browsers: DEFAULT_BROWSERS.iter().map(|s| s.to_string()).collect(),
        }
    }
}
