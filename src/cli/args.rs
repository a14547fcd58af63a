//! CLI argument definitions using Clap

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::recording::Duration;

/// Emotion Recorder - classify the emotion in your voice
#[derive(Parser, Debug)]
#[command(name = "emotion-recorder")]
#[command(version)]
#[command(about = "Record speech and classify its emotion using a remote inference server")]
#[command(long_about = None)]
pub struct Cli {
    /// Inference endpoint URL
    #[arg(short = 'e', long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Upload timeout (e.g., 30s, 1m)
    #[arg(short = 't', long, value_name = "TIME")]
    pub timeout: Option<String>,

    /// Stop recording automatically after this long (e.g., 30s, 2m)
    #[arg(short = 'm', long, value_name = "TIME")]
    pub max_duration: Option<String>,

    /// Replay an audio file instead of recording from the microphone
    #[arg(short = 'i', long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Run a single record/classify cycle, starting immediately, then exit
    #[arg(long)]
    pub once: bool,

    /// Verbose logging to stderr
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Config subcommand
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Parsed options for a recording run
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub endpoint: String,
    pub upload_timeout: Duration,
    pub max_duration: Duration,
    pub chunk_interval: Duration,
    pub input: Option<PathBuf>,
    pub once: bool,
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &["endpoint", "timeout", "max_duration", "chunk_interval"];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}
