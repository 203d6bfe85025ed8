//! Configuration for the signatory feed
//!
//! [`ClientConfig`] is the library-level configuration, loadable from TOML.
//! [`Args`] is the command line of the `signatory-feed` binary, with every
//! flag also readable from the environment.

use crate::error::{FeedError, Result};
use crate::feed::{ControllerConfig, MachineConfig};
use crate::signatory::VersionSchedule;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the manifesto site
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Roster size on the front page and after sign/unsign
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    /// Roster size on the full list page
    #[serde(default = "default_list_page_size")]
    pub list_page_size: u32,

    /// Shortest search term that triggers a query
    #[serde(default = "default_min_search_len")]
    pub min_search_len: usize,

    /// Controller mailbox depth
    #[serde(default = "default_mailbox_capacity")]
    pub mailbox_capacity: usize,

    /// Override for the manifesto version eras
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub versions: Option<VersionSchedule>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            default_page_size: default_page_size(),
            list_page_size: default_list_page_size(),
            min_search_len: default_min_search_len(),
            mailbox_capacity: default_mailbox_capacity(),
            versions: None,
        }
    }
}

impl ClientConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: ClientConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| FeedError::Config(format!("reading {}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(FeedError::Config(format!(
                "base_url must be an http(s) URL, got {:?}",
                self.base_url
            )));
        }
        if self.default_page_size == 0 || self.list_page_size == 0 {
            return Err(FeedError::Config("page sizes must be positive".into()));
        }
        if self.min_search_len == 0 {
            return Err(FeedError::Config(
                "min_search_len must be at least 1; an empty term reloads the listing".into(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(FeedError::Config("timeout_secs must be positive".into()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn version_schedule(&self) -> VersionSchedule {
        self.versions.clone().unwrap_or_default()
    }

    pub fn controller(&self) -> ControllerConfig {
        ControllerConfig {
            machine: MachineConfig {
                default_page_size: self.default_page_size,
                min_search_len: self.min_search_len,
            },
            list_page_size: self.list_page_size,
            mailbox_capacity: self.mailbox_capacity,
        }
    }
}

// Defaults
fn default_base_url() -> String { "https://www.reactivemanifesto.org".to_string() }
fn default_timeout_secs() -> u64 { 30 }
fn default_page_size() -> u32 { 30 }
fn default_list_page_size() -> u32 { 200 }
fn default_min_search_len() -> usize { 2 }
fn default_mailbox_capacity() -> usize { 64 }

/// signatory-feed - browse the Reactive Manifesto signatories
#[derive(Parser, Debug, Clone)]
#[command(name = "signatory-feed")]
#[command(about = "Browse, search and page through manifesto signatories")]
pub struct Args {
    /// Optional TOML config file; flags and env override it
    #[arg(long, env = "SIGNATORY_FEED_CONFIG")]
    pub config: Option<PathBuf>,

    /// Base URL of the manifesto site
    #[arg(long, env = "MANIFESTO_URL")]
    pub base_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print the number of signatories
    Total,
    /// Print the most recent signatories
    List {
        /// Load the long list instead of the front page roster
        #[arg(long)]
        full: bool,
    },
    /// Search signatories by name
    Search { term: String },
    /// Load the front page roster and follow up to N more pages
    Pages {
        #[arg(default_value = "1")]
        count: u32,
    },
    /// Show the current session user
    Whoami,
}

impl Args {
    /// Merge the config file (if any) with flag and env overrides
    pub fn client_config(&self) -> Result<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => ClientConfig::load(path)?,
            None => ClientConfig::default(),
        };
        if let Some(url) = &self.base_url {
            config.base_url = url.clone();
        }
        if let Some(secs) = self.timeout_secs {
            config.timeout_secs = secs;
        }
        config.validate()?;
        Ok(config)
    }
}
