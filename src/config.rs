//! Pipeline configuration
//!
//! One immutable [`PipelineConfig`] is built from the CLI arguments at startup
//! and passed by reference into each component's constructor. It is never
//! mutated for the lifetime of an invocation.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// One or more required settings are absent for the requested command.
    /// Carries the exact list of missing settings so the operator can see
    /// which flags to supply.
    #[error("missing required settings: {}", .0.join(", "))]
    MissingSettings(Vec<&'static str>),
}

impl ConfigError {
    /// The individual missing settings, if any
    pub fn missing(&self) -> &[&'static str] {
        match self {
            ConfigError::MissingSettings(items) => items,
        }
    }
}

/// Output format for the compiled mapping artifacts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Wasm,
    Wast,
}

impl OutputFormat {
    /// File extension used for compiled mapping artifacts
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Wasm => "wasm",
            OutputFormat::Wast => "wast",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Immutable configuration for one pipeline invocation
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Path to the subgraph manifest
    pub manifest: PathBuf,

    /// Output directory for build artifacts
    pub output_dir: PathBuf,

    /// Output format for compiled mappings
    pub output_format: OutputFormat,

    /// IPFS node used for uploading the build artifact
    pub ipfs: Option<String>,

    /// Graph node that accepts deploy registrations
    pub node: Option<String>,

    /// Name the subgraph is registered under
    pub subgraph_name: Option<String>,

    /// API key corresponding to the subgraph name
    pub api_key: Option<String>,

    /// Log level requested on the command line (info|verbose|debug)
    pub verbosity: Option<String>,

    /// Rebuild (and redeploy) automatically when files change
    pub watch: bool,
}

/// Borrowed view of the settings the deploy command requires.
///
/// The IPFS endpoint is validated for presence alongside these but stays on
/// the config itself, where the compiler picks it up.
#[derive(Debug, Clone, Copy)]
pub struct DeploySettings<'a> {
    pub subgraph_name: &'a str,
    pub node: &'a str,
}

impl PipelineConfig {
    /// Validates the preconditions of the deploy command.
    ///
    /// Subgraph name, Graph node address, and IPFS node must all be present.
    /// Returns a [`ConfigError::MissingSettings`] naming every absent setting,
    /// so the operator learns about all of them at once.
    pub fn deploy_settings(&self) -> Result<DeploySettings<'_>, ConfigError> {
        let mut missing = Vec::new();
        if self.subgraph_name.is_none() {
            missing.push("subgraph name (-n/--subgraph-name)");
        }
        if self.node.is_none() {
            missing.push("Graph node (-g/--node)");
        }
        if self.ipfs.is_none() {
            missing.push("IPFS node (-i/--ipfs)");
        }
        if !missing.is_empty() {
            return Err(ConfigError::MissingSettings(missing));
        }

        Ok(DeploySettings {
            subgraph_name: self.subgraph_name.as_deref().unwrap_or_default(),
            node: self.node.as_deref().unwrap_or_default(),
        })
    }
}

impl fmt::Display for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Configuration:")?;
        writeln!(f, "  Subgraph manifest: {}", self.manifest.display())?;
        writeln!(f, "  Output directory:  {}", self.output_dir.display())?;
        writeln!(f, "  Output format:     {}", self.output_format)?;
        match &self.subgraph_name {
            Some(name) => writeln!(f, "  Subgraph name: {}", name)?,
            None => writeln!(f, "  Subgraph name: No name defined with -n/--subgraph-name")?,
        }
        match &self.node {
            Some(node) => writeln!(f, "  Graph node:    {}", node)?,
            None => writeln!(f, "  Graph node:    No node defined with -g/--node")?,
        }
        match &self.ipfs {
            Some(ipfs) => writeln!(f, "  IPFS:          {}", ipfs)?,
            None => writeln!(f, "  IPFS:          No node defined with -i/--ipfs")?,
        }
        Ok(())
    }
}
