use crate::config::{OutputFormat, PipelineConfig};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Compiles subgraph manifests and deploys them to a Graph node
#[derive(Parser, Debug)]
#[command(
    name = "graphpack",
    about = "Compiles subgraph manifests and deploys them to a Graph node",
    version,
    long_about = "graphpack brings a subgraph manifest forward across mapping-API \
                  revisions, compiles it into a build artifact, uploads the artifact \
                  to IPFS, and registers it with a Graph node over JSON-RPC. Both \
                  one-shot and continuous watch modes are supported."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(
        long,
        global = true,
        value_name = "LEVEL",
        help = "The log level to use (info|verbose|debug, default: LOG_LEVEL or info)"
    )]
    pub verbosity: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Compiles a subgraph and uploads it to IPFS",
        long_about = "Applies pending manifest migrations, compiles the subgraph, and \
                      uploads the build artifact to IPFS when a node is configured.\n\n\
                      Examples:\n  \
                      graphpack build subgraph.yaml\n  \
                      graphpack build subgraph.yaml --watch\n  \
                      graphpack build subgraph.yaml -i localhost:5001"
    )]
    Build(BuildArgs),

    #[command(
        about = "Deploys the subgraph to a Graph node",
        long_about = "Compiles the subgraph, uploads it to IPFS, and registers it with \
                      a Graph node. Requires --subgraph-name, --node, and --ipfs.\n\n\
                      Examples:\n  \
                      graphpack deploy subgraph.yaml -n user/subgraph -g http://localhost:8020 -i localhost:5001\n  \
                      graphpack deploy subgraph.yaml -n user/subgraph -g https://node.example.com -i localhost:5001 --watch"
    )]
    Deploy(DeployArgs),
}

#[derive(Args, Debug, Clone)]
pub struct BuildArgs {
    #[arg(value_name = "SUBGRAPH-MANIFEST", help = "Path to the subgraph manifest")]
    pub manifest: PathBuf,

    #[arg(
        short = 'o',
        long,
        value_name = "PATH",
        default_value = "dist",
        help = "Output directory for build artifacts"
    )]
    pub output_dir: PathBuf,

    #[arg(
        short = 't',
        long,
        value_enum,
        default_value = "wasm",
        help = "Output format (wasm, wast)"
    )]
    pub output_format: OutputFormatArg,

    #[arg(
        short = 'i',
        long,
        value_name = "ADDR",
        help = "IPFS node to use for uploading files"
    )]
    pub ipfs: Option<String>,

    #[arg(short = 'w', long, help = "Rebuild automatically when files change")]
    pub watch: bool,
}

#[derive(Args, Debug, Clone)]
pub struct DeployArgs {
    #[command(flatten)]
    pub build: BuildArgs,

    #[arg(
        short = 'g',
        long,
        value_name = "URL[:PORT]",
        help = "Graph node to deploy to"
    )]
    pub node: Option<String>,

    #[arg(
        short = 'n',
        long = "subgraph-name",
        value_name = "NAME",
        help = "Subgraph name"
    )]
    pub subgraph_name: Option<String>,

    #[arg(
        long = "api-key",
        value_name = "KEY",
        help = "Graph API key corresponding to the subgraph name"
    )]
    pub api_key: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Wasm,
    Wast,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Wasm => OutputFormat::Wasm,
            OutputFormatArg::Wast => OutputFormat::Wast,
        }
    }
}

impl BuildArgs {
    /// Builds the immutable pipeline configuration for a build invocation
    pub fn to_config(&self, verbosity: Option<&str>) -> PipelineConfig {
        PipelineConfig {
            manifest: self.manifest.clone(),
            output_dir: self.output_dir.clone(),
            output_format: self.output_format.into(),
            ipfs: self.ipfs.clone(),
            node: None,
            subgraph_name: None,
            api_key: None,
            verbosity: verbosity.map(str::to_string),
            watch: self.watch,
        }
    }
}

impl DeployArgs {
    /// Builds the immutable pipeline configuration for a deploy invocation
    pub fn to_config(&self, verbosity: Option<&str>) -> PipelineConfig {
        PipelineConfig {
            node: self.node.clone(),
            subgraph_name: self.subgraph_name.clone(),
            api_key: self.api_key.clone(),
            ..self.build.to_config(verbosity)
        }
    }
}
