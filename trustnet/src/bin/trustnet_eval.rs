// TrustNet evaluation binary
// Scores a target identity with one or more TSL plugins against an
// in-memory graph fixture, printing the report as JSON.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;

use trustnet::handlers::register_builtin_handlers;
use trustnet::memory::{self, MemoryRelayDirectory, MemorySocialGraph, StaticResolver};
use trustnet::{
    CapabilityExecutor, CapabilityRegistry, EnablementPolicy, EngineConfig, Identity, Plugin,
    RoundRunner,
};

#[derive(Parser)]
#[command(name = "trustnet-eval")]
#[command(about = "Evaluate trust-scoring plugins for a target identity")]
#[command(version)]
struct Args {
    /// Plugin source files (TSL)
    #[arg(value_name = "PLUGIN", required = true)]
    plugins: Vec<PathBuf>,

    /// Target identity to score
    #[arg(short, long)]
    target: String,

    /// Source identity the scores are computed for (the viewer)
    #[arg(short, long)]
    source: Option<String>,

    /// Engine configuration file (TOML)
    #[arg(short, long, env = "TRUSTNET_CONFIG")]
    config: Option<PathBuf>,

    /// Graph fixture (JSON with follows, relays and aliases tables)
    #[arg(short, long)]
    graph: Option<PathBuf>,

    /// Force a capability on, overriding configuration
    #[arg(long = "enable", value_name = "CAPABILITY")]
    enable: Vec<String>,

    /// Force a capability off, overriding configuration
    #[arg(long = "disable", value_name = "CAPABILITY")]
    disable: Vec<String>,
}

/// On-disk shape of the `--graph` fixture.
#[derive(Debug, Default, Deserialize)]
struct GraphFixture {
    #[serde(default)]
    follows: HashMap<String, Vec<String>>,
    #[serde(default)]
    relays: HashMap<String, Vec<String>>,
    #[serde(default)]
    aliases: HashMap<String, String>,
}

impl GraphFixture {
    fn load(path: &PathBuf) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading graph fixture {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("parsing graph fixture {}", path.display()))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Route log records through tracing, honoring RUST_LOG.
    let _ = tracing_log::LogTracer::init();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_ansi(false)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EngineConfig::from_path(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    let fixture = match &args.graph {
        Some(path) => GraphFixture::load(path)?,
        None => GraphFixture::default(),
    };
    let mut graph = MemorySocialGraph::new();
    for (from, followed) in &fixture.follows {
        for to in followed {
            graph.add_follow(from, to);
        }
    }
    let mut relays = MemoryRelayDirectory::new();
    for (identity, relay_list) in &fixture.relays {
        for relay in relay_list {
            relays.add_relay(identity, relay);
        }
    }
    let mut resolver = StaticResolver::new();
    for (alias, identity) in &fixture.aliases {
        resolver.insert(alias, identity);
    }
    let collaborators = memory::collaborators(graph, relays, resolver);

    let mut registry = CapabilityRegistry::new();
    register_builtin_handlers(&mut registry);
    log::debug!(
        "registered capabilities: {}",
        registry.capability_names().join(", ")
    );

    let enablement = Arc::new(EnablementPolicy::from_layers(&config.capabilities));
    for name in &args.enable {
        enablement.set_override(name, true);
    }
    for name in &args.disable {
        enablement.set_override(name, false);
    }

    let executor = Arc::new(CapabilityExecutor::new(registry, enablement));
    let runner = RoundRunner::new(executor, config.engine_policy());

    let mut plugins = Vec::with_capacity(args.plugins.len());
    for path in &args.plugins {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("reading plugin {}", path.display()))?;
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_else(|| "plugin".to_string());
        // Plugins loaded from local files count as operator-trusted.
        plugins.push(
            Plugin::new(
                name.clone(),
                args.source.as_deref().unwrap_or("local"),
                name,
                source,
            )
            .with_trusted(true),
        );
    }

    let report = runner
        .run_all(
            &plugins,
            Identity::new(&args.target),
            args.source.as_deref().map(Identity::new),
            &collaborators,
        )
        .await;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
