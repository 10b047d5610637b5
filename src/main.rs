use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use registry_relocator::oci::{
    replace_image_ref_prefix, ImageSuffix, LocalImageReference, NamespaceMapping,
};
use registry_relocator::restore::{
    action_for_kind, RegistryAnnotations, RestoreContext, RestoreItemAction,
};
use registry_relocator::settings::Settings;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decompose an image reference of the form registry/namespace/name[:tag|@digest]
    Parse {
        /// Image reference to parse
        reference: String,
        /// Registry the reference must point into
        #[arg(long)]
        registry: String,
    },
    /// Move an image reference to a different registry
    Rewrite {
        /// Image reference to rewrite
        reference: String,
        /// Registry prefix the reference currently uses
        #[arg(long)]
        from: String,
        /// Registry prefix to replace it with
        #[arg(long)]
        to: String,
        /// Namespace translation (format: "old=new", repeatable)
        #[arg(long = "namespace-map", value_parser = parse_mapping)]
        namespace_map: Vec<(String, String)>,
    },
    /// Relocate the container images of a workload manifest (YAML or JSON)
    Restore {
        /// Manifest file, or "-" to read from stdin
        manifest: String,
        /// Configuration file (toml, yaml or yml)
        #[arg(long, short)]
        config: Option<PathBuf>,
        /// Namespace translation (format: "old=new", repeatable), overrides config
        #[arg(long = "namespace-map", value_parser = parse_mapping)]
        namespace_map: Vec<(String, String)>,
    },
    /// Check configuration for errors and unused options
    CheckConfig {
        /// Configuration file (toml, yaml or yml)
        #[arg(long, short)]
        config: Option<PathBuf>,
    },
}

fn parse_mapping(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((from, to)) if !from.is_empty() && !to.is_empty() => {
            Ok((from.to_string(), to.to_string()))
        }
        _ => Err(format!("expected 'old=new', got '{}'", s)),
    }
}

fn read_manifest(manifest: &str) -> Result<String> {
    if manifest == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read manifest from stdin")?;
        Ok(buf)
    } else {
        std::fs::read_to_string(manifest)
            .with_context(|| format!("Failed to read manifest {}", manifest))
    }
}

fn handle_restore(
    manifest: &str,
    config: Option<PathBuf>,
    namespace_map: Vec<(String, String)>,
) -> Result<()> {
    let settings = Settings::new(config.as_deref()).context("Failed to load configuration")?;

    let mut ctx = RestoreContext {
        namespace_mapping: settings.namespace_mapping.clone(),
    };
    ctx.namespace_mapping.extend(namespace_map);

    // YAML is a superset of JSON, so one parser handles both
    let item: serde_json::Value =
        serde_yaml::from_str(&read_manifest(manifest)?).context("Failed to parse manifest")?;

    let Some(kind) = item.get("kind").and_then(|k| k.as_str()) else {
        bail!("Manifest has no 'kind' field");
    };
    let annotations = RegistryAnnotations::from(&settings.annotations);
    let action = action_for_kind(kind, &annotations)?;
    info!("Restoring {} ({})", kind, action.applies_to().included_resources.join(","));

    let updated = action.execute(item, &ctx)?;
    print!("{}", serde_yaml::to_string(&updated)?);
    Ok(())
}

fn main() -> Result<()> {
    // Logs go to stderr so rewritten manifests can be piped from stdout
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Parse {
            reference,
            registry,
        } => {
            let parsed = LocalImageReference::parse(&reference, &registry)?;
            println!("Registry:  {}", parsed.registry());
            println!("Namespace: {}", parsed.namespace());
            println!("Name:      {}", parsed.name());
            match parsed.suffix() {
                ImageSuffix::None => {}
                ImageSuffix::Tag(tag) => println!("Tag:       {}", tag),
                ImageSuffix::Digest(digest) => println!("Digest:    {}", digest),
            }
        }
        Commands::Rewrite {
            reference,
            from,
            to,
            namespace_map,
        } => {
            let mapping: NamespaceMapping = namespace_map.into_iter().collect();
            println!("{}", replace_image_ref_prefix(&reference, &from, &to, &mapping)?);
        }
        Commands::Restore {
            manifest,
            config,
            namespace_map,
        } => handle_restore(&manifest, config, namespace_map)?,
        Commands::CheckConfig { config } => {
            println!("Checking configuration...");
            match Settings::new(config.as_deref()) {
                Ok(_) => println!("✓ Configuration is valid"),
                Err(e) => {
                    eprintln!("✗ Configuration error: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
