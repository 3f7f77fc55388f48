use anyhow::{bail, Context, Result};
use clap::Parser;
use std::collections::HashMap;
use std::str::FromStr;
use tracing::{error, info, Level};

mod cli;

use crate::cli::Args;
use route_manifest::{create_manifest, Manifest, ManifestConfig, ManifestWatcher};

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(&args.log_level);

    if let Err(e) = run(args).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(log_level: &str) {
    let level = Level::from_str(log_level).unwrap_or(Level::WARN);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(args: Args) -> Result<()> {
    let config = load_config(&args)?;
    info!("Building manifest for {}", config.cwd.display());

    if args.watch {
        return watch(config, args.output).await;
    }

    let manifest = create_manifest(&config)?;

    match &args.match_path {
        Some(pathname) => print_match(&manifest, pathname, &args.output),
        None => print_manifest(&manifest, &args.output),
    }
}

fn load_config(args: &Args) -> Result<ManifestConfig> {
    let base = match &args.config {
        Some(path) => ManifestConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ManifestConfig::default(),
    };

    let mut config = args.apply(base);
    if config.cwd.is_relative() {
        let current_dir = std::env::current_dir().context("Failed to get current directory")?;
        config.cwd = current_dir.join(&config.cwd);
    }

    Ok(config)
}

fn print_manifest(manifest: &Manifest, output: &str) -> Result<()> {
    match output {
        "text" => println!("{}", manifest),
        _ => println!("{}", manifest.to_json()?),
    }
    Ok(())
}

/// Resolves one pathname. Matcher implementations live outside this tool, so
/// every registered matcher accepts any value.
fn print_match(manifest: &Manifest, pathname: &str, output: &str) -> Result<()> {
    let matchers: HashMap<String, fn(&str) -> bool> = manifest
        .matchers
        .keys()
        .map(|name| (name.clone(), accept_any as fn(&str) -> bool))
        .collect();

    let Some(found) = manifest.match_path(pathname, &matchers) else {
        bail!("No route matches {}", pathname);
    };

    match output {
        "text" => {
            let id = if found.route.id.is_empty() { "/" } else { &found.route.id };
            println!("{}", id);
            for (name, value) in &found.params {
                println!("  {} = {}", name, value);
            }
        }
        _ => println!("{}", serde_json::to_string_pretty(&found)?),
    }

    Ok(())
}

fn accept_any(_: &str) -> bool {
    true
}

async fn watch(config: ManifestConfig, output: String) -> Result<()> {
    let watcher = ManifestWatcher::new(config).context("Initial build failed")?;
    let mut rx = watcher.subscribe();
    print_manifest(&rx.borrow_and_update(), &output)?;

    let printer = tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let manifest = rx.borrow_and_update().clone();
            if let Err(e) = print_manifest(&manifest, &output) {
                error!("Failed to print manifest: {:#}", e);
            }
        }
    });

    tokio::select! {
        result = watcher.run() => result?,
        _ = tokio::signal::ctrl_c() => info!("Stopping watcher"),
    }

    printer.abort();
    Ok(())
}
