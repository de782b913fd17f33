//! Inspect an add-in directory the way its resolver would
//!
//! Prints the resolvable-name index built from a directory, the files that
//! were skipped, and optionally the outcome of resolving request strings.
//!
//! ```text
//! addin-scan ./plugins/my-addin --request "Foo, Version=1.0.0.0" --json
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

use addin_resolver::utils::init_logging;
use addin_resolver::{
    AddinResolver, ImageHost, ModuleDiscovery, ResolveEvents, ResolveOutcome, ResolverConfig,
};

#[derive(Parser, Debug)]
#[command(name = "addin-scan", about = "Inspect an add-in directory's resolvable modules")]
struct Args {
    /// Add-in directory to scan
    directory: PathBuf,

    /// Module file extension (overrides config)
    #[arg(short, long)]
    extension: Option<String>,

    /// Resolver configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Request strings to resolve against the index
    #[arg(short, long = "request")]
    requests: Vec<String>,

    /// Emit JSON instead of text
    #[arg(long)]
    json: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn describe(outcome: &ResolveOutcome) -> String {
    match outcome {
        ResolveOutcome::Resolved(module) => {
            format!(
                "resolved {} {} from {}",
                module.short_name(),
                module.header.version,
                module.path.display()
            )
        }
        ResolveOutcome::Declined(reason) => format!("not handled ({})", reason),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ResolverConfig::from_toml_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ResolverConfig::default(),
    }
    .apply_env_overrides();
    if let Some(ext) = &args.extension {
        config.module_extension = ext.trim_start_matches('.').to_string();
    }
    config.validate()?;

    let filter = if args.verbose { Some("debug") } else { config.log_filter.as_deref() };
    init_logging(filter.or(Some("warn")));

    let host = Arc::new(ImageHost::from_config(&config));
    let report =
        ModuleDiscovery::new(&args.directory, &config.module_extension).scan(host.as_ref());

    let mut names: Vec<&str> = report.names.iter().collect();
    names.sort_unstable_by_key(|name| name.to_lowercase());

    let mut outcomes = Vec::new();
    if !args.requests.is_empty() {
        let owner = args.directory.join(format!(".addin-scan.{}", config.module_extension));
        let mut resolver = AddinResolver::with_config(
            Some(&owner),
            host.clone(),
            Arc::new(ResolveEvents::new()),
            &config,
        )
        .context("creating resolver")?;
        for request in &args.requests {
            outcomes.push((request.clone(), resolver.resolve(request)));
        }
        resolver.dispose()?;
    }

    if args.json {
        let output = json!({
            "directory": args.directory,
            "extension": config.module_extension,
            "modules": names,
            "skipped": report.skipped.iter().map(|s| json!({
                "path": s.path,
                "reason": s.reason,
            })).collect::<Vec<_>>(),
            "requests": outcomes.iter().map(|(request, outcome)| json!({
                "request": request,
                "resolved": outcome.is_resolved(),
                "detail": describe(outcome),
            })).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "{} ({} modules, *.{})",
        args.directory.display(),
        names.len(),
        config.module_extension
    );
    for name in &names {
        println!("  {}", name);
    }
    if !report.skipped.is_empty() {
        println!("skipped:");
        for skipped in &report.skipped {
            println!("  {}: {}", skipped.path.display(), skipped.reason);
        }
    }
    for (request, outcome) in &outcomes {
        println!("{} -> {}", request, describe(outcome));
    }

    Ok(())
}
