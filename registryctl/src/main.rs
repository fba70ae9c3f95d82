use std::path::PathBuf;
use anyhow::{Context, Result};
use clap::Parser;
use node_registry_client::{ClientConfig, Node, RegistryClient, RegistryOrigin, Service};

/// Query the node registry
#[derive(Debug, Parser)]
#[command(name = "registryctl", version)]
struct Args {
    /// TOML config file; environment and flags override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Registry document URL
    #[arg(long)]
    url: Option<String>,

    /// Directory holding the cached registry
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Fail instead of using the cached registry when the live one is unavailable
    #[arg(long)]
    no_fallback: bool,

    /// Show a single node
    node: Option<String>,

    /// Show a single service on NODE
    service: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("registryctl=info,node_registry_client=info"))
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = build_config(&args)?;
    tracing::debug!("Using config {:?}", config);

    let url = config.registry_url.clone();
    let client = RegistryClient::new(config)
        .with_context(|| format!("Failed to load registry from {}", url))?;

    match client.origin() {
        RegistryOrigin::Live => println!("registry: {url} (live)"),
        RegistryOrigin::Cache { age } => println!("registry: cached copy dating {age}"),
    }

    match (&args.node, &args.service) {
        (None, _) => {
            for node in client.nodes() {
                print_summary(node);
            }
        }
        (Some(node), None) => print_node(client.node(node)?),
        (Some(node), Some(service)) => print_service(client.node(node)?.service(service)?),
    }

    Ok(())
}

/// Defaults < config file < environment < flags
fn build_config(args: &Args) -> Result<ClientConfig> {
    let mut config = match &args.config {
        Some(path) => ClientConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ClientConfig::default(),
    }
    .apply_env();

    if let Some(url) = &args.url {
        config = config.with_registry_url(url.clone());
    }
    if let Some(dir) = &args.cache_dir {
        config = config.with_cache_dir(dir.clone());
    }
    if args.no_fallback {
        config = config.with_fallback(false);
    }
    Ok(config)
}

fn print_summary(node: &Node) {
    let services: Vec<&str> = node.service_names().collect();
    println!("{:<20} {:<8} {}", node.id(), node.status(), services.join(", "));
}

fn print_node(node: &Node) {
    println!("{}", node.id());
    println!("  description:  {}", node.description());
    println!("  affiliation:  {}", node.affiliation());
    println!("  contact:      {}", node.contact());
    let location = node.location();
    println!("  location:     {}, {}", location.latitude, location.longitude);
    println!("  status:       {}", node.status());
    println!("  version:      {}", node.version());
    println!("  added:        {}", node.date_added());
    println!("  updated:      {}", node.last_updated());
    println!("  url:          {}", node.url().unwrap_or("-"));
    for service in node.services() {
        println!("  - {:<12} {:#}", service.name(), service);
    }
}

fn print_service(service: &Service) {
    println!("{}", service);
    println!("  node:         {}", service.node_id());
    println!("  description:  {}", service.description());
    println!("  keywords:     {}", service.keywords().join(", "));
    println!("  url:          {}", service.url().unwrap_or("-"));
    println!("  docs:         {}", service.doc_url().unwrap_or("-"));
    for (rel, href) in service.links().iter() {
        println!("  link {rel}: {href}");
    }
}
