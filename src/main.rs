//! toolgate - CLI entry point

use anyhow::Result;
use clap::Parser;
use toolgate::cli::{args::timeout_override, Args, Commands};
use toolgate::tools::audit::AuditLogger;
use toolgate::{builtin_descriptors, Broker, BrokerConfig, ToolRegistry, ToolRequest};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.verbosity().env_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = BrokerConfig::load(args.config.as_deref())?;

    match args.command {
        Commands::Run {
            tool,
            target,
            args: extra,
            timeout,
            dry_run,
        } => {
            let audit = match &config.audit_log {
                Some(path) => AuditLogger::to_file(path)?,
                None => AuditLogger::to_stderr(),
            };
            let registry = ToolRegistry::from_descriptors(
                builtin_descriptors(),
                &config.registry_filter(),
            );
            let broker = Broker::new(registry, &config, audit);

            let mut request = ToolRequest::new(target).with_arguments(extra);
            request.timeout_override = timeout_override(timeout);
            request.dry_run = dry_run;

            let result = broker.dispatch(&tool, &request).await;
            broker.shutdown(config.shutdown_grace()).await;

            println!("{}", serde_json::to_string_pretty(&result)?);
            std::process::exit(if result.is_success() { 0 } else { result.return_code });
        }
        Commands::List => {
            let registry = ToolRegistry::from_descriptors(
                builtin_descriptors(),
                &config.registry_filter(),
            );
            for name in registry.names() {
                println!("{}", name);
            }
        }
        Commands::Config => {
            println!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
