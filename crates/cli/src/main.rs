//! arbctl - list and get cached Kube Arbitrator Queues
//!
//! Queue manifests are loaded into an in-memory indexer and read back
//! through the typed Queue lister.

mod manifest;
mod output;

use anyhow::{Context, Result};
use arbitrator_core::application::lister::queue::new_queue_lister;
use arbitrator_core::domain::{Queue, Selector};
use arbitrator_infra_memory::MemoryIndexer;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use output::OutputFormat;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_NAMESPACE: &str = "default";

#[derive(Parser)]
#[command(name = "arbctl")]
#[command(about = "Kube Arbitrator Queue lister", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Queue manifest files (JSON or YAML), comma separated
    #[arg(
        short = 'f',
        long,
        env = "ARBITRATOR_MANIFESTS",
        value_delimiter = ',',
        global = true
    )]
    manifests: Vec<PathBuf>,

    /// Log output format
    #[arg(
        long,
        env = "ARBITRATOR_LOG_FORMAT",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// List queues matching a label selector
    List {
        /// Namespace to list from
        #[arg(short, long, default_value = DEFAULT_NAMESPACE)]
        namespace: String,

        /// List across all namespaces
        #[arg(short = 'A', long, conflicts_with = "namespace")]
        all_namespaces: bool,

        /// Label selector (e.g. "tier=gold,env in (prod,staging)")
        #[arg(short = 'l', long, default_value = "")]
        selector: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        output: OutputFormat,
    },

    /// Get a single queue by name
    Get {
        /// Queue name
        name: String,

        /// Namespace of the queue
        #[arg(short, long, default_value = DEFAULT_NAMESPACE)]
        namespace: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        output: OutputFormat,
    },
}

fn init_logging(format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("arbitrator=info,arbctl=info"))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // stdout carries command output, logs go to stderr
    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_format);

    match run(cli) {
        Ok(rendered) => {
            println!("{rendered}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

/// Execute a command and return the rendered output
fn run(cli: Cli) -> Result<String> {
    let queues = manifest::load_queues(&cli.manifests)?;

    let indexer = Arc::new(MemoryIndexer::<Queue>::with_namespace_index());
    indexer
        .replace(queues)
        .context("Failed to populate queue cache")?;
    info!(
        manifests = cli.manifests.len(),
        queues = indexer.len()?,
        "Queue cache populated"
    );

    let lister = new_queue_lister(indexer);

    match cli.command {
        Commands::List {
            namespace,
            all_namespaces,
            selector,
            output,
        } => {
            let selector = Selector::parse(&selector)?;
            let queues = if all_namespaces {
                lister.list(&selector)?
            } else {
                lister.queues(namespace.as_str()).list(&selector)?
            };

            if queues.is_empty() && output == OutputFormat::Table {
                let scope = if all_namespaces {
                    "any namespace".to_string()
                } else {
                    format!("namespace {namespace}")
                };
                return Ok(format!("No queues found in {scope}.").yellow().to_string());
            }

            output::render(&queues, output)
        }

        Commands::Get {
            name,
            namespace,
            output,
        } => {
            let queue = lister.queues(namespace).get(&name)?;
            output::render_one(&queue, output)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbitrator_core::domain::DomainError;
    use arbitrator_core::error::AppError;
    use clap::CommandFactory;
    use std::path::Path;

    const MANIFEST: &str = r#"
apiVersion: arbitrator.incubator.k8s.io/v1
kind: Queue
metadata:
  name: q1
  namespace: ns1
  labels:
    tier: gold
spec:
  weight: 1
---
apiVersion: arbitrator.incubator.k8s.io/v1
kind: Queue
metadata:
  name: q2
  namespace: ns2
spec:
  weight: 2
"#;

    fn write_manifest(test: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "arbctl_{}_{}.yaml",
            test,
            std::process::id()
        ));
        std::fs::write(&path, MANIFEST).unwrap();
        path
    }

    fn run_with(manifest: &Path, args: &[&str]) -> Result<String> {
        let manifest = manifest.to_str().unwrap();
        let mut argv = vec!["arbctl", "-f", manifest];
        argv.extend_from_slice(args);
        run(Cli::try_parse_from(argv).unwrap())
    }

    fn listed_names(rendered: &str) -> Vec<String> {
        let value: serde_json::Value = serde_json::from_str(rendered).unwrap();
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|q| q["metadata"]["name"].as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_run_list_scoping() {
        let manifest = write_manifest("list_scoping");

        let all = run_with(&manifest, &["list", "-A", "-o", "json"]).unwrap();
        assert_eq!(listed_names(&all), vec!["q1", "q2"]);

        let ns1 = run_with(&manifest, &["list", "-n", "ns1", "-o", "json"]).unwrap();
        assert_eq!(listed_names(&ns1), vec!["q1"]);

        let gold = run_with(&manifest, &["list", "-A", "-l", "tier=gold", "-o", "json"]).unwrap();
        assert_eq!(listed_names(&gold), vec!["q1"]);

        let empty = run_with(&manifest, &["list", "-n", "absent"]).unwrap();
        assert!(empty.contains("No queues found in namespace absent."));

        std::fs::remove_file(manifest).unwrap();
    }

    #[test]
    fn test_run_get() {
        let manifest = write_manifest("get");

        let rendered = run_with(&manifest, &["get", "q2", "-n", "ns2", "-o", "json"]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["metadata"]["name"], "q2");
        assert_eq!(value["spec"]["weight"], 2);

        let err = run_with(&manifest, &["get", "q2", "-n", "ns1"]).unwrap_err();
        let app_err = err.downcast_ref::<AppError>().unwrap();
        assert!(app_err.is_not_found());
        assert_eq!(
            err.to_string(),
            "queue.arbitrator.incubator.k8s.io \"q2\" not found"
        );

        std::fs::remove_file(manifest).unwrap();
    }

    #[test]
    fn test_run_rejects_bad_selector() {
        let manifest = write_manifest("bad_selector");

        let err = run_with(&manifest, &["list", "-A", "-l", "tier in ()"]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::InvalidSelector { input, .. }) if input == "tier in ()"
        ));

        std::fs::remove_file(manifest).unwrap();
    }

    #[test]
    fn test_all_namespaces_conflicts_with_namespace() {
        assert!(Cli::try_parse_from(["arbctl", "list", "-A", "-n", "ns1"]).is_err());
    }

    #[test]
    fn test_missing_manifest_file() {
        let err = run_with(Path::new("/nonexistent/arbctl.yaml"), &["list", "-A"]).unwrap_err();
        assert!(err.to_string().contains("Failed to read manifest"));
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_list_args() {
        let cli = Cli::try_parse_from([
            "arbctl", "-f", "a.yaml,b.json", "list", "-A", "-l", "tier=gold", "-o", "json",
        ])
        .unwrap();

        assert_eq!(cli.manifests.len(), 2);
        match cli.command {
            Commands::List {
                all_namespaces,
                selector,
                output,
                ..
            } => {
                assert!(all_namespaces);
                assert_eq!(selector, "tier=gold");
                assert_eq!(output, OutputFormat::Json);
            }
            Commands::Get { .. } => panic!("expected list"),
        }
    }

    #[test]
    fn test_parse_get_args() {
        let cli = Cli::try_parse_from(["arbctl", "get", "q1", "-n", "ns1"]).unwrap();
        match cli.command {
            Commands::Get { name, namespace, .. } => {
                assert_eq!(name, "q1");
                assert_eq!(namespace, "ns1");
            }
            Commands::List { .. } => panic!("expected get"),
        }
    }
}
