use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use tracing::info;

use k8s_job_cleaner::{
    cleaner::Cleaner,
    cli::Cli,
    config::{self, ClusterSource, Config},
    kubernetes::KubeClient,
    version,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    config::load_env();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // --help is reported through the error path but is not a failure
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    if cli.version {
        println!("{}", version::version_string());
        return ExitCode::SUCCESS;
    }

    // Diagnostics go to stderr; stdout is reserved for deletion lines
    tracing_subscriber::fmt()
        .with_env_filter(config::log_filter())
        .with_writer(io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::from_cli(cli)?;

    let client = match &config.source {
        ClusterSource::InCluster => KubeClient::in_cluster()?,
        ClusterSource::Kubeconfig { path, context } => {
            KubeClient::from_kubeconfig(path.as_deref(), context.as_deref()).await?
        }
    };

    let namespace = client.resolve_namespace(config.namespace.as_deref());
    if namespace.is_empty() {
        info!("Cleaning Jobs in all namespaces");
    } else {
        info!("Cleaning Jobs in namespace {}", namespace);
    }

    let cleaner = Cleaner::new(client, config.dry_run);
    let mut out = io::stdout().lock();
    let summary = cleaner.run(&namespace, &config.policy, &mut out).await?;
    writeln!(out, "{}", summary)?;

    Ok(())
}
