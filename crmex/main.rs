use anyhow::Result;
use clap::Parser;
use crmex_config::{APP_NAME, APP_VERSION, Config};
use crmex_kube::KubernetesClient;
use crmex_metrics::generate_and_serve_cr_metrics;
use tokio::runtime::{Builder, Runtime};
use tracing::{error, info};

pub mod cli;

fn main() -> Result<()> {
    let args = cli::Args::parse();
    let rt = Builder::new_multi_thread().enable_all().build()?;

    let config = rt.block_on(Config::load_or_default(args.config.as_deref()))?;
    let _logging_guard = crmex_common::logging::initialize(APP_NAME, config.logs.dir.as_deref())?;
    info!("{} v{} started", APP_NAME, APP_VERSION);

    if let Err(error) = run_application(&rt, &args, &config) {
        error!("{} v{} terminated with an error: {:#}", APP_NAME, APP_VERSION, error);
        Err(error)
    } else {
        info!("{} v{} stopped", APP_NAME, APP_VERSION);
        Ok(())
    }
}

fn run_application(rt: &Runtime, args: &cli::Args, config: &Config) -> Result<()> {
    let gvks = args.resources(config)?;
    if gvks.is_empty() {
        return Err(anyhow::anyhow!(
            "no custom resource types to export metrics for, pass them as arguments or in the configuration file"
        ));
    }

    let namespaces = args.namespaces(config)?;
    let client = rt.block_on(KubernetesClient::new(
        args.kube_config.as_deref(),
        args.context.as_deref(),
        args.insecure,
    ))?;
    info!(
        "Connected to Kubernetes {} using {} context",
        client.k8s_version(),
        client.context().unwrap_or("inferred")
    );

    let mut cr_metrics = rt.block_on(generate_and_serve_cr_metrics(
        client.get_client(),
        &namespaces,
        &gvks,
        args.host(&config.host),
        args.port(config.port),
    ))?;
    info!(
        "Exporting metrics for {} resource types in {} namespaces using {} stores",
        gvks.len(),
        namespaces.len(),
        cr_metrics.stores_count()
    );

    rt.block_on(shutdown_signal())?;
    info!("Shutting down");
    cr_metrics.stop();

    Ok(())
}

#[cfg(unix)]
async fn shutdown_signal() -> std::io::Result<()> {
    let mut terminate = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result,
        _ = terminate.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
