// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::Result;
use axum::http::StatusCode;
use clap::Parser;
use futures::StreamExt;
use k8s_openapi::api::core::v1::ConfigMap;
use kube::runtime::reflector::ObjectRef;
use kube::{
    runtime::{controller::Action, watcher::Config, Controller},
    Api, Client, ResourceExt,
};
use metallb_operator::{
    chart::config::PlatformFlavor,
    constants::{
        DEFAULT_METALLB_CR_NAME, ERROR_REQUEUE_DURATION_SECS, KIND_METALLB,
        METRICS_SERVER_BIND_ADDRESS, METRICS_SERVER_PATH, METRICS_SERVER_PORT, OPERATOR_NAMESPACE,
        RESYNC_PERIOD_SECS, TOKIO_WORKER_THREADS,
    },
    context::Context,
    crd::{AddressPool, BFDProfile, BGPPeer, MetalLB},
    metrics::{gather_metrics, record_reconciliation_error, record_reconciliation_success},
    reconcilers::reconcile_metallb,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

#[derive(Debug, thiserror::Error)]
#[error(transparent)]
struct ReconcileError(#[from] anyhow::Error);

/// MetalLB Operator for Kubernetes
#[derive(Debug, Parser)]
#[command(name = "metallb-operator", version, about)]
struct Args {
    /// Namespace the operator manages; defaults to POD_NAMESPACE or the
    /// conventional operator namespace
    #[arg(long)]
    namespace: Option<String>,

    /// Platform flavor: "kubernetes" or "openshift"
    #[arg(long, default_value = "kubernetes")]
    platform: String,
}

fn main() -> Result<()> {
    // Build Tokio runtime with custom thread names
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(TOKIO_WORKER_THREADS)
        .thread_name("metallb-operator")
        .enable_all()
        .build()?;

    runtime.block_on(async_main())
}

async fn async_main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging.
    //
    // Respects RUST_LOG environment variable if set, otherwise defaults to INFO level
    // Example: RUST_LOG=debug cargo run
    //
    // Respects RUST_LOG_FORMAT environment variable for output format
    // Example: RUST_LOG_FORMAT=json cargo run
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }

    let namespace = args
        .namespace
        .or_else(|| std::env::var("POD_NAMESPACE").ok())
        .unwrap_or_else(|| OPERATOR_NAMESPACE.to_string());
    let platform = match args.platform.to_lowercase().as_str() {
        "openshift" => PlatformFlavor::OpenShift,
        _ => PlatformFlavor::Kubernetes,
    };

    info!(namespace = %namespace, platform = ?platform, "Starting MetalLB operator");

    debug!("Initializing Kubernetes client");
    let client = Client::try_default().await?;
    debug!("Kubernetes client initialized successfully");

    let ctx = Arc::new(Context {
        client: client.clone(),
        platform,
    });

    // The controller should never exit; if it does, surface it and stop the
    // process so the pod restarts.
    tokio::select! {
        result = run_metallb_controller(client, ctx, namespace) => {
            error!("CRITICAL: MetalLB controller exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("MetalLB controller exited unexpectedly without error")
        }
        result = serve_metrics() => {
            error!("CRITICAL: metrics server exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("metrics server exited unexpectedly without error")
        }
    }
}

/// Run the `MetalLB` controller.
///
/// Watches the `MetalLB` resource itself, the configuration `ConfigMap` it
/// owns, and the three governed collections. Changes to a governed
/// collection requeue the one governing resource, since the aggregated
/// artifact has to be re-rendered no matter which collection moved.
async fn run_metallb_controller(
    client: Client,
    ctx: Arc<Context>,
    namespace: String,
) -> Result<()> {
    info!("Starting MetalLB controller");

    let metallbs = Api::<MetalLB>::namespaced(client.clone(), &namespace);
    let config_maps = Api::<ConfigMap>::namespaced(client.clone(), &namespace);
    let pools = Api::<AddressPool>::all(client.clone());
    let peers = Api::<BGPPeer>::all(client.clone());
    let profiles = Api::<BFDProfile>::all(client.clone());

    let governed = {
        let namespace = namespace.clone();
        move || {
            Some(ObjectRef::<MetalLB>::new(DEFAULT_METALLB_CR_NAME).within(&namespace))
        }
    };

    let map_pool = {
        let governed = governed.clone();
        move |_: AddressPool| governed()
    };
    let map_peer = {
        let governed = governed.clone();
        move |_: BGPPeer| governed()
    };
    let map_profile = {
        let governed = governed.clone();
        move |_: BFDProfile| governed()
    };

    Controller::new(metallbs, Config::default())
        .owns(config_maps, Config::default())
        .watches(pools, Config::default(), map_pool)
        .watches(peers, Config::default(), map_peer)
        .watches(profiles, Config::default(), map_profile)
        .run(reconcile_metallb_wrapper, error_policy, ctx)
        .for_each(|result| async move {
            match result {
                Ok(o) => debug!("Reconciled MetalLB: {:?}", o),
                Err(e) => debug!("Reconciliation error (requeued): {:?}", e),
            }
        })
        .await;

    Ok(())
}

/// Wrap the reconciler for the controller runtime: record metrics and map
/// the result onto requeue actions.
async fn reconcile_metallb_wrapper(
    metallb: Arc<MetalLB>,
    ctx: Arc<Context>,
) -> Result<Action, ReconcileError> {
    let start = Instant::now();
    match reconcile_metallb(ctx, metallb.clone()).await {
        Ok(()) => {
            info!("Successfully reconciled MetalLB: {}", metallb.name_any());
            record_reconciliation_success(KIND_METALLB, start.elapsed());
            Ok(Action::requeue(Duration::from_secs(RESYNC_PERIOD_SECS)))
        }
        Err(err) => {
            error!(
                "Failed to reconcile MetalLB {}: {:?}",
                metallb.name_any(),
                err
            );
            record_reconciliation_error(KIND_METALLB, start.elapsed());
            Err(ReconcileError(err))
        }
    }
}

/// Error policy for the `MetalLB` controller
fn error_policy(_resource: Arc<MetalLB>, _err: &ReconcileError, _ctx: Arc<Context>) -> Action {
    Action::requeue(Duration::from_secs(ERROR_REQUEUE_DURATION_SECS))
}

/// Serve the Prometheus metrics endpoint.
async fn serve_metrics() -> Result<()> {
    let app = axum::Router::new().route(METRICS_SERVER_PATH, axum::routing::get(metrics_handler));
    let addr = format!("{METRICS_SERVER_BIND_ADDRESS}:{METRICS_SERVER_PORT}");
    info!(addr = %addr, "Starting metrics server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn metrics_handler() -> (StatusCode, String) {
    match gather_metrics() {
        Ok(body) => (StatusCode::OK, body),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("failed to gather metrics: {err}"),
        ),
    }
}
