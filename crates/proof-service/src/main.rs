//! Merkle proof service: a thin HTTP façade over [`ssz_merkle_core::query::QueryApi`].

mod api;
mod state;

use anyhow::Result;
use beacon_store::{FixtureBeaconStore, HttpBeaconStore, Snapshot};
use clap::{Parser, ValueEnum};
use metrics_exporter_prometheus::PrometheusBuilder;
use ssz_merkle_core::primitives::Version;
use ssz_merkle_core::query::StateStore;
use ssz_merkle_core::schema::BeaconState;
use state::AppState;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StoreKind {
    /// Fetch live state over the Beacon API.
    Http,
    /// Serve a fixed default-state snapshot, for local smoke-testing.
    Fixture,
}

#[derive(Parser, Debug)]
#[command(name = "proof-service")]
#[command(about = "Serves Merkle proofs over beacon state and block commitments")]
struct Args {
    /// Beacon node URL (only used with `--store http`)
    #[arg(long, env = "BEACON_URL", default_value = "http://localhost:5052")]
    beacon_url: String,

    /// Backing state store
    #[arg(long, value_enum, default_value_t = StoreKind::Http)]
    store: StoreKind,

    /// API listen address
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    listen: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    tracing::info!(store = ?args.store, listen = %args.listen, "starting proof service");

    let store: Arc<dyn StateStore> = match args.store {
        StoreKind::Http => {
            tracing::info!(beacon_url = %args.beacon_url, "using Beacon API store");
            Arc::new(HttpBeaconStore::new(args.beacon_url.clone()))
        }
        StoreKind::Fixture => {
            tracing::warn!("using fixture store; serving a static default BeaconState snapshot");
            Arc::new(FixtureBeaconStore::single(Snapshot::linked(BeaconState::default(), Version([0; 4]))))
        }
    };

    let recorder = PrometheusBuilder::new().build_recorder();
    let metrics_handle = recorder.handle();
    metrics::set_global_recorder(recorder)
        .map_err(|err| anyhow::anyhow!("failed to install Prometheus recorder: {err}"))?;

    let app_state = AppState::new(store, metrics_handle);
    let server = tokio::spawn(api::run_server(args.listen.clone(), app_state));

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("received shutdown signal");
        }
        result = server => {
            match result {
                Ok(Ok(())) => {}
                Ok(Err(err)) => tracing::error!(error = %err, "server exited with error"),
                Err(err) => tracing::error!(error = %err, "server task panicked"),
            }
        }
    }

    Ok(())
}
