use anyhow::Result;
use package_tracking::{
    api::{self, AppState},
    config::Config,
    models::CreatePackageRequest,
    service::PackageService,
    store::{MemoryStore, PackageStore},
};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_logging();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let store = Arc::new(MemoryStore::new());
    let service = Arc::new(PackageService::new(store.clone()));

    if config.seed_demo_data {
        seed_demo_package(store.as_ref(), &service).await?;
    }

    let state = AppState {
        service,
        cors_allowed_origin: config.cors_allowed_origin.clone(),
    };
    api::run_server(config.bind_addr, state).await
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_target(true).try_init();
}

/// Demo bootstrap data only; nothing depends on this package existing.
async fn seed_demo_package(store: &dyn PackageStore, service: &PackageService) -> Result<()> {
    if !store.is_empty().await? {
        return Ok(());
    }

    let package = service
        .create(CreatePackageRequest {
            sender_name: "Alice".to_string(),
            sender_address: "Street 1".to_string(),
            sender_phone: "111".to_string(),
            recipient_name: "Bob".to_string(),
            recipient_address: "Street 2".to_string(),
            recipient_phone: "222".to_string(),
        })
        .await?;
    info!("seeded demo package id={} tracking_number={}", package.id, package.tracking_number);
    Ok(())
}
