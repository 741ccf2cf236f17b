use crate::error::TrackingError;
use crate::models::{CreatePackageRequest, Package, PackageStatus, StatusHistoryEntry};
use crate::status;
use crate::store::{PackageFilter, PackageStore};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// CRUD operations on packages. Transition decisions come from `status`;
/// atomicity of status-update + history-append comes from the store.
pub struct PackageService {
    store: Arc<dyn PackageStore>,
}

impl PackageService {
    pub fn new(store: Arc<dyn PackageStore>) -> Self {
        Self { store }
    }

    pub async fn list(
        &self,
        tracking_number: Option<String>,
        status: Option<PackageStatus>,
    ) -> Result<Vec<Package>, TrackingError> {
        let filter = PackageFilter {
            tracking_number_contains: tracking_number.filter(|needle| !needle.trim().is_empty()),
            status,
        };
        self.store.query(&filter).await
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Package>, TrackingError> {
        self.store.load(id).await
    }

    pub async fn create(&self, request: CreatePackageRequest) -> Result<Package, TrackingError> {
        validate_contact_fields(&request)?;

        let created_at = Utc::now();
        let package = Package {
            id: Uuid::new_v4(),
            tracking_number: generate_tracking_number(created_at),
            sender_name: request.sender_name,
            sender_address: request.sender_address,
            sender_phone: request.sender_phone,
            recipient_name: request.recipient_name,
            recipient_address: request.recipient_address,
            recipient_phone: request.recipient_phone,
            current_status: PackageStatus::Created,
            created_at,
            status_history: vec![StatusHistoryEntry { status: PackageStatus::Created, timestamp: created_at }],
        };

        self.store.insert(package.clone()).await?;
        info!("package created id={} tracking_number={}", package.id, package.tracking_number);
        Ok(package)
    }

    pub async fn change_status(&self, id: Uuid, requested: PackageStatus) -> Result<Package, TrackingError> {
        let apply = move |package: &Package| -> Result<StatusHistoryEntry, TrackingError> {
            status::ensure_transition(package.current_status, requested)?;
            Ok(StatusHistoryEntry { status: requested, timestamp: Utc::now() })
        };

        match self.store.update_status(id, &apply).await {
            Ok(package) => {
                info!(
                    "package status changed id={} status={} history_len={}",
                    id,
                    package.current_status,
                    package.status_history.len()
                );
                Ok(package)
            }
            Err(err) => {
                warn!("package status change rejected id={} requested={} error={}", id, requested, err);
                Err(err)
            }
        }
    }
}

/// Tracking numbers look like `PKG-20240501120000-A1B2C3`: a UTC second
/// stamp plus a random suffix so two creations in the same second still
/// differ. Not collision-proof, just collision-improbable.
fn generate_tracking_number(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string()[..6].to_uppercase();
    format!("PKG-{}-{}", now.format("%Y%m%d%H%M%S"), suffix)
}

fn validate_contact_fields(request: &CreatePackageRequest) -> Result<(), TrackingError> {
    let fields = [
        ("senderName", &request.sender_name),
        ("senderAddress", &request.sender_address),
        ("senderPhone", &request.sender_phone),
        ("recipientName", &request.recipient_name),
        ("recipientAddress", &request.recipient_address),
        ("recipientPhone", &request.recipient_phone),
    ];
    for (name, value) in fields {
        if value.trim().is_empty() {
            return Err(TrackingError::Validation(format!("{name} must not be empty")));
        }
    }
    Ok(())
}
