use crate::error::TrackingError;
use crate::models::{Package, PackageStatus, StatusHistoryEntry};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, TrackingError>;

#[derive(Debug, Clone, Default)]
pub struct PackageFilter {
    /// Case-insensitive "contains" match on the tracking number.
    pub tracking_number_contains: Option<String>,
    pub status: Option<PackageStatus>,
}

/// Decision callback for [`PackageStore::update_status`]. Runs under the
/// store's serialization for the target package; returning an error leaves
/// the package untouched.
pub type TransitionFn<'a> = &'a (dyn Fn(&Package) -> Result<StatusHistoryEntry> + Send + Sync);

/// Storage contract for packages and their history. History entries are
/// owned by their package: they are written with it, loaded with it, and
/// removed with it.
#[async_trait]
pub trait PackageStore: Send + Sync {
    /// Persist a new package record together with its embedded initial
    /// history entry as one operation.
    async fn insert(&self, package: Package) -> Result<()>;

    async fn load(&self, id: Uuid) -> Result<Option<Package>>;

    /// Atomic read-modify-write on one package: evaluates `apply` against
    /// the current record and, on success, sets `current_status` to the
    /// produced entry's status and appends the entry, as a single unit.
    /// Concurrent calls for the same package are serialized; partial
    /// application is never observable.
    async fn update_status(&self, id: Uuid, apply: TransitionFn<'_>) -> Result<Package>;

    /// Filtered listing, newest-first by creation time.
    async fn query(&self, filter: &PackageFilter) -> Result<Vec<Package>>;

    /// Removes the package and cascades its history. Returns whether a
    /// record existed. Not reachable from any API operation today; the
    /// contract requires it so a package is deletable as a whole unit.
    async fn delete(&self, id: Uuid) -> Result<bool>;

    async fn is_empty(&self) -> Result<bool>;
}

pub struct MemoryStore {
    inner: Mutex<HashMap<Uuid, Package>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self { inner: Mutex::new(HashMap::new()) }
    }

    fn lock_inner(&self) -> Result<MutexGuard<'_, HashMap<Uuid, Package>>> {
        self.inner.lock().map_err(|_| TrackingError::Storage {
            operation: "package store lock".to_string(),
            details: "poisoned".to_string(),
        })
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn matches(filter: &PackageFilter, package: &Package) -> bool {
    if let Some(needle) = &filter.tracking_number_contains {
        if !package.tracking_number.to_lowercase().contains(&needle.to_lowercase()) {
            return false;
        }
    }
    if let Some(status) = filter.status {
        if package.current_status != status {
            return false;
        }
    }
    true
}

#[async_trait]
impl PackageStore for MemoryStore {
    async fn insert(&self, package: Package) -> Result<()> {
        let mut inner = self.lock_inner()?;
        if inner.contains_key(&package.id) {
            return Err(TrackingError::Storage {
                operation: "insert package".to_string(),
                details: format!("duplicate id {}", package.id),
            });
        }
        inner.insert(package.id, package);
        Ok(())
    }

    async fn load(&self, id: Uuid) -> Result<Option<Package>> {
        Ok(self.lock_inner()?.get(&id).cloned())
    }

    async fn update_status(&self, id: Uuid, apply: TransitionFn<'_>) -> Result<Package> {
        let mut inner = self.lock_inner()?;
        let package = inner.get_mut(&id).ok_or(TrackingError::NotFound(id))?;
        let entry = apply(package)?;
        package.current_status = entry.status;
        package.status_history.push(entry);
        Ok(package.clone())
    }

    async fn query(&self, filter: &PackageFilter) -> Result<Vec<Package>> {
        let inner = self.lock_inner()?;
        let mut found: Vec<Package> = inner.values().filter(|package| matches(filter, package)).cloned().collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.tracking_number.cmp(&a.tracking_number)));
        Ok(found)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.lock_inner()?.remove(&id).is_some())
    }

    async fn is_empty(&self) -> Result<bool> {
        Ok(self.lock_inner()?.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn sample_package(tracking_number: &str, age_seconds: i64) -> Package {
        let created_at = Utc::now() - Duration::seconds(age_seconds);
        Package {
            id: Uuid::new_v4(),
            tracking_number: tracking_number.to_string(),
            sender_name: "Alice".to_string(),
            sender_address: "Street 1".to_string(),
            sender_phone: "111".to_string(),
            recipient_name: "Bob".to_string(),
            recipient_address: "Street 2".to_string(),
            recipient_phone: "222".to_string(),
            current_status: PackageStatus::Created,
            created_at,
            status_history: vec![StatusHistoryEntry { status: PackageStatus::Created, timestamp: created_at }],
        }
    }

    #[tokio::test]
    async fn insert_then_load_round_trips() {
        let store = MemoryStore::new();
        let package = sample_package("PKG-20240101000000-AAAAAA", 0);
        store.insert(package.clone()).await.unwrap();

        let loaded = store.load(package.id).await.unwrap();
        assert_eq!(loaded, Some(package));
    }

    #[tokio::test]
    async fn duplicate_insert_is_a_storage_error() {
        let store = MemoryStore::new();
        let package = sample_package("PKG-20240101000000-AAAAAA", 0);
        store.insert(package.clone()).await.unwrap();

        let err = store.insert(package).await.unwrap_err();
        assert!(matches!(err, TrackingError::Storage { .. }));
    }

    #[tokio::test]
    async fn delete_removes_package_and_history() {
        let store = MemoryStore::new();
        let package = sample_package("PKG-20240101000000-AAAAAA", 0);
        let id = package.id;
        store.insert(package).await.unwrap();

        assert!(store.delete(id).await.unwrap());
        assert_eq!(store.load(id).await.unwrap(), None);
        assert!(store.is_empty().await.unwrap());
        assert!(!store.delete(id).await.unwrap());
    }

    #[tokio::test]
    async fn update_status_applies_status_and_history_together() {
        let store = MemoryStore::new();
        let package = sample_package("PKG-20240101000000-AAAAAA", 0);
        let id = package.id;
        store.insert(package).await.unwrap();

        let updated = store
            .update_status(id, &|current: &Package| {
                assert_eq!(current.current_status, PackageStatus::Created);
                Ok(StatusHistoryEntry { status: PackageStatus::Sent, timestamp: Utc::now() })
            })
            .await
            .unwrap();

        assert_eq!(updated.current_status, PackageStatus::Sent);
        assert_eq!(updated.status_history.len(), 2);
        assert_eq!(updated.status_history.last().unwrap().status, PackageStatus::Sent);
        assert_eq!(store.load(id).await.unwrap(), Some(updated));
    }

    #[tokio::test]
    async fn update_status_rejection_leaves_package_untouched() {
        let store = MemoryStore::new();
        let package = sample_package("PKG-20240101000000-AAAAAA", 0);
        let id = package.id;
        store.insert(package.clone()).await.unwrap();

        let err = store
            .update_status(id, &|current: &Package| {
                Err(TrackingError::InvalidTransition { from: current.current_status, to: PackageStatus::Accepted })
            })
            .await
            .unwrap_err();

        assert!(matches!(err, TrackingError::InvalidTransition { .. }));
        assert_eq!(store.load(id).await.unwrap(), Some(package));
    }

    #[tokio::test]
    async fn update_status_on_missing_package_is_not_found() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();
        let err = store
            .update_status(id, &|_: &Package| {
                panic!("decision callback must not run for a missing package")
            })
            .await
            .unwrap_err();
        assert!(matches!(err, TrackingError::NotFound(missing) if missing == id));
    }

    #[tokio::test]
    async fn query_filters_and_orders_newest_first() {
        let store = MemoryStore::new();
        let oldest = sample_package("PKG-20240101000000-AAAAAA", 30);
        let middle = sample_package("PKG-20240201000000-BBBBBB", 20);
        let mut newest = sample_package("PKG-20240301000000-CCCCCC", 10);
        newest.current_status = PackageStatus::Sent;
        for package in [oldest.clone(), middle.clone(), newest.clone()] {
            store.insert(package).await.unwrap();
        }

        let all = store.query(&PackageFilter::default()).await.unwrap();
        let trackings: Vec<&str> = all.iter().map(|p| p.tracking_number.as_str()).collect();
        assert_eq!(trackings, vec![newest.tracking_number.as_str(), middle.tracking_number.as_str(), oldest.tracking_number.as_str()]);

        let sent_only = store
            .query(&PackageFilter { status: Some(PackageStatus::Sent), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(sent_only.len(), 1);
        assert_eq!(sent_only[0].id, newest.id);

        let by_substring = store
            .query(&PackageFilter { tracking_number_contains: Some("pkg-202402".to_string()), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(by_substring.len(), 1);
        assert_eq!(by_substring[0].id, middle.id);

        let combined = store
            .query(&PackageFilter {
                tracking_number_contains: Some("pkg-202402".to_string()),
                status: Some(PackageStatus::Sent),
            })
            .await
            .unwrap();
        assert!(combined.is_empty());
    }
}
