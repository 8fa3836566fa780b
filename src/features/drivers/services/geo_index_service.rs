use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::core::error::{AppError, Result, StorageError};
use crate::features::drivers::store::{DriverStore, IndexCreation, IndexDescriptor};

/// Name of the spatial index backing proximity queries
pub const DRIVER_LOCATION_INDEX: &str = "drivers_location_gist";

/// Field the spatial index covers
pub const DRIVER_LOCATION_FIELD: &str = "location";

/// Keeps the spatial index on driver locations in place.
///
/// Provisioning runs at most once successfully per process. Concurrent first
/// callers share a single in-flight attempt; a failed attempt is retried by
/// the next caller.
pub struct GeoIndexService {
    store: Arc<dyn DriverStore>,
    ready: OnceCell<()>,
}

impl GeoIndexService {
    pub fn new(store: Arc<dyn DriverStore>) -> Self {
        Self {
            store,
            ready: OnceCell::new(),
        }
    }

    pub fn descriptor() -> IndexDescriptor {
        IndexDescriptor::spatial(DRIVER_LOCATION_INDEX, DRIVER_LOCATION_FIELD)
    }

    pub fn is_ready(&self) -> bool {
        self.ready.initialized()
    }

    /// Make sure the spatial index exists; a no-op once it has been provisioned
    pub async fn ensure_index(&self) -> Result<()> {
        self.ready
            .get_or_try_init(|| self.provision())
            .await
            .map(|_| ())
    }

    async fn provision(&self) -> Result<()> {
        let wanted = Self::descriptor();

        let existing = self
            .store
            .list_indexes()
            .await
            .map_err(provisioning_error)?;
        if existing.iter().any(|index| index.matches(&wanted)) {
            tracing::debug!("Spatial index {} already present", wanted.name);
            return Ok(());
        }

        match self
            .store
            .create_index(&wanted)
            .await
            .map_err(provisioning_error)?
        {
            IndexCreation::Created => {
                tracing::info!("Spatial index {} created", wanted.name)
            }
            IndexCreation::AlreadyExists => {
                tracing::info!("Spatial index {} already exists", wanted.name)
            }
        }

        // An index can hold the name with a different definition
        let present = self
            .store
            .list_indexes()
            .await
            .map_err(provisioning_error)?;
        if !present.iter().any(|index| index.matches(&wanted)) {
            tracing::error!(
                "Index {} exists but is not a spatial index on {}",
                wanted.name,
                DRIVER_LOCATION_FIELD
            );
            return Err(StorageError::IndexProvisioning(format!(
                "index {} exists with a different definition",
                wanted.name
            ))
            .into());
        }

        Ok(())
    }
}

/// Timeouts keep their identity so callers can map them to 504
fn provisioning_error(e: AppError) -> AppError {
    match e {
        AppError::Storage(StorageError::Timeout(_))
        | AppError::Storage(StorageError::IndexProvisioning(_)) => e,
        other => {
            tracing::error!("Spatial index provisioning failed: {:?}", other);
            StorageError::IndexProvisioning(other.to_string()).into()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::drivers::models::{Driver, GeoPoint};
    use crate::features::drivers::store::{IndexKind, MemoryDriverStore};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Memory store that counts index calls and can misbehave on demand
    #[derive(Default)]
    struct ScriptedStore {
        inner: MemoryDriverStore,
        list_calls: AtomicUsize,
        create_calls: AtomicUsize,
        /// Listing reports no indexes until the first create call
        stale_listing: bool,
        /// Number of upcoming create calls that fail
        failing_creates: AtomicUsize,
        create_delay: Option<Duration>,
    }

    #[async_trait]
    impl DriverStore for ScriptedStore {
        async fn insert(&self, driver: &Driver) -> Result<()> {
            self.inner.insert(driver).await
        }
        async fn replace(&self, id: &str, driver: &Driver) -> Result<()> {
            self.inner.replace(id, driver).await
        }
        async fn find_by_id(&self, id: &str) -> Result<Option<Driver>> {
            self.inner.find_by_id(id).await
        }
        async fn find_by_plate(&self, plate: &str) -> Result<Option<Driver>> {
            self.inner.find_by_plate(plate).await
        }
        async fn find_page(&self, skip: i64, limit: i64) -> Result<Vec<Driver>> {
            self.inner.find_page(skip, limit).await
        }
        async fn find_near(
            &self,
            origin: GeoPoint,
            max_distance_meters: f64,
            taxi_type: &str,
        ) -> Result<Vec<Driver>> {
            self.inner
                .find_near(origin, max_distance_meters, taxi_type)
                .await
        }
        async fn list_indexes(&self) -> Result<Vec<IndexDescriptor>> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            if self.stale_listing && self.create_calls.load(Ordering::SeqCst) == 0 {
                return Ok(Vec::new());
            }
            self.inner.list_indexes().await
        }
        async fn create_index(&self, index: &IndexDescriptor) -> Result<IndexCreation> {
            self.create_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.create_delay {
                tokio::time::sleep(delay).await;
            }
            let failing = self
                .failing_creates
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if failing {
                return Err(StorageError::Backend("connection reset".to_string()).into());
            }
            self.inner.create_index(index).await
        }
    }

    #[tokio::test]
    async fn test_creates_missing_index_once() {
        let store = Arc::new(ScriptedStore::default());
        let service = GeoIndexService::new(store.clone());

        assert!(!service.is_ready());
        service.ensure_index().await.unwrap();
        service.ensure_index().await.unwrap();
        service.ensure_index().await.unwrap();

        assert!(service.is_ready());
        assert_eq!(store.list_calls.load(Ordering::SeqCst), 2);
        assert_eq!(store.create_calls.load(Ordering::SeqCst), 1);

        let indexes = store.inner.list_indexes().await.unwrap();
        assert_eq!(indexes.len(), 1);
        assert_eq!(indexes[0].kind, IndexKind::SpatialPoint);
        assert_eq!(indexes[0].name, DRIVER_LOCATION_INDEX);
    }

    #[tokio::test]
    async fn test_existing_index_is_not_recreated() {
        let store = Arc::new(ScriptedStore::default());
        store
            .inner
            .create_index(&GeoIndexService::descriptor())
            .await
            .unwrap();

        let service = GeoIndexService::new(store.clone());
        service.ensure_index().await.unwrap();

        assert_eq!(store.create_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_stale_listing_treats_already_exists_as_success() {
        let store = Arc::new(ScriptedStore {
            stale_listing: true,
            ..Default::default()
        });
        store
            .inner
            .create_index(&GeoIndexService::descriptor())
            .await
            .unwrap();

        let service = GeoIndexService::new(store.clone());
        service.ensure_index().await.unwrap();

        assert!(service.is_ready());
        assert_eq!(store.create_calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.inner.list_indexes().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_provisioning() {
        let store = Arc::new(ScriptedStore {
            create_delay: Some(Duration::from_millis(50)),
            ..Default::default()
        });
        let service = Arc::new(GeoIndexService::new(store.clone()));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let service = Arc::clone(&service);
                tokio::spawn(async move { service.ensure_index().await })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.create_calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.inner.list_indexes().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_independent_managers_racing_leave_one_index() {
        let store = Arc::new(ScriptedStore {
            stale_listing: true,
            ..Default::default()
        });

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let service = GeoIndexService::new(store.clone());
                tokio::spawn(async move { service.ensure_index().await })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.inner.list_indexes().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failure_is_not_memoised() {
        let store = Arc::new(ScriptedStore {
            failing_creates: AtomicUsize::new(1),
            ..Default::default()
        });
        let service = GeoIndexService::new(store.clone());

        let first = service.ensure_index().await;
        assert!(matches!(first, Err(AppError::Storage(StorageError::IndexProvisioning(_)))));
        assert!(!service.is_ready());

        service.ensure_index().await.unwrap();
        assert!(service.is_ready());
        assert_eq!(store.create_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_name_taken_by_other_definition_is_an_error() {
        let store = Arc::new(ScriptedStore::default());
        store
            .inner
            .create_index(&IndexDescriptor {
                name: DRIVER_LOCATION_INDEX.to_string(),
                fields: vec!["plate".to_string()],
                kind: IndexKind::Standard,
            })
            .await
            .unwrap();
        let service = GeoIndexService::new(store.clone());

        for _ in 0..2 {
            let result = service.ensure_index().await;
            assert!(matches!(result, Err(AppError::Storage(StorageError::IndexProvisioning(_)))));
            assert!(!service.is_ready());
        }
        assert_eq!(store.create_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_timeout_passes_through() {
        let error = provisioning_error(StorageError::Timeout(Duration::from_secs(3)).into());
        assert!(matches!(error, AppError::Storage(StorageError::Timeout(_))));
    }
}
