//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::backend::BackendClient;
use crate::cart::CartStore;
use crate::checkout::CheckoutOrchestrator;
use crate::config::StorefrontConfig;
use crate::services::ProfileService;
use crate::shipping::ShippingEstimator;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the backend client and the cart/checkout stores.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    backend: BackendClient,
    carts: CartStore,
    checkout: CheckoutOrchestrator,
    profiles: ProfileService,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `pool` - `PostgreSQL` connection pool (sessions)
    ///
    /// # Errors
    ///
    /// Returns an error if the backend HTTP client cannot be built.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, reqwest::Error> {
        let backend = BackendClient::new(&config.backend)?;
        let carts = CartStore::new(backend.clone(), config.base_currency);
        let estimator = ShippingEstimator::new(backend.clone(), &config.shipping);
        let checkout = CheckoutOrchestrator::new(
            backend.clone(),
            estimator,
            carts.clone(),
            &config.shipping,
            config.base_currency,
        );
        let profiles = ProfileService::new(backend.clone());

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                backend,
                carts,
                checkout,
                profiles,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the backend order-service client.
    #[must_use]
    pub fn backend(&self) -> &BackendClient {
        &self.inner.backend
    }

    /// Get a reference to the cart store.
    #[must_use]
    pub fn carts(&self) -> &CartStore {
        &self.inner.carts
    }

    /// Get a reference to the checkout orchestrator.
    #[must_use]
    pub fn checkout(&self) -> &CheckoutOrchestrator {
        &self.inner.checkout
    }

    /// Get a reference to the profile service.
    #[must_use]
    pub fn profiles(&self) -> &ProfileService {
        &self.inner.profiles
    }
}
