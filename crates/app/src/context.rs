//! App Context

use std::sync::Arc;

use custody::catalog::{Catalog, CatalogError};
use thiserror::Error;

use crate::{
    config::AppConfig,
    database::{self, Db},
    domain::{
        audit::{AuditService, PgAuditService},
        profiles::{PgProfilesService, ProfilesService},
        requests::{LedgerService, PgLedgerService},
        tokens::{PgTokensService, TokensService},
        transitions::{PgTransitionsService, TransitionsService},
        waitlist::{PgWaitlistService, WaitlistNotifier, WaitlistService},
    },
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),

    #[error("failed to load token catalog")]
    Catalog(#[source] CatalogError),
}

#[derive(Clone)]
pub struct AppContext {
    pub catalog: Arc<Catalog>,
    pub tokens: Arc<dyn TokensService>,
    pub ledger: Arc<dyn LedgerService>,
    pub audit: Arc<dyn AuditService>,
    pub waitlist: Arc<dyn WaitlistService>,
    pub profiles: Arc<dyn ProfilesService>,
    pub transitions: Arc<dyn TransitionsService>,
}

impl AppContext {
    /// Load the catalog, connect to the database and wire every service.
    ///
    /// # Errors
    ///
    /// Returns an error when the catalog is invalid or no database connection can be made.
    pub async fn from_config(
        config: &AppConfig,
        notifier: Arc<dyn WaitlistNotifier>,
    ) -> Result<Self, AppInitError> {
        let catalog = Catalog::load(&config.catalog_path).map_err(AppInitError::Catalog)?;

        let pool = database::connect(&config.database.database_url)
            .await
            .map_err(AppInitError::Database)?;

        Ok(Self::new(Db::new(pool), catalog, config, notifier))
    }

    #[must_use]
    pub fn new(
        db: Db,
        catalog: Catalog,
        config: &AppConfig,
        notifier: Arc<dyn WaitlistNotifier>,
    ) -> Self {
        Self {
            catalog: Arc::new(catalog),
            tokens: Arc::new(PgTokensService::new(db.clone())),
            ledger: Arc::new(PgLedgerService::new(db.clone())),
            audit: Arc::new(PgAuditService::new(db.clone())),
            waitlist: Arc::new(PgWaitlistService::new(db.clone())),
            profiles: Arc::new(PgProfilesService::new(db.clone())),
            transitions: Arc::new(PgTransitionsService::new(
                db,
                config.limits.into(),
                notifier,
            )),
        }
    }
}
