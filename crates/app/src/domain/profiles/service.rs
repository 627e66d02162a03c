//! Profiles service: the display-name lookup consulted when requests are created.

use async_trait::async_trait;
use custody::ids::UserId;
use mockall::automock;
use tracing::info;

use crate::{
    database::Db,
    domain::{
        profiles::{errors::ProfilesServiceError, repository::PgProfilesRepository},
        requests::repository::PgRequestsRepository,
    },
};

#[derive(Debug, Clone)]
pub struct PgProfilesService {
    db: Db,
    repository: PgProfilesRepository,
    requests: PgRequestsRepository,
}

impl PgProfilesService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgProfilesRepository::new(),
            requests: PgRequestsRepository::new(),
        }
    }
}

#[async_trait]
impl ProfilesService for PgProfilesService {
    async fn get_display_name(&self, user: UserId) -> Result<Option<String>, ProfilesServiceError> {
        let mut tx = self.db.begin().await?;

        let name = self.repository.find_name(&mut tx, user).await?;

        tx.commit().await?;

        Ok(name)
    }

    #[tracing::instrument(
        name = "profiles.service.set_display_name",
        skip(self, name),
        fields(user_id = %user),
        err
    )]
    async fn set_display_name(
        &self,
        user: UserId,
        name: &str,
    ) -> Result<u64, ProfilesServiceError> {
        let name = name.trim();

        if name.is_empty() {
            return Err(ProfilesServiceError::InvalidData);
        }

        let mut tx = self.db.begin().await?;

        self.repository.upsert_name(&mut tx, user, name).await?;

        let backfilled = self
            .requests
            .backfill_display_name(&mut tx, user, name)
            .await?;

        tx.commit().await?;

        info!(backfilled, "display name updated");

        Ok(backfilled)
    }
}

#[automock]
#[async_trait]
pub trait ProfilesService: Send + Sync {
    /// The stored display name, if the user has set one.
    async fn get_display_name(&self, user: UserId) -> Result<Option<String>, ProfilesServiceError>;

    /// Store a display name and fill it in on the user's requests that were created without one.
    ///
    /// Returns how many requests were back-filled.
    async fn set_display_name(&self, user: UserId, name: &str)
    -> Result<u64, ProfilesServiceError>;
}
