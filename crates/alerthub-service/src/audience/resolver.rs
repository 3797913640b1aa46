//! Computes the exact set of active users an alert addresses.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use alerthub_core::error::AppResult;
use alerthub_core::timeout::bounded;
use alerthub_database::store::DirectoryStore;
use alerthub_entity::alert::{Alert, AudienceScope};
use alerthub_entity::user::User;

/// Resolves an alert's visibility scope to concrete recipients.
#[derive(Debug, Clone)]
pub struct AudienceResolver {
    directory: Arc<dyn DirectoryStore>,
    store_timeout: Duration,
}

impl AudienceResolver {
    /// Creates a new resolver.
    pub fn new(directory: Arc<dyn DirectoryStore>, store_timeout: Duration) -> Self {
        Self {
            directory,
            store_timeout,
        }
    }

    /// Active users entitled to receive `alert`, each listed once.
    ///
    /// The result is a snapshot: later directory changes do not affect it.
    /// A malformed scope fails instead of resolving to nobody.
    pub async fn resolve(&self, alert: &Alert) -> AppResult<Vec<User>> {
        let scope = alert.scope()?;

        let users = match &scope {
            AudienceScope::Organization { organization } => {
                bounded(
                    "resolve organization audience",
                    self.store_timeout,
                    self.directory.active_users_in_organization(organization),
                )
                .await?
            }
            AudienceScope::Team { team_ids } => {
                bounded(
                    "resolve team audience",
                    self.store_timeout,
                    self.directory.active_users_in_teams(team_ids),
                )
                .await?
            }
            AudienceScope::User { user_ids } => {
                bounded(
                    "resolve user audience",
                    self.store_timeout,
                    self.directory.active_users_by_ids(user_ids),
                )
                .await?
            }
        };

        let mut seen = HashSet::with_capacity(users.len());
        let audience: Vec<User> = users
            .into_iter()
            .filter(|u| u.is_active && seen.insert(u.id))
            .collect();

        debug!(
            alert_id = %alert.id,
            visibility = %scope.visibility(),
            recipients = audience.len(),
            "Resolved alert audience"
        );

        Ok(audience)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Fixture;
    use alerthub_core::error::ErrorKind;
    use alerthub_entity::alert::AudienceScope;

    #[tokio::test]
    async fn test_organization_scope_ignores_team_membership() {
        let fx = Fixture::new().await;
        let team = fx.team("Engineering", "acme").await;
        let u1 = fx.user("u1", "acme", Some(team.id)).await;
        let u2 = fx.user("u2", "acme", None).await;
        fx.user("u3", "globex", Some(team.id)).await;
        let mut inactive = fx.user("u4", "acme", None).await;
        inactive.is_active = false;
        fx.store.put_user(inactive).await;

        let alert = fx
            .alert(AudienceScope::Organization {
                organization: "acme".to_string(),
            })
            .await;

        let ids: Vec<_> = fx.resolver().resolve(&alert).await.unwrap().iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![u1.id, u2.id]);
    }

    #[tokio::test]
    async fn test_team_scope_deduplicates_and_snapshots() {
        let fx = Fixture::new().await;
        let eng = fx.team("Engineering", "acme").await;
        let ops = fx.team("Ops", "acme").await;
        let u1 = fx.user("u1", "acme", Some(eng.id)).await;
        let u2 = fx.user("u2", "acme", Some(ops.id)).await;
        fx.user("u3", "acme", None).await;

        let alert = fx
            .alert(AudienceScope::Team {
                team_ids: vec![eng.id, ops.id, eng.id],
            })
            .await;

        let audience = fx.resolver().resolve(&alert).await.unwrap();
        assert_eq!(audience.len(), 2);

        let mut moved = u2.clone();
        moved.team_id = None;
        fx.store.put_user(moved).await;

        let ids: Vec<_> = audience.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![u1.id, u2.id]);
    }

    #[tokio::test]
    async fn test_user_scope_filters_inactive_targets() {
        let fx = Fixture::new().await;
        let u1 = fx.user("u1", "acme", None).await;
        let mut u2 = fx.user("u2", "acme", None).await;
        u2.is_active = false;
        fx.store.put_user(u2.clone()).await;

        let alert = fx
            .alert(AudienceScope::User {
                user_ids: vec![u1.id, u2.id],
            })
            .await;

        let audience = fx.resolver().resolve(&alert).await.unwrap();
        assert_eq!(audience.len(), 1);
        assert_eq!(audience[0].id, u1.id);
    }

    #[tokio::test]
    async fn test_malformed_scope_fails_fast() {
        let fx = Fixture::new().await;
        fx.user("u1", "acme", None).await;
        let mut alert = fx
            .alert(AudienceScope::Organization {
                organization: "acme".to_string(),
            })
            .await;
        alert.target_organization = None;

        let err = fx.resolver().resolve(&alert).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }
}
