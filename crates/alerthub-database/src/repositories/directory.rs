//! User and team repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use alerthub_core::error::AppResult;
use alerthub_entity::team::Team;
use alerthub_entity::user::User;

use super::db_error;
use crate::store::DirectoryStore;

/// Repository for the user and team directory.
#[derive(Debug, Clone)]
pub struct DirectoryRepository {
    pool: PgPool,
}

impl DirectoryRepository {
    /// Create a new directory repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DirectoryStore for DirectoryRepository {
    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to find user"))
    }

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to find user by username"))
    }

    async fn active_users_in_organization(&self, organization: &str) -> AppResult<Vec<User>> {
        sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE is_active AND organization = $1 ORDER BY username",
        )
        .bind(organization)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list organization users"))
    }

    async fn active_users_in_teams(&self, team_ids: &[Uuid]) -> AppResult<Vec<User>> {
        sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE is_active AND team_id = ANY($1) ORDER BY username",
        )
        .bind(team_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list team users"))
    }

    async fn active_users_by_ids(&self, user_ids: &[Uuid]) -> AppResult<Vec<User>> {
        sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE is_active AND id = ANY($1) ORDER BY username",
        )
        .bind(user_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list target users"))
    }

    async fn find_team_by_name(&self, organization: &str, name: &str) -> AppResult<Option<Team>> {
        sqlx::query_as::<_, Team>("SELECT * FROM teams WHERE organization = $1 AND name = $2")
            .bind(organization)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to find team"))
    }

    async fn insert_user(&self, user: &User) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (id, username, email, phone_number, organization, team_id, is_active, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.phone_number)
        .bind(&user.organization)
        .bind(user.team_id)
        .bind(user.is_active)
        .bind(user.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to create user"))
    }

    async fn insert_team(&self, team: &Team) -> AppResult<Team> {
        sqlx::query_as::<_, Team>(
            "INSERT INTO teams (id, name, organization, is_active, created_at) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(team.id)
        .bind(&team.name)
        .bind(&team.organization)
        .bind(team.is_active)
        .bind(team.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to create team"))
    }
}
