//! User account repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sf_core::traits::Id;
use sf_models::{Role, UserAccount};
use sqlx::{FromRow, PgPool};

use super::{parse_column, require_id};
use crate::repository::{Repository, RepositoryError, RepositoryResult, UserRepository};

const COLUMNS: &str = "id, login, email, name, password_hash, roles, active, created_at, updated_at";

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub login: String,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub roles: Vec<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for UserAccount {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let roles = row
            .roles
            .iter()
            .map(|role| parse_column::<Role>("users.roles", role))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(UserAccount {
            id: Some(row.id),
            login: row.login,
            email: row.email,
            name: row.name,
            password_hash: row.password_hash,
            roles,
            active: row.active,
            created_at: Some(row.created_at),
            updated_at: Some(row.updated_at),
        })
    }
}

fn role_names(roles: &[Role]) -> Vec<String> {
    roles.iter().map(|role| role.as_str().to_string()).collect()
}

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository<UserAccount> for PgUserRepository {
    async fn find_by_id(&self, id: Id) -> RepositoryResult<Option<UserAccount>> {
        let row = sqlx::query_as::<_, UserRow>(&format!("SELECT {COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(UserAccount::try_from).transpose()
    }

    async fn find_all(&self) -> RepositoryResult<Vec<UserAccount>> {
        let rows =
            sqlx::query_as::<_, UserRow>(&format!("SELECT {COLUMNS} FROM users ORDER BY id ASC"))
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(UserAccount::try_from).collect()
    }

    async fn count(&self) -> RepositoryResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn create(&self, user: UserAccount) -> RepositoryResult<UserAccount> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (login, email, name, password_hash, roles, active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW())
            RETURNING {COLUMNS}
            "#
        ))
        .bind(&user.login)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(role_names(&user.roles))
        .bind(user.active)
        .fetch_one(&self.pool)
        .await?;

        UserAccount::try_from(row)
    }

    async fn update(&self, user: UserAccount) -> RepositoryResult<UserAccount> {
        let id = require_id(user.id, "User")?;
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users SET
                login = $1,
                email = $2,
                name = $3,
                password_hash = $4,
                roles = $5,
                active = $6,
                updated_at = NOW()
            WHERE id = $7
            RETURNING {COLUMNS}
            "#
        ))
        .bind(&user.login)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(role_names(&user.roles))
        .bind(user.active)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("User with id {} not found", id)))?;

        UserAccount::try_from(row)
    }

    async fn delete(&self, id: Id) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!(
                "User with id {} not found",
                id
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_login(&self, login: &str) -> RepositoryResult<Option<UserAccount>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {COLUMNS} FROM users WHERE login = $1"
        ))
        .bind(login)
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserAccount::try_from).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roles_column() {
        let row = UserRow {
            id: 1,
            login: "admin".into(),
            email: "admin@example.com".into(),
            name: String::new(),
            password_hash: "$argon2id$stub".into(),
            roles: vec!["ADMIN".into(), "CEO".into()],
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let user = UserAccount::try_from(row).unwrap();
        assert_eq!(user.roles, vec![Role::Admin, Role::Ceo]);
        assert_eq!(role_names(&user.roles), vec!["ADMIN", "CEO"]);
    }
}
