use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use crate::user::models::{Role, User};
use crate::user::repositories::UserRepository;
use stechuhr_common::error::{AppError, AppResult};

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_row(row: PgRow) -> AppResult<User> {
        let role_raw: String = row.get("role");
        Ok(User {
            id: row.get("id"),
            name: row.get("name"),
            pin: row.get("pin"),
            role: Role::from_str(&role_raw).map_err(AppError::Internal)?,
        })
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn list(&self) -> AppResult<Vec<User>> {
        let rows = sqlx::query("select id, name, pin, role from users order by name")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::map_row).collect()
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<User>> {
        let row = sqlx::query("select id, name, pin, role from users where id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        row.map(Self::map_row).transpose()
    }

    async fn get_by_name(&self, name: &str) -> AppResult<Option<User>> {
        let row = sqlx::query("select id, name, pin, role from users where name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        row.map(Self::map_row).transpose()
    }

    async fn authenticate(&self, name: &str, pin: &str) -> AppResult<Option<User>> {
        let row = sqlx::query("select id, name, pin, role from users where name = $1 and pin = $2")
            .bind(name)
            .bind(pin)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        row.map(Self::map_row).transpose()
    }

    async fn set_pin(&self, id: Uuid, pin: &str) -> AppResult<()> {
        let result = sqlx::query("update users set pin = $1 where id = $2 and pin is null")
            .bind(pin)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::Validation(
                "PIN is already set or user does not exist".to_string(),
            ));
        }
        Ok(())
    }

    async fn list_admins(&self) -> AppResult<Vec<User>> {
        let rows = sqlx::query("select id, name, pin, role from users where role = 'admin'")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::map_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create_pool;

    async fn test_repo() -> Option<(PgUserRepository, PgPool)> {
        let url = std::env::var("TEST_DATABASE_URL").ok()?;
        let pool = create_pool(&url).await.expect("db should connect");

        sqlx::query(
            "create table if not exists users (
               id uuid primary key,
               name text not null unique,
               pin text,
               role text not null default 'employee'
             )",
        )
        .execute(&pool)
        .await
        .ok()?;

        Some((PgUserRepository::new(pool.clone()), pool))
    }

    async fn insert_user(pool: &PgPool, name: &str, pin: Option<&str>, role: &str) -> Uuid {
        let id = Uuid::new_v4();
        sqlx::query("insert into users (id, name, pin, role) values ($1, $2, $3, $4)")
            .bind(id)
            .bind(name)
            .bind(pin)
            .bind(role)
            .execute(pool)
            .await
            .expect("insert user");
        id
    }

    #[tokio::test]
    async fn authenticate_rejects_wrong_pin() {
        let (repo, pool) = match test_repo().await {
            Some(r) => r,
            None => return,
        };
        let name = format!("user-{}", Uuid::new_v4());
        insert_user(&pool, &name, Some("1234"), "employee").await;

        assert!(repo
            .authenticate(&name, "1234")
            .await
            .expect("auth")
            .is_some());
        assert!(repo
            .authenticate(&name, "9999")
            .await
            .expect("auth")
            .is_none());
    }

    #[tokio::test]
    async fn set_pin_only_works_once() {
        let (repo, pool) = match test_repo().await {
            Some(r) => r,
            None => return,
        };
        let name = format!("user-{}", Uuid::new_v4());
        let id = insert_user(&pool, &name, None, "employee").await;

        repo.set_pin(id, "4711").await.expect("first set");
        let second = repo.set_pin(id, "0000").await;
        assert!(second.is_err());

        let user = repo.get(id).await.expect("get").expect("exists");
        assert_eq!(user.pin.as_deref(), Some("4711"));
    }
}
