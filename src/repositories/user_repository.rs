use anyhow::Result;
use sqlx::PgPool;

use crate::models::user::User;

use super::retry_once;

pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user: &User) -> Result<()> {
        sqlx::query(
            "INSERT INTO bilet_users (id, email, full_name, phone, password_hash, role, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(&user.phone)
        .bind(&user.password_hash)
        .bind(&user.role)
        .bind(user.created_at)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        retry_once(|| async {
            let user = sqlx::query_as::<_, User>("SELECT * FROM bilet_users WHERE email = $1")
                .bind(email)
                .fetch_optional(self.pool)
                .await?;

            Ok(user)
        })
        .await
    }
}
