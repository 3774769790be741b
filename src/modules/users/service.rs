use registrar_auth::Claims;
use registrar_core::{AppError, Paginated, Role};
use registrar_models::{StudentStatus, UserId};
use sqlx::PgPool;
use tracing::{info, instrument};

use crate::metrics::track_user_created;
use crate::modules::users::model::{User, UserFilterParams};

const USER_COLUMNS: &str =
    "id, external_identity_ref, email, name, image_url, role, created_at, updated_at";

pub struct UserService;

impl UserService {
    /// Upserts the user behind `claims`. Email and name follow the identity
    /// provider on every call; the role is only taken from the token when
    /// the row is first created.
    #[instrument(skip(db, claims), fields(sub = %claims.sub))]
    pub async fn resolve_user(db: &PgPool, claims: &Claims) -> Result<User, AppError> {
        let existing = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE external_identity_ref = $1",
            USER_COLUMNS
        ))
        .bind(&claims.sub)
        .fetch_optional(db)
        .await?;

        if let Some(user) = existing {
            let unchanged =
                user.email == claims.email && (claims.name.is_none() || user.name == claims.name);
            if unchanged {
                return Ok(user);
            }
        }

        Self::upsert(db, claims).await
    }

    async fn upsert(db: &PgPool, claims: &Claims) -> Result<User, AppError> {
        let role = claims.role.unwrap_or_default();
        let (user_id, inserted) = sqlx::query_as::<_, (UserId, bool)>(
            r#"INSERT INTO users (external_identity_ref, email, name, role)
               VALUES ($1, $2, $3, $4)
               ON CONFLICT (external_identity_ref) DO UPDATE
               SET email = EXCLUDED.email,
                   name = COALESCE(EXCLUDED.name, users.name),
                   updated_at = NOW()
               RETURNING id, (xmax = 0) AS inserted"#,
        )
        .bind(&claims.sub)
        .bind(&claims.email)
        .bind(&claims.name)
        .bind(role)
        .fetch_one(db)
        .await?;

        if inserted {
            info!(user_id = %user_id, role = %role, "Created user on first sign-in");
            track_user_created(role.as_str());
        }

        Self::get_user(db, user_id).await
    }

    #[instrument(skip(db))]
    pub async fn get_user(db: &PgPool, id: UserId) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("User not found")))
    }

    #[instrument(skip(db))]
    pub async fn list_users(
        db: &PgPool,
        filters: UserFilterParams,
    ) -> Result<Paginated<User>, AppError> {
        let limit = filters.pagination.limit();
        let offset = filters.pagination.offset();

        let mut where_clause = String::from(" WHERE 1=1");
        let mut param_count = 0;

        if filters.role.is_some() {
            param_count += 1;
            where_clause.push_str(&format!(" AND role = ${}", param_count));
        }
        if filters.email.is_some() {
            param_count += 1;
            where_clause.push_str(&format!(" AND email ILIKE ${}", param_count));
        }

        let count_query = format!("SELECT COUNT(*) FROM users{}", where_clause);
        let data_query = format!(
            "SELECT {} FROM users{} ORDER BY created_at DESC LIMIT {} OFFSET {}",
            USER_COLUMNS, where_clause, limit, offset
        );

        let email_pattern = filters.email.as_ref().map(|e| format!("%{}%", e));

        let mut count_sql = sqlx::query_scalar::<_, i64>(&count_query);
        let mut data_sql = sqlx::query_as::<_, User>(&data_query);
        if let Some(role) = filters.role {
            count_sql = count_sql.bind(role);
            data_sql = data_sql.bind(role);
        }
        if let Some(pattern) = &email_pattern {
            count_sql = count_sql.bind(pattern);
            data_sql = data_sql.bind(pattern);
        }

        let total = count_sql.fetch_one(db).await?;
        let users = data_sql.fetch_all(db).await?;

        Ok(Paginated::new(users, total, &filters.pagination))
    }

    #[instrument(skip(db))]
    pub async fn update_user_role(db: &PgPool, id: UserId, role: Role) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET role = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(id)
        .bind(role)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("User not found")))
    }

    /// Status of the user's application, if one exists.
    #[instrument(skip(db))]
    pub async fn application_status(
        db: &PgPool,
        user_id: UserId,
    ) -> Result<Option<StudentStatus>, AppError> {
        let status = sqlx::query_scalar::<_, StudentStatus>(
            "SELECT status FROM students WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(db)
        .await?;
        Ok(status)
    }
}
