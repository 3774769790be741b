use registrar_core::AppError;
use sqlx::PgPool;
use tracing::{info, instrument};

use crate::modules::levels::model::{DEFAULT_LEVELS, InitializeLevelsResponse, Level};

pub struct LevelService;

impl LevelService {
    #[instrument(skip(db))]
    pub async fn list_levels(db: &PgPool) -> Result<Vec<Level>, AppError> {
        let levels = sqlx::query_as::<_, Level>(
            "SELECT id, name, description, created_at FROM levels ORDER BY name",
        )
        .fetch_all(db)
        .await?;
        Ok(levels)
    }

    /// Creates whichever default levels are missing. Safe to call repeatedly.
    #[instrument(skip(db))]
    pub async fn initialize_levels(db: &PgPool) -> Result<InitializeLevelsResponse, AppError> {
        let mut tx = db.begin().await?;
        let mut created = 0;

        for (name, description) in DEFAULT_LEVELS {
            let result = sqlx::query(
                "INSERT INTO levels (name, description) VALUES ($1, $2)
                 ON CONFLICT (name) DO NOTHING",
            )
            .bind(name)
            .bind(description)
            .execute(&mut *tx)
            .await?;
            created += result.rows_affected();
        }

        tx.commit().await?;

        if created > 0 {
            info!(created, "Default levels initialized");
        }

        let levels = Self::list_levels(db).await?;
        Ok(InitializeLevelsResponse { created, levels })
    }
}
