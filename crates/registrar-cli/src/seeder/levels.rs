//! Reference level seeding.

use registrar_models::levels::DEFAULT_LEVELS;
use sqlx::PgPool;
use std::time::Instant;

/// Inserts the default levels, skipping names that already exist. Returns
/// how many were created.
pub async fn seed_levels(db: &PgPool) -> Result<u64, Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!("📊 Seeding reference levels...");

    let mut created = 0;
    for (name, description) in DEFAULT_LEVELS {
        created += sqlx::query(
            "INSERT INTO levels (name, description) VALUES ($1, $2) ON CONFLICT (name) DO NOTHING",
        )
        .bind(name)
        .bind(description)
        .execute(db)
        .await?
        .rows_affected();
    }

    println!(
        "   ✓ Inserted {} levels in {:?}",
        created,
        start_time.elapsed()
    );

    Ok(created)
}
