//! Development data seeding.
//!
//! [`seed_all`] creates reference levels, a generated catalog and screening
//! slots. [`clear_all`] removes catalog and scheduling data but keeps users,
//! students and levels.

pub mod catalog;
pub mod levels;
pub mod models;
pub mod slots;

pub use models::{CatalogPerDepartment, SeedConfig, SlotsConfig};

use sqlx::PgPool;
use std::time::Instant;

/// Builds `rows` groups of `width` positional parameters:
/// `($1, $2), ($3, $4)`.
pub(crate) fn placeholders(rows: usize, width: usize) -> String {
    (0..rows)
        .map(|row| {
            let params: Vec<String> = (1..=width)
                .map(|col| format!("${}", row * width + col))
                .collect();
            format!("({})", params.join(", "))
        })
        .collect::<Vec<_>>()
        .join(", ")
}

pub async fn seed_all(db: &PgPool, config: SeedConfig) -> Result<(), Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!("🌱 Starting database seeding...\n");

    levels::seed_levels(db).await?;
    catalog::seed_catalog(db, config.num_departments, &config.catalog).await?;
    slots::seed_slots(db, &config.slots).await?;

    println!("\n✅ Seeding finished in {:?}", start_time.elapsed());
    Ok(())
}

/// Deletes seeded catalog and scheduling data. Screening slots that hold a
/// booking are kept.
pub async fn clear_all(db: &PgPool) -> Result<(), Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!("🗑️  Clearing seeded data...");

    let mut tx = db.begin().await?;
    for statement in [
        "DELETE FROM exam_timetables",
        "DELETE FROM timetables",
        "DELETE FROM results",
        "DELETE FROM course_programs",
        "DELETE FROM course_teachers",
        "DELETE FROM courses",
        "DELETE FROM teachers",
        "DELETE FROM programs",
        "DELETE FROM departments",
        "DELETE FROM screening_slots WHERE bookings = 0",
    ] {
        let affected = sqlx::query(statement).execute(&mut *tx).await?.rows_affected();
        println!("   ✓ {} ({} rows)", statement, affected);
    }
    tx.commit().await?;

    println!("\n✅ Cleared seeded data in {:?}", start_time.elapsed());
    Ok(())
}
