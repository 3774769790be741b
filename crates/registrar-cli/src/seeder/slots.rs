//! Screening slot seeding.

use chrono::{Datelike, Duration, Local, NaiveDate, Weekday};
use sqlx::PgPool;
use std::time::Instant;

use super::models::{SlotSeed, SlotsConfig};
use super::placeholders;

/// Generates one slot per configured time on each of the next `days`
/// weekdays after `from`.
pub fn generate_slots(from: NaiveDate, config: &SlotsConfig) -> Vec<SlotSeed> {
    let mut slots = Vec::with_capacity(config.days * config.times.len());
    let mut date = from;
    let mut days = 0;

    while days < config.days {
        date += Duration::days(1);
        if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            continue;
        }
        days += 1;
        slots.extend(config.times.iter().map(|&start_time| SlotSeed {
            date,
            start_time,
            max_capacity: config.max_capacity,
        }));
    }

    slots
}

/// Seeds screening slots starting tomorrow.
pub async fn seed_slots(
    db: &PgPool,
    config: &SlotsConfig,
) -> Result<u64, Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!("🗓️  Seeding screening slots...");

    let slots = generate_slots(Local::now().date_naive(), config);
    let inserted = insert_slots_batch(db, &slots).await?;

    println!(
        "   ✓ Inserted {} screening slots in {:?}",
        inserted,
        start_time.elapsed()
    );

    Ok(inserted)
}

pub async fn insert_slots_batch(
    db: &PgPool,
    slots: &[SlotSeed],
) -> Result<u64, Box<dyn std::error::Error>> {
    const BATCH_SIZE: usize = 500;
    let mut tx = db.begin().await?;
    let mut inserted = 0;

    for chunk in slots.chunks(BATCH_SIZE) {
        let query = format!(
            "INSERT INTO screening_slots (date, start_time, max_capacity) VALUES {}",
            placeholders(chunk.len(), 3)
        );
        let mut q = sqlx::query(&query);
        for slot in chunk {
            q = q.bind(slot.date).bind(slot.start_time).bind(slot.max_capacity);
        }
        inserted += q.execute(&mut *tx).await?.rows_affected();
    }

    tx.commit().await?;
    Ok(inserted)
}
