use registrar_core::AppError;
use registrar_models::UserId;
use sqlx::PgPool;
use tracing::{info, instrument};

use crate::modules::events::model::{CreateEventDto, Event, EventWithCreator};
use crate::validator::validate_dto;

pub struct EventService;

impl EventService {
    #[instrument(skip(db, dto), fields(title = %dto.title, date = %dto.date))]
    pub async fn create_event(
        db: &PgPool,
        created_by: UserId,
        dto: CreateEventDto,
    ) -> Result<Event, AppError> {
        validate_dto(&dto)?;

        let event = sqlx::query_as::<_, Event>(
            r#"INSERT INTO events (title, description, date, start_time, end_time, created_by)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING id, title, description, date, start_time, end_time, created_by, created_at"#,
        )
        .bind(dto.title.trim())
        .bind(&dto.description)
        .bind(dto.date)
        .bind(dto.start_time)
        .bind(dto.end_time)
        .bind(created_by)
        .fetch_one(db)
        .await?;

        info!(event_id = %event.id, "Event created");
        Ok(event)
    }

    #[instrument(skip(db))]
    pub async fn list_events(db: &PgPool) -> Result<Vec<EventWithCreator>, AppError> {
        let events = sqlx::query_as::<_, EventWithCreator>(
            r#"SELECT e.id, e.title, e.description, e.date, e.start_time, e.end_time,
                      e.created_by, u.name AS creator_name, u.email AS creator_email, e.created_at
               FROM events e
               JOIN users u ON u.id = e.created_by
               ORDER BY e.created_at DESC"#,
        )
        .fetch_all(db)
        .await?;
        Ok(events)
    }
}
