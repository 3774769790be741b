use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::ids::{EventId, UserId};
use crate::value_types::ClockTime;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Event {
    pub id: EventId,
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct EventWithCreator {
    pub id: EventId,
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
    pub created_by: UserId,
    pub creator_name: Option<String>,
    pub creator_email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_event_times"))]
pub struct CreateEventDto {
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub date: NaiveDate,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
}

fn validate_event_times(dto: &CreateEventDto) -> Result<(), ValidationError> {
    if dto.start_time >= dto.end_time {
        return Err(ValidationError::new("time_range")
            .with_message("Start time must be before end time".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_times_must_be_ordered() {
        let dto = CreateEventDto {
            title: "Sports day".to_string(),
            description: String::new(),
            date: NaiveDate::from_ymd_opt(2025, 4, 4).unwrap(),
            start_time: "15:00".parse().unwrap(),
            end_time: "10:00".parse().unwrap(),
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_malformed_time_is_rejected_at_deserialization() {
        let json = r#"{"title":"Open day","date":"2025-04-04","start_time":"9:00","end_time":"10:00"}"#;
        assert!(serde_json::from_str::<CreateEventDto>(json).is_err());
    }
}
