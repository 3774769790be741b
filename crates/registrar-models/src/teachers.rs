use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::ids::{CourseId, DepartmentId, TeacherId};
use crate::value_types::Sex;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Teacher {
    pub id: TeacherId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub birthday: Option<NaiveDate>,
    pub sex: Sex,
    pub image_url: Option<String>,
    /// School-issued staff number.
    pub staff_number: String,
    pub department_id: Option<DepartmentId>,
    /// Derived from the course/teacher links.
    pub course_ids: Vec<CourseId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub fn full_name(first_name: &str, last_name: &str) -> String {
    format!("{} {}", first_name.trim(), last_name.trim())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateTeacherDto {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, max = 100, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "Last name is required"))]
    pub last_name: String,
    #[validate(length(min = 1, max = 30, message = "Phone is required"))]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    pub birthday: Option<NaiveDate>,
    pub sex: Sex,
    pub image_url: Option<String>,
    #[validate(length(min = 1, max = 50, message = "Staff number is required"))]
    pub staff_number: String,
    pub department_id: Option<DepartmentId>,
    #[serde(default)]
    pub course_ids: Vec<CourseId>,
}

/// Partial update. Names change together; a given `course_ids` replaces the
/// teacher's course set.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_name_pair"))]
pub struct UpdateTeacherDto {
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    #[validate(length(min = 1, max = 30))]
    pub phone: Option<String>,
    pub address: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub sex: Option<Sex>,
    pub image_url: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub staff_number: Option<String>,
    pub department_id: Option<DepartmentId>,
    pub course_ids: Option<Vec<CourseId>>,
}

impl UpdateTeacherDto {
    pub fn name(&self) -> Option<String> {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => Some(full_name(first, last)),
            _ => None,
        }
    }
}

fn validate_name_pair(dto: &UpdateTeacherDto) -> Result<(), ValidationError> {
    if dto.first_name.is_some() != dto.last_name.is_some() {
        return Err(ValidationError::new("name_pair")
            .with_message("first_name and last_name must be provided together".into()));
    }
    Ok(())
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TeacherEmailParams {
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update_dto() -> UpdateTeacherDto {
        UpdateTeacherDto {
            email: None,
            first_name: None,
            last_name: None,
            phone: None,
            address: None,
            birthday: None,
            sex: None,
            image_url: None,
            staff_number: None,
            department_id: None,
            course_ids: None,
        }
    }

    #[test]
    fn test_full_name() {
        assert_eq!(full_name("Amina ", " Bello"), "Amina Bello");
    }

    #[test]
    fn test_update_requires_both_names() {
        let mut dto = update_dto();
        dto.first_name = Some("Amina".to_string());
        assert!(dto.validate().is_err());

        dto.last_name = Some("Bello".to_string());
        assert!(dto.validate().is_ok());
        assert_eq!(dto.name().as_deref(), Some("Amina Bello"));
    }

    #[test]
    fn test_create_rejects_bad_email() {
        let dto = CreateTeacherDto {
            email: "not-an-email".to_string(),
            first_name: "Amina".to_string(),
            last_name: "Bello".to_string(),
            phone: "08030000000".to_string(),
            address: String::new(),
            birthday: None,
            sex: Sex::Female,
            image_url: None,
            staff_number: "T-001".to_string(),
            department_id: None,
            course_ids: vec![],
        };
        assert!(dto.validate().is_err());
    }
}
