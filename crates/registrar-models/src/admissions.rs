//! Application intake: screening slots, document slots and the form itself.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::ids::{DepartmentId, ProgramId, ScreeningSlotId, StudentId};
use crate::students::{AcademicRecord, HealthInfo, Student, StudentStatus};
use crate::value_types::{ClockTime, Sex};
use registrar_core::PaginationParams;

// ============================================================================
// Screening slots
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ScreeningSlot {
    pub id: ScreeningSlotId,
    pub date: NaiveDate,
    pub start_time: ClockTime,
    pub max_capacity: i32,
    pub bookings: i32,
    pub created_at: DateTime<Utc>,
}

impl ScreeningSlot {
    pub fn has_capacity(&self) -> bool {
        self.bookings < self.max_capacity
    }

    /// A slot starting exactly now still counts as upcoming.
    pub fn is_upcoming(&self, now: NaiveDateTime) -> bool {
        self.date > now.date()
            || (self.date == now.date()
                && self.start_time >= ClockTime::from_naive_time(now.time()))
    }
}

/// Earliest upcoming slot with room left, by (date, start_time).
pub fn first_available(slots: &[ScreeningSlot], now: NaiveDateTime) -> Option<&ScreeningSlot> {
    slots
        .iter()
        .filter(|slot| slot.is_upcoming(now) && slot.has_capacity())
        .min_by_key(|slot| (slot.date, slot.start_time))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateScreeningSlotDto {
    pub date: NaiveDate,
    pub start_time: ClockTime,
    /// Defaults to the configured slot capacity.
    #[validate(range(min = 1, message = "Capacity must be at least 1"))]
    pub max_capacity: Option<i32>,
}

/// A booked seat, as shown to the applicant.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ScreeningReservation {
    pub slot_id: ScreeningSlotId,
    pub date: NaiveDate,
    pub start_time: ClockTime,
    pub location: String,
}

impl ScreeningReservation {
    pub fn for_slot(slot: &ScreeningSlot, location: &str) -> Self {
        Self {
            slot_id: slot.id,
            date: slot.date,
            start_time: slot.start_time,
            location: location.to_string(),
        }
    }
}

// ============================================================================
// Documents
// ============================================================================

registrar_core::text_enum! {
    /// File fields accepted with an application.
    pub enum DocumentKind {
        SecondarySchoolResult => "secondary_school_result",
        BirthCertificate => "birth_certificate",
        NationalId => "national_id",
        PrimaryCertificate => "primary_certificate",
        Transcript => "transcript",
        PersonalStatement => "personal_statement",
        GeneratedPdf => "generated_pdf",
        ProfileImage => "profile_image",
    }
}

impl DocumentKind {
    /// Only the generated application PDF is required.
    pub const fn is_mandatory(&self) -> bool {
        matches!(self, Self::GeneratedPdf)
    }
}

/// Storage ids of an application's documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct ApplicationDocuments {
    pub secondary_school_result: Option<String>,
    pub birth_certificate: Option<String>,
    pub national_id: Option<String>,
    pub primary_certificate: Option<String>,
    pub transcript: Option<String>,
    pub personal_statement: Option<String>,
    pub generated_pdf: Option<String>,
    pub profile_image: Option<String>,
}

impl ApplicationDocuments {
    pub fn get(&self, kind: DocumentKind) -> Option<&str> {
        self.slot(kind).as_deref()
    }

    pub fn set(&mut self, kind: DocumentKind, storage_id: Option<String>) {
        *self.slot_mut(kind) = storage_id;
    }

    /// Kinds without a stored document, in declaration order.
    pub fn missing(&self) -> Vec<DocumentKind> {
        DocumentKind::ALL
            .iter()
            .copied()
            .filter(|kind| self.get(*kind).is_none())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DocumentKind, &str)> {
        DocumentKind::ALL
            .iter()
            .filter_map(|kind| self.get(*kind).map(|id| (*kind, id)))
    }

    fn slot(&self, kind: DocumentKind) -> &Option<String> {
        match kind {
            DocumentKind::SecondarySchoolResult => &self.secondary_school_result,
            DocumentKind::BirthCertificate => &self.birth_certificate,
            DocumentKind::NationalId => &self.national_id,
            DocumentKind::PrimaryCertificate => &self.primary_certificate,
            DocumentKind::Transcript => &self.transcript,
            DocumentKind::PersonalStatement => &self.personal_statement,
            DocumentKind::GeneratedPdf => &self.generated_pdf,
            DocumentKind::ProfileImage => &self.profile_image,
        }
    }

    fn slot_mut(&mut self, kind: DocumentKind) -> &mut Option<String> {
        match kind {
            DocumentKind::SecondarySchoolResult => &mut self.secondary_school_result,
            DocumentKind::BirthCertificate => &mut self.birth_certificate,
            DocumentKind::NationalId => &mut self.national_id,
            DocumentKind::PrimaryCertificate => &mut self.primary_certificate,
            DocumentKind::Transcript => &mut self.transcript,
            DocumentKind::PersonalStatement => &mut self.personal_statement,
            DocumentKind::GeneratedPdf => &mut self.generated_pdf,
            DocumentKind::ProfileImage => &mut self.profile_image,
        }
    }
}

/// A resolved document link.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DocumentLink {
    pub kind: DocumentKind,
    pub storage_id: String,
    pub url: String,
}

// ============================================================================
// Application numbers
// ============================================================================

/// `{prefix}-{last 6 digits of epoch millis}-{4-digit suffix}`.
pub fn format_application_number(prefix: &str, epoch_millis: i64, suffix: u16) -> String {
    format!(
        "{}-{:06}-{:04}",
        prefix,
        epoch_millis.rem_euclid(1_000_000),
        suffix % 10_000
    )
}

// ============================================================================
// Application form
// ============================================================================

/// The JSON part of an application submission. Files travel as separate
/// multipart fields named after [`DocumentKind`].
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ApplicationForm {
    #[validate(length(min = 1, max = 100, message = "First name is required"))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub middle_name: String,
    #[validate(length(min = 1, max = 100, message = "Last name is required"))]
    pub last_name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, max = 30, message = "Phone is required"))]
    pub phone: String,
    pub date_of_birth: NaiveDate,
    pub sex: Sex,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zip_code: String,
    #[serde(default)]
    pub lga: String,
    #[serde(default)]
    pub religion: String,
    pub department_id: Option<DepartmentId>,
    pub program_id: Option<ProgramId>,
    #[validate(length(min = 1, max = 150, message = "Program name is required"))]
    pub program_name: String,
    #[serde(default)]
    pub concentration: String,
    #[serde(default)]
    pub start_term: String,
    #[serde(default)]
    #[validate(nested)]
    pub academic: AcademicRecord,
    #[serde(default)]
    pub health: HealthInfo,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub recommendation_letters: i32,
    #[validate(custom(function = "must_agree"))]
    pub agree_terms: bool,
}

fn must_agree(agreed: &bool) -> Result<(), ValidationError> {
    if *agreed {
        Ok(())
    } else {
        Err(ValidationError::new("agree_terms")
            .with_message("The terms must be accepted".into()))
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubmitApplicationResponse {
    pub student_id: StudentId,
    pub application_number: String,
    pub status: StudentStatus,
    pub screening: ScreeningReservation,
    /// Optional documents that were not provided or failed to store.
    pub missing_documents: Vec<DocumentKind>,
}

/// A student row with its documents resolved to URLs.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApplicationDetails {
    pub student: Student,
    pub screening: Option<ScreeningReservation>,
    pub documents: Vec<DocumentLink>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ApplicantFilterParams {
    pub status: Option<StudentStatus>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn slot(day: NaiveDate, start: &str, max_capacity: i32, bookings: i32) -> ScreeningSlot {
        ScreeningSlot {
            id: ScreeningSlotId::new(),
            date: day,
            start_time: start.parse().unwrap(),
            max_capacity,
            bookings,
            created_at: Utc::now(),
        }
    }

    fn at(day: NaiveDate, h: u32, m: u32) -> NaiveDateTime {
        day.and_time(NaiveTime::from_hms_opt(h, m, 0).unwrap())
    }

    #[test]
    fn test_first_available_skips_full_and_past_slots() {
        let today = date(2025, 3, 10);
        let slots = vec![
            slot(date(2025, 3, 9), "09:00", 50, 0),
            slot(today, "08:00", 50, 0),
            slot(today, "10:00", 50, 50),
            slot(date(2025, 3, 12), "09:00", 50, 49),
            slot(date(2025, 3, 11), "14:00", 50, 10),
        ];

        let chosen = first_available(&slots, at(today, 9, 0)).unwrap();
        assert_eq!(chosen.date, date(2025, 3, 11));
        assert_eq!(chosen.start_time.to_string(), "14:00");
    }

    #[test]
    fn test_first_available_fills_partially_booked_slot() {
        let day = date(2025, 5, 1);
        let slots = vec![slot(day, "09:00", 1, 0), slot(day, "11:00", 50, 0)];
        let chosen = first_available(&slots, at(date(2025, 4, 30), 12, 0)).unwrap();
        assert_eq!(chosen.start_time.to_string(), "09:00");
    }

    #[test]
    fn test_slot_starting_now_is_available() {
        let today = date(2025, 3, 10);
        let slots = vec![slot(today, "09:00", 5, 0)];
        assert!(first_available(&slots, at(today, 9, 0)).is_some());
        assert!(first_available(&slots, at(today, 9, 1)).is_none());
    }

    #[test]
    fn test_no_slot_when_everything_is_full() {
        let slots = vec![slot(date(2030, 1, 1), "09:00", 2, 2)];
        assert!(first_available(&slots, at(date(2025, 1, 1), 0, 0)).is_none());
    }

    #[test]
    fn test_application_number_format() {
        assert_eq!(
            format_application_number("JICO", 1_717_171_234_567, 42),
            "JICO-234567-0042"
        );
        assert_eq!(format_application_number("JICO", 1_000_000, 7), "JICO-000000-0007");
    }

    #[test]
    fn test_documents_missing_and_set() {
        let mut docs = ApplicationDocuments::default();
        assert_eq!(docs.missing().len(), DocumentKind::ALL.len());

        docs.set(DocumentKind::GeneratedPdf, Some("applications/a.pdf".to_string()));
        docs.set(DocumentKind::Transcript, Some("applications/t.pdf".to_string()));
        assert_eq!(docs.get(DocumentKind::GeneratedPdf), Some("applications/a.pdf"));
        assert!(!docs.missing().contains(&DocumentKind::GeneratedPdf));
        assert_eq!(docs.iter().count(), 2);
    }

    #[test]
    fn test_only_generated_pdf_is_mandatory() {
        let mandatory: Vec<_> = DocumentKind::ALL
            .iter()
            .filter(|k| k.is_mandatory())
            .collect();
        assert_eq!(mandatory, vec![&DocumentKind::GeneratedPdf]);
    }
}
