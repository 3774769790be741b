use chrono::{Local, NaiveDateTime, Utc};
use futures::future::join_all;
use rand::Rng;
use registrar_config::AdmissionsConfig;
use registrar_core::{AppError, FileStorage, Paginated};
use registrar_models::{ClockTime, ScreeningSlotId, StudentId, UserId};
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use tracing::{debug, error, info, instrument, warn};

use crate::metrics::{
    track_application_submitted, track_document_upload, track_screening_reservation,
};
use crate::modules::admissions::model::{
    ApplicantFilterParams, ApplicationDetails, ApplicationDocuments, ApplicationForm,
    ApplicationSubmission, CreateScreeningSlotDto, DocumentKind, DocumentLink,
    ScreeningReservation, ScreeningSlot, SubmitApplicationResponse, UploadedDocument,
    first_available, format_application_number,
};
use crate::modules::students::model::{Student, StudentFilterParams, StudentStatus, StudentSummary};
use crate::modules::students::service::{STUDENT_COLUMNS, StudentService};
use crate::utils::references::{Referenced, ensure_exists};
use crate::utils::uploads::storage_error;
use crate::validator::validate_dto;

const SLOT_COLUMNS: &str = "id, date, start_time, max_capacity, bookings, created_at";

const MAX_APPLICATION_NUMBER_ATTEMPTS: usize = 5;

pub struct AdmissionService;

impl AdmissionService {
    // ------------------------------------------------------------------
    // Screening slots
    // ------------------------------------------------------------------

    /// Newest first.
    #[instrument(skip(db))]
    pub async fn list_screening_slots(db: &PgPool) -> Result<Vec<ScreeningSlot>, AppError> {
        let slots = sqlx::query_as::<_, ScreeningSlot>(&format!(
            "SELECT {} FROM screening_slots ORDER BY date DESC, start_time DESC",
            SLOT_COLUMNS
        ))
        .fetch_all(db)
        .await?;
        Ok(slots)
    }

    #[instrument(skip(db))]
    pub async fn add_screening_slot(
        db: &PgPool,
        dto: CreateScreeningSlotDto,
        default_capacity: i32,
    ) -> Result<ScreeningSlot, AppError> {
        let slot = sqlx::query_as::<_, ScreeningSlot>(&format!(
            "INSERT INTO screening_slots (date, start_time, max_capacity)
             VALUES ($1, $2, $3)
             RETURNING {}",
            SLOT_COLUMNS
        ))
        .bind(dto.date)
        .bind(dto.start_time)
        .bind(dto.max_capacity.unwrap_or(default_capacity))
        .fetch_one(db)
        .await?;

        info!(slot_id = %slot.id, date = %slot.date, start_time = %slot.start_time, "Screening slot added");
        Ok(slot)
    }

    #[instrument(skip(db))]
    pub async fn next_available_slot(db: &PgPool) -> Result<Option<ScreeningSlot>, AppError> {
        let now = Local::now().naive_local();
        let candidates = sqlx::query_as::<_, ScreeningSlot>(&format!(
            "SELECT {} FROM screening_slots
             WHERE date >= $1 AND bookings < max_capacity
             ORDER BY date, start_time",
            SLOT_COLUMNS
        ))
        .bind(now.date())
        .fetch_all(db)
        .await?;

        Ok(first_available(&candidates, now).cloned())
    }

    /// Books one seat for `user_id` in the earliest upcoming slot with room
    /// left. An account holds at most one seat; asking again returns it.
    #[instrument(skip(db))]
    pub async fn reserve_screening_slot(
        db: &PgPool,
        user_id: UserId,
        location: &str,
    ) -> Result<ScreeningReservation, AppError> {
        let mut tx = db.begin().await?;
        let (reservation, _) =
            Self::reserve_in(&mut tx, user_id, Local::now().naive_local(), location).await?;
        tx.commit().await?;
        Ok(reservation)
    }

    /// Returns the seat `user_id` already holds, or takes a new one and
    /// reports `true`. Only the chosen slot row is locked, until the
    /// surrounding transaction ends.
    pub(crate) async fn reserve_in(
        conn: &mut PgConnection,
        user_id: UserId,
        now: NaiveDateTime,
        location: &str,
    ) -> Result<(ScreeningReservation, bool), AppError> {
        if let Some(slot) = Self::held_slot(&mut *conn, user_id).await? {
            if slot.is_upcoming(now) {
                debug!(slot_id = %slot.id, "Screening seat already held");
                return Ok((ScreeningReservation::for_slot(&slot, location), false));
            }
            sqlx::query("DELETE FROM screening_reservations WHERE user_id = $1")
                .bind(user_id)
                .execute(&mut *conn)
                .await?;
            debug!(slot_id = %slot.id, "Held screening seat has passed, reserving another");
        }

        let slot = sqlx::query_as::<_, ScreeningSlot>(&format!(
            r#"SELECT {} FROM screening_slots
               WHERE (date > $1 OR (date = $1 AND start_time COLLATE "C" >= $2))
                 AND bookings < max_capacity
               ORDER BY date, start_time
               LIMIT 1
               FOR UPDATE"#,
            SLOT_COLUMNS
        ))
        .bind(now.date())
        .bind(ClockTime::from_naive_time(now.time()))
        .fetch_optional(&mut *conn)
        .await?;

        let Some(slot) = slot else {
            warn!("Screening reservation failed: every upcoming slot is full");
            track_screening_reservation(false);
            return Err(AppError::conflict(anyhow::anyhow!(
                "No available screening slots"
            )));
        };

        let claimed = sqlx::query(
            "INSERT INTO screening_reservations (user_id, slot_id) VALUES ($1, $2)
             ON CONFLICT (user_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(slot.id)
        .execute(&mut *conn)
        .await?;
        if claimed.rows_affected() == 0 {
            return Err(AppError::conflict(anyhow::anyhow!(
                "A screening seat is already being reserved for this account"
            )));
        }

        let slot = sqlx::query_as::<_, ScreeningSlot>(&format!(
            "UPDATE screening_slots SET bookings = bookings + 1 WHERE id = $1 RETURNING {}",
            SLOT_COLUMNS
        ))
        .bind(slot.id)
        .fetch_one(&mut *conn)
        .await?;

        debug!(slot_id = %slot.id, bookings = slot.bookings, "Screening seat reserved");
        track_screening_reservation(true);

        Ok((ScreeningReservation::for_slot(&slot, location), true))
    }

    async fn held_slot(
        conn: &mut PgConnection,
        user_id: UserId,
    ) -> Result<Option<ScreeningSlot>, AppError> {
        let slot = sqlx::query_as::<_, ScreeningSlot>(
            "SELECT s.id, s.date, s.start_time, s.max_capacity, s.bookings, s.created_at
             FROM screening_reservations r
             JOIN screening_slots s ON s.id = r.slot_id
             WHERE r.user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(conn)
        .await?;
        Ok(slot)
    }

    /// Gives back a seat taken by a submission that did not go through.
    async fn release_seat(db: &PgPool, user_id: UserId, slot_id: ScreeningSlotId) {
        let released = async {
            let mut tx = db.begin().await?;
            let held = sqlx::query(
                "DELETE FROM screening_reservations WHERE user_id = $1 AND slot_id = $2",
            )
            .bind(user_id)
            .bind(slot_id)
            .execute(&mut *tx)
            .await?;
            if held.rows_affected() > 0 {
                sqlx::query(
                    "UPDATE screening_slots SET bookings = GREATEST(bookings - 1, 0) WHERE id = $1",
                )
                .bind(slot_id)
                .execute(&mut *tx)
                .await?;
            }
            tx.commit().await?;
            Ok::<(), sqlx::Error>(())
        }
        .await;

        match released {
            Ok(()) => debug!(%slot_id, "Screening seat released"),
            Err(e) => error!(%slot_id, error = %e, "Failed to release screening seat"),
        }
    }

    async fn get_slot(
        conn: &mut PgConnection,
        id: ScreeningSlotId,
    ) -> Result<Option<ScreeningSlot>, AppError> {
        let slot = sqlx::query_as::<_, ScreeningSlot>(&format!(
            "SELECT {} FROM screening_slots WHERE id = $1",
            SLOT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(conn)
        .await?;
        Ok(slot)
    }

    // ------------------------------------------------------------------
    // Submission
    // ------------------------------------------------------------------

    /// Creates the applicant's student record.
    ///
    /// The applicant's seat is taken (or the one already held is reused)
    /// and committed first, then the documents are stored concurrently and
    /// the row inserted. A submission may only name the slot its account
    /// holds. Optional documents that fail to store are recorded as absent;
    /// a missing or failed application PDF aborts everything, releasing a
    /// seat taken by this submission.
    #[instrument(
        skip(db, storage, config, submission),
        fields(user_id = %user_id, documents = submission.documents.len())
    )]
    pub async fn submit_application(
        db: &PgPool,
        storage: &dyn FileStorage,
        config: &AdmissionsConfig,
        user_id: UserId,
        submission: ApplicationSubmission,
    ) -> Result<SubmitApplicationResponse, AppError> {
        validate_dto(&submission.form)?;
        if submission.document(DocumentKind::GeneratedPdf).is_none() {
            return Err(AppError::unprocessable(anyhow::anyhow!(
                "The generated application PDF is required"
            )));
        }

        let mut tx = db.begin().await?;

        let already_applied = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM students WHERE user_id = $1)",
        )
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;
        if already_applied {
            return Err(AppError::conflict(anyhow::anyhow!(
                "An application has already been submitted for this account"
            )));
        }

        if let Some(department_id) = submission.form.department_id {
            ensure_exists(&mut tx, Referenced::Department, department_id).await?;
        }
        if let Some(program_id) = submission.form.program_id {
            ensure_exists(&mut tx, Referenced::Program, program_id).await?;
        }

        let now = Local::now().naive_local();
        let (screening, newly_reserved) = match submission.screening_slot_id {
            Some(slot_id) => {
                let held = Self::held_slot(&mut tx, user_id).await?;
                match held {
                    Some(slot) if slot.id == slot_id && slot.is_upcoming(now) => (
                        ScreeningReservation::for_slot(&slot, &config.screening_location),
                        false,
                    ),
                    _ => {
                        return Err(AppError::unprocessable(anyhow::anyhow!(
                            "Screening slot {} is not reserved for this account",
                            slot_id
                        )));
                    }
                }
            }
            None => {
                Self::reserve_in(&mut tx, user_id, now, &config.screening_location).await?
            }
        };
        tx.commit().await?;

        let submitted =
            Self::store_and_insert(db, storage, config, user_id, &submission, &screening).await;
        let (student_id, application_number, missing_documents) = match submitted {
            Ok(row) => row,
            Err(e) => {
                if newly_reserved {
                    Self::release_seat(db, user_id, screening.slot_id).await;
                }
                return Err(e);
            }
        };

        info!(
            %student_id,
            %application_number,
            slot_id = %screening.slot_id,
            missing = missing_documents.len(),
            "Application submitted"
        );
        track_application_submitted(!newly_reserved);

        Ok(SubmitApplicationResponse {
            student_id,
            application_number,
            status: StudentStatus::Progress,
            screening,
            missing_documents,
        })
    }

    async fn store_and_insert(
        db: &PgPool,
        storage: &dyn FileStorage,
        config: &AdmissionsConfig,
        user_id: UserId,
        submission: &ApplicationSubmission,
        screening: &ScreeningReservation,
    ) -> Result<(StudentId, String, Vec<DocumentKind>), AppError> {
        let documents = Self::store_documents(storage, user_id, &submission.documents).await?;
        let image_url = documents
            .get(DocumentKind::ProfileImage)
            .and_then(|key| storage.get_url(key).ok());

        let inserted = async {
            let mut tx = db.begin().await?;
            let row = Self::insert_student(
                &mut tx,
                &config.application_number_prefix,
                user_id,
                &submission.form,
                &documents,
                image_url.as_deref(),
                screening.slot_id,
            )
            .await?;
            tx.commit().await?;
            Ok::<_, AppError>(row)
        }
        .await;

        match inserted {
            Ok((student_id, application_number)) => {
                Ok((student_id, application_number, documents.missing()))
            }
            Err(e) => {
                Self::discard_documents(storage, &documents).await;
                Err(e)
            }
        }
    }

    async fn store_documents(
        storage: &dyn FileStorage,
        user_id: UserId,
        uploads: &[UploadedDocument],
    ) -> Result<ApplicationDocuments, AppError> {
        let millis = Utc::now().timestamp_millis();
        let results = join_all(uploads.iter().map(|doc| async move {
            let key = format!(
                "applications/{}/{}-{}.{}",
                user_id,
                doc.kind,
                millis,
                doc.extension()
            );
            let stored = match storage.ensure_allowed(&doc.content_type, doc.bytes.len()) {
                Ok(()) => storage.save(&key, &doc.bytes).await,
                Err(e) => Err(e),
            };
            (doc.kind, stored)
        }))
        .await;

        let mut documents = ApplicationDocuments::default();
        let mut mandatory_failure = None;
        for (kind, stored) in results {
            track_document_upload(kind.as_str(), stored.is_ok());
            match stored {
                Ok(storage_id) => documents.set(kind, Some(storage_id)),
                Err(e) if kind.is_mandatory() => {
                    error!(document = %kind, error = %e, "Failed to store application PDF");
                    mandatory_failure = Some(e);
                }
                Err(e) => {
                    warn!(document = %kind, error = %e, "Failed to store document, recording it as absent");
                }
            }
        }

        if let Some(e) = mandatory_failure {
            Self::discard_documents(storage, &documents).await;
            return Err(storage_error(e));
        }

        Ok(documents)
    }

    async fn discard_documents(storage: &dyn FileStorage, documents: &ApplicationDocuments) {
        for (kind, key) in documents.iter() {
            if let Err(e) = storage.delete(key).await {
                warn!(document = %kind, key, error = %e, "Failed to remove stored document");
            }
        }
    }

    /// Inserts the student row, drawing a fresh application number whenever
    /// the previous one is already taken.
    async fn insert_student(
        conn: &mut PgConnection,
        prefix: &str,
        user_id: UserId,
        form: &ApplicationForm,
        documents: &ApplicationDocuments,
        image_url: Option<&str>,
        slot_id: ScreeningSlotId,
    ) -> Result<(StudentId, String), AppError> {
        for attempt in 1..=MAX_APPLICATION_NUMBER_ATTEMPTS {
            let application_number = generate_application_number(prefix);

            let inserted = sqlx::query_scalar::<_, StudentId>(
                r#"INSERT INTO students
                       (user_id, first_name, middle_name, last_name, email, phone, date_of_birth,
                        sex, address, city, state, zip_code, lga, religion, image_url,
                        department_id, program_id, program_name, concentration, start_term,
                        academic, health, documents, recommendation_letters, agree_terms,
                        application_number, screening_slot_id)
                   VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15,
                           $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27)
                   ON CONFLICT (application_number) DO NOTHING
                   RETURNING id"#,
            )
            .bind(user_id)
            .bind(form.first_name.trim())
            .bind(form.middle_name.trim())
            .bind(form.last_name.trim())
            .bind(form.email.trim())
            .bind(form.phone.trim())
            .bind(form.date_of_birth)
            .bind(form.sex)
            .bind(&form.address)
            .bind(&form.city)
            .bind(&form.state)
            .bind(&form.zip_code)
            .bind(&form.lga)
            .bind(&form.religion)
            .bind(image_url)
            .bind(form.department_id)
            .bind(form.program_id)
            .bind(form.program_name.trim())
            .bind(&form.concentration)
            .bind(&form.start_term)
            .bind(Json(&form.academic))
            .bind(Json(&form.health))
            .bind(Json(documents))
            .bind(form.recommendation_letters)
            .bind(form.agree_terms)
            .bind(&application_number)
            .bind(slot_id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| {
                AppError::from_unique_violation(
                    e,
                    "An application has already been submitted for this account",
                )
            })?;

            if let Some(student_id) = inserted {
                return Ok((student_id, application_number));
            }
            warn!(attempt, %application_number, "Application number already taken, regenerating");
        }

        Err(AppError::internal_error(
            "Could not allocate a unique application number",
        ))
    }

    /// Swaps the stored application PDF. The previous object is removed
    /// once the new one is recorded.
    #[instrument(skip(db, storage, pdf), fields(size = pdf.bytes.len()))]
    pub async fn replace_generated_pdf(
        db: &PgPool,
        storage: &dyn FileStorage,
        student_id: StudentId,
        pdf: UploadedDocument,
    ) -> Result<Student, AppError> {
        let mut tx = db.begin().await?;
        let student = StudentService::lock_student(&mut tx, student_id).await?;

        storage
            .ensure_allowed(&pdf.content_type, pdf.bytes.len())
            .map_err(storage_error)?;
        let key = format!(
            "applications/{}/{}-{}.{}",
            student.user_id,
            DocumentKind::GeneratedPdf,
            Utc::now().timestamp_millis(),
            pdf.extension()
        );
        let storage_id = storage.save(&key, &pdf.bytes).await.map_err(storage_error)?;

        let mut documents = student.documents.0.clone();
        let previous = documents
            .get(DocumentKind::GeneratedPdf)
            .map(str::to_string);
        documents.set(DocumentKind::GeneratedPdf, Some(storage_id.clone()));

        let updated = sqlx::query_as::<_, Student>(&format!(
            "UPDATE students SET documents = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            STUDENT_COLUMNS
        ))
        .bind(student_id)
        .bind(Json(&documents))
        .fetch_one(&mut *tx)
        .await;

        let updated = match updated {
            Ok(student) => student,
            Err(e) => {
                if let Err(cleanup) = storage.delete(&storage_id).await {
                    warn!(key = %storage_id, error = %cleanup, "Failed to remove unrecorded application PDF");
                }
                return Err(e.into());
            }
        };
        tx.commit().await?;

        if let Some(previous) = previous {
            if let Err(e) = storage.delete(&previous).await {
                warn!(key = %previous, error = %e, "Failed to remove replaced application PDF");
            }
        }

        info!(%student_id, "Application PDF replaced");
        Ok(updated)
    }

    // ------------------------------------------------------------------
    // Applicant queries
    // ------------------------------------------------------------------

    #[instrument(skip(db))]
    pub async fn list_applicants(
        db: &PgPool,
        filters: ApplicantFilterParams,
    ) -> Result<Paginated<StudentSummary>, AppError> {
        StudentService::list_students(
            db,
            StudentFilterParams {
                status: filters.status,
                pagination: filters.pagination,
                ..Default::default()
            },
        )
        .await
    }

    #[instrument(skip(db, storage))]
    pub async fn get_application(
        db: &PgPool,
        storage: &dyn FileStorage,
        location: &str,
        student_id: StudentId,
    ) -> Result<ApplicationDetails, AppError> {
        let student = StudentService::get_student(db, student_id).await?;
        Self::details(db, storage, location, student).await
    }

    #[instrument(skip(db, storage))]
    pub async fn get_my_application(
        db: &PgPool,
        storage: &dyn FileStorage,
        location: &str,
        user_id: UserId,
    ) -> Result<ApplicationDetails, AppError> {
        let student = sqlx::query_as::<_, Student>(&format!(
            "SELECT {} FROM students WHERE user_id = $1",
            STUDENT_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("No application found")))?;

        Self::details(db, storage, location, student).await
    }

    async fn details(
        db: &PgPool,
        storage: &dyn FileStorage,
        location: &str,
        student: Student,
    ) -> Result<ApplicationDetails, AppError> {
        let screening = match student.screening_slot_id {
            Some(slot_id) => Self::get_slot(&mut *db.acquire().await?, slot_id)
                .await?
                .map(|slot| ScreeningReservation::for_slot(&slot, location)),
            None => None,
        };

        let documents = student
            .documents
            .iter()
            .filter_map(|(kind, key)| match storage.get_url(key) {
                Ok(url) => Some(DocumentLink {
                    kind,
                    storage_id: key.to_string(),
                    url,
                }),
                Err(e) => {
                    warn!(document = %kind, key, error = %e, "Could not resolve document URL");
                    None
                }
            })
            .collect();

        Ok(ApplicationDetails {
            student,
            screening,
            documents,
        })
    }
}

fn generate_application_number(prefix: &str) -> String {
    let suffix = rand::thread_rng().gen_range(0..10_000u16);
    format_application_number(prefix, Utc::now().timestamp_millis(), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use registrar_core::StorageError;
    use crate::state::local_storage;
    use axum::http::StatusCode;
    use chrono::{Duration, NaiveDate};
    use registrar_config::StorageConfig;
    use registrar_core::file_storage::StorageFuture;
    use registrar_models::Sex;
    use std::sync::Arc;

    fn temp_storage() -> Arc<dyn FileStorage> {
        local_storage(&StorageConfig {
            upload_dir: std::env::temp_dir().join(format!("registrar-test-{}", uuid::Uuid::new_v4())),
            ..Default::default()
        })
    }

    /// Refuses every write.
    struct BrokenStorage;

    impl FileStorage for BrokenStorage {
        fn save<'a>(&'a self, _key: &'a str, _content: &'a [u8]) -> StorageFuture<'a, String> {
            Box::pin(async { Err(StorageError::Io(std::io::Error::other("disk full"))) })
        }

        fn delete<'a>(&'a self, _key: &'a str) -> StorageFuture<'a, ()> {
            Box::pin(async { Ok(()) })
        }

        fn get_url(&self, key: &str) -> Result<String, StorageError> {
            Ok(format!("http://localhost/files/{}", key))
        }

        fn ensure_allowed(&self, _content_type: &str, _len: usize) -> Result<(), StorageError> {
            Ok(())
        }
    }

    fn form(email: &str) -> ApplicationForm {
        ApplicationForm {
            first_name: "Zainab".to_string(),
            middle_name: String::new(),
            last_name: "Musa".to_string(),
            email: email.to_string(),
            phone: "08030000000".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(2005, 1, 20).unwrap(),
            sex: Sex::Female,
            address: String::new(),
            city: String::new(),
            state: String::new(),
            zip_code: String::new(),
            lga: String::new(),
            religion: String::new(),
            department_id: None,
            program_id: None,
            program_name: "Nursing".to_string(),
            concentration: String::new(),
            start_term: String::new(),
            academic: Default::default(),
            health: Default::default(),
            recommendation_letters: 0,
            agree_terms: true,
        }
    }

    fn pdf(kind: DocumentKind) -> UploadedDocument {
        UploadedDocument {
            kind,
            file_name: format!("{}.pdf", kind),
            content_type: "application/pdf".to_string(),
            bytes: b"%PDF-1.4".to_vec(),
        }
    }

    fn submission(email: &str, documents: Vec<UploadedDocument>) -> ApplicationSubmission {
        ApplicationSubmission {
            form: form(email),
            screening_slot_id: None,
            documents,
        }
    }

    async fn user(pool: &PgPool, sub: &str) -> UserId {
        sqlx::query_scalar("INSERT INTO users (external_identity_ref, email) VALUES ($1, $1) RETURNING id")
            .bind(sub)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    async fn slot(pool: &PgPool, days_ahead: i64, start: &str, capacity: i32, bookings: i32) -> ScreeningSlotId {
        sqlx::query_scalar(
            "INSERT INTO screening_slots (date, start_time, max_capacity, bookings)
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(Local::now().date_naive() + Duration::days(days_ahead))
        .bind(start)
        .bind(capacity)
        .bind(bookings)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    async fn bookings(pool: &PgPool, id: ScreeningSlotId) -> i32 {
        sqlx::query_scalar("SELECT bookings FROM screening_slots WHERE id = $1")
            .bind(id)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_reservation_skips_full_slot_and_fills_partial_one(pool: PgPool) {
        let full = slot(&pool, 1, "09:00", 2, 2).await;
        let partial = slot(&pool, 1, "11:00", 50, 10).await;
        slot(&pool, 2, "09:00", 50, 0).await;
        let applicant = user(&pool, "reserver_1").await;

        let reservation = AdmissionService::reserve_screening_slot(&pool, applicant, "Main hall")
            .await
            .unwrap();
        assert_eq!(reservation.slot_id, partial);
        assert_eq!(reservation.location, "Main hall");
        assert_eq!(bookings(&pool, partial).await, 11);
        assert_eq!(bookings(&pool, full).await, 2);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_reserving_twice_keeps_the_held_seat(pool: PgPool) {
        let first = slot(&pool, 1, "09:00", 50, 0).await;
        let applicant = user(&pool, "reserver_2").await;

        let held = AdmissionService::reserve_screening_slot(&pool, applicant, "Main hall")
            .await
            .unwrap();
        let again = AdmissionService::reserve_screening_slot(&pool, applicant, "Main hall")
            .await
            .unwrap();
        assert_eq!(held.slot_id, first);
        assert_eq!(again.slot_id, first);
        assert_eq!(bookings(&pool, first).await, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_passed_seat_is_swapped_for_an_upcoming_one(pool: PgPool) {
        let past = slot(&pool, -1, "09:00", 50, 1).await;
        let upcoming = slot(&pool, 1, "09:00", 50, 0).await;
        let applicant = user(&pool, "reserver_4").await;
        sqlx::query("INSERT INTO screening_reservations (user_id, slot_id) VALUES ($1, $2)")
            .bind(applicant)
            .bind(past)
            .execute(&pool)
            .await
            .unwrap();

        let reservation = AdmissionService::reserve_screening_slot(&pool, applicant, "Main hall")
            .await
            .unwrap();
        assert_eq!(reservation.slot_id, upcoming);
        assert_eq!(bookings(&pool, upcoming).await, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_reservation_conflicts_when_everything_is_full(pool: PgPool) {
        slot(&pool, 1, "09:00", 1, 1).await;
        slot(&pool, -1, "09:00", 50, 0).await;
        let applicant = user(&pool, "reserver_3").await;

        let err = AdmissionService::reserve_screening_slot(&pool, applicant, "Main hall")
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert!(AdmissionService::next_available_slot(&pool).await.unwrap().is_none());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_submit_application_reserves_and_stores(pool: PgPool) {
        let seat = slot(&pool, 3, "10:00", 50, 0).await;
        let applicant = user(&pool, "applicant_1").await;
        let storage = temp_storage();
        let config = AdmissionsConfig::default();

        let response = AdmissionService::submit_application(
            &pool,
            storage.as_ref(),
            &config,
            applicant,
            submission(
                "zainab@example.com",
                vec![pdf(DocumentKind::GeneratedPdf), pdf(DocumentKind::Transcript)],
            ),
        )
        .await
        .unwrap();

        assert_eq!(response.status, StudentStatus::Progress);
        assert_eq!(response.screening.slot_id, seat);
        assert!(response.application_number.starts_with("JICO-"));
        assert_eq!(response.missing_documents.len(), DocumentKind::ALL.len() - 2);
        assert_eq!(bookings(&pool, seat).await, 1);

        let details = AdmissionService::get_my_application(
            &pool,
            storage.as_ref(),
            &config.screening_location,
            applicant,
        )
        .await
        .unwrap();
        assert_eq!(details.student.id, response.student_id);
        assert_eq!(details.documents.len(), 2);

        let again = AdmissionService::submit_application(
            &pool,
            storage.as_ref(),
            &config,
            applicant,
            submission("zainab@example.com", vec![pdf(DocumentKind::GeneratedPdf)]),
        )
        .await
        .unwrap_err();
        assert_eq!(again.status, StatusCode::CONFLICT);
        assert_eq!(bookings(&pool, seat).await, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_missing_pdf_is_rejected_before_reserving(pool: PgPool) {
        let seat = slot(&pool, 1, "10:00", 50, 0).await;
        let applicant = user(&pool, "applicant_2").await;

        let err = AdmissionService::submit_application(
            &pool,
            temp_storage().as_ref(),
            &AdmissionsConfig::default(),
            applicant,
            submission("a@example.com", vec![pdf(DocumentKind::Transcript)]),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(bookings(&pool, seat).await, 0);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_failed_pdf_upload_rolls_back_reservation(pool: PgPool) {
        let seat = slot(&pool, 1, "10:00", 50, 0).await;
        let applicant = user(&pool, "applicant_3").await;

        let err = AdmissionService::submit_application(
            &pool,
            &BrokenStorage,
            &AdmissionsConfig::default(),
            applicant,
            submission("b@example.com", vec![pdf(DocumentKind::GeneratedPdf)]),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(bookings(&pool, seat).await, 0);
        assert_eq!(students(&pool).await, 0);

        let held: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM screening_reservations")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(held, 0);
    }

    async fn students(pool: &PgPool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM students")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_submit_naming_a_slot_not_held_is_rejected(pool: PgPool) {
        let full = slot(&pool, 1, "09:00", 1, 1).await;
        let open = slot(&pool, 2, "09:00", 50, 0).await;
        let applicant = user(&pool, "applicant_4").await;

        for named in [full, open] {
            let mut named_submission =
                submission("c@example.com", vec![pdf(DocumentKind::GeneratedPdf)]);
            named_submission.screening_slot_id = Some(named);

            let err = AdmissionService::submit_application(
                &pool,
                temp_storage().as_ref(),
                &AdmissionsConfig::default(),
                applicant,
                named_submission,
            )
            .await
            .unwrap_err();
            assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        }

        assert_eq!(bookings(&pool, full).await, 1);
        assert_eq!(bookings(&pool, open).await, 0);
        assert_eq!(students(&pool).await, 0);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_submit_uses_the_seat_reserved_beforehand(pool: PgPool) {
        let seat = slot(&pool, 1, "09:00", 1, 0).await;
        let applicant = user(&pool, "applicant_5").await;
        let config = AdmissionsConfig::default();

        let held = AdmissionService::reserve_screening_slot(&pool, applicant, &config.screening_location)
            .await
            .unwrap();
        assert_eq!(held.slot_id, seat);

        let mut named_submission =
            submission("d@example.com", vec![pdf(DocumentKind::GeneratedPdf)]);
        named_submission.screening_slot_id = Some(seat);
        let response = AdmissionService::submit_application(
            &pool,
            temp_storage().as_ref(),
            &config,
            applicant,
            named_submission,
        )
        .await
        .unwrap();

        assert_eq!(response.screening.slot_id, seat);
        assert_eq!(bookings(&pool, seat).await, 1);
        assert_eq!(students(&pool).await, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_failed_upload_keeps_a_seat_reserved_beforehand(pool: PgPool) {
        let seat = slot(&pool, 1, "09:00", 5, 0).await;
        let applicant = user(&pool, "applicant_6").await;

        AdmissionService::reserve_screening_slot(&pool, applicant, "Main hall")
            .await
            .unwrap();
        let err = AdmissionService::submit_application(
            &pool,
            &BrokenStorage,
            &AdmissionsConfig::default(),
            applicant,
            submission("e@example.com", vec![pdf(DocumentKind::GeneratedPdf)]),
        )
        .await
        .unwrap_err();

        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(bookings(&pool, seat).await, 1);
        assert_eq!(students(&pool).await, 0);
    }

    /// Stores normally but cannot remove anything.
    struct UndeletableStorage(Arc<dyn FileStorage>);

    impl FileStorage for UndeletableStorage {
        fn save<'a>(&'a self, key: &'a str, content: &'a [u8]) -> StorageFuture<'a, String> {
            self.0.save(key, content)
        }

        fn delete<'a>(&'a self, _key: &'a str) -> StorageFuture<'a, ()> {
            Box::pin(async { Err(StorageError::Io(std::io::Error::other("read-only volume"))) })
        }

        fn get_url(&self, key: &str) -> Result<String, StorageError> {
            self.0.get_url(key)
        }

        fn ensure_allowed(&self, content_type: &str, len: usize) -> Result<(), StorageError> {
            self.0.ensure_allowed(content_type, len)
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_replace_pdf_records_new_key_even_if_cleanup_fails(pool: PgPool) {
        slot(&pool, 1, "09:00", 50, 0).await;
        let applicant = user(&pool, "applicant_7").await;
        let storage = UndeletableStorage(temp_storage());

        let submitted = AdmissionService::submit_application(
            &pool,
            &storage,
            &AdmissionsConfig::default(),
            applicant,
            submission("f@example.com", vec![pdf(DocumentKind::GeneratedPdf)]),
        )
        .await
        .unwrap();
        let student = StudentService::get_student(&pool, submitted.student_id).await.unwrap();
        let original = student
            .documents
            .get(DocumentKind::GeneratedPdf)
            .map(str::to_string)
            .unwrap();

        // Keys carry a millisecond timestamp.
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let replaced = AdmissionService::replace_generated_pdf(
            &pool,
            &storage,
            submitted.student_id,
            pdf(DocumentKind::GeneratedPdf),
        )
        .await
        .unwrap();

        let current = replaced.documents.get(DocumentKind::GeneratedPdf).unwrap();
        assert_ne!(current, original);
        assert!(current.starts_with(&format!("applications/{}/generated_pdf-", applicant)));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_add_slot_uses_default_capacity(pool: PgPool) {
        let slot = AdmissionService::add_screening_slot(
            &pool,
            CreateScreeningSlotDto {
                date: Local::now().date_naive() + Duration::days(7),
                start_time: "09:30".parse().unwrap(),
                max_capacity: None,
            },
            50,
        )
        .await
        .unwrap();
        assert_eq!(slot.max_capacity, 50);
        assert_eq!(slot.bookings, 0);

        let next = AdmissionService::next_available_slot(&pool).await.unwrap().unwrap();
        assert_eq!(next.id, slot.id);
    }
}
