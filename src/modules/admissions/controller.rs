use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
};
use registrar_core::{AppError, Paginated};
use registrar_models::files::{DEFAULT_FILE_NAME, DEFAULT_FILE_TYPE};
use registrar_models::{ScreeningSlotId, StudentId};
use tracing::{debug, instrument};

use crate::middleware::auth::{
    AuthUser, RequireApplicantsView, RequireScreeningManage, RequireScreeningView,
};
use crate::middleware::role::RequireStudent;
use crate::modules::admissions::model::{
    ApplicantFilterParams, ApplicationDetails, ApplicationForm, ApplicationSubmission,
    CreateScreeningSlotDto, DocumentKind, ScreeningReservation, ScreeningSlot,
    SubmitApplicationResponse, UploadedDocument,
};
use crate::modules::admissions::service::AdmissionService;
use crate::modules::students::model::{Student, StudentSummary};
use crate::modules::students::service::StudentService;
use crate::state::AppState;
use crate::utils::uploads::multipart_error;
use crate::validator::ValidatedJson;

/// Reads one file field into memory. Empty parts count as absent.
async fn read_document(
    field: axum::extract::multipart::Field<'_>,
    kind: DocumentKind,
) -> Result<Option<UploadedDocument>, AppError> {
    let file_name = field.file_name().unwrap_or(DEFAULT_FILE_NAME).to_string();
    let content_type = field
        .content_type()
        .unwrap_or(DEFAULT_FILE_TYPE)
        .to_string();
    let bytes = field.bytes().await.map_err(multipart_error)?;
    if bytes.is_empty() {
        return Ok(None);
    }

    Ok(Some(UploadedDocument {
        kind,
        file_name,
        content_type,
        bytes: bytes.to_vec(),
    }))
}

/// Splits a submission into the `application` JSON part, the optional
/// `screening_slot_id` part and one file part per [`DocumentKind`].
async fn read_submission(mut multipart: Multipart) -> Result<ApplicationSubmission, AppError> {
    let mut form: Option<ApplicationForm> = None;
    let mut screening_slot_id = None;
    let mut documents: Vec<UploadedDocument> = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "application" => {
                let text = field.text().await.map_err(multipart_error)?;
                let parsed = serde_json::from_str(&text).map_err(|e| {
                    AppError::bad_request(anyhow::anyhow!("Invalid application data: {}", e))
                })?;
                form = Some(parsed);
            }
            "screening_slot_id" => {
                let text = field.text().await.map_err(multipart_error)?;
                let text = text.trim();
                if !text.is_empty() {
                    let id = text.parse::<ScreeningSlotId>().map_err(|_| {
                        AppError::bad_request(anyhow::anyhow!("Invalid screening slot id"))
                    })?;
                    screening_slot_id = Some(id);
                }
            }
            other => {
                let Ok(kind) = other.parse::<DocumentKind>() else {
                    debug!(field = other, "Ignoring unknown multipart field");
                    continue;
                };
                if let Some(document) = read_document(field, kind).await? {
                    documents.retain(|d| d.kind != kind);
                    documents.push(document);
                }
            }
        }
    }

    let form = form.ok_or_else(|| {
        AppError::bad_request(anyhow::anyhow!("Missing 'application' field"))
    })?;

    Ok(ApplicationSubmission {
        form,
        screening_slot_id,
        documents,
    })
}

/// Submit an application.
///
/// Multipart body: an `application` part holding the form as JSON, an
/// optional `screening_slot_id`, and file parts named after the document
/// kinds (`generated_pdf` is required).
#[utoipa::path(
    post,
    path = "/api/admissions/applications",
    request_body(content_type = "multipart/form-data", description = "Application form and documents"),
    responses(
        (status = 201, description = "Application submitted", body = SubmitApplicationResponse),
        (status = 400, description = "Malformed multipart body"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Only applicants may apply"),
        (status = 404, description = "Department or program not found"),
        (status = 409, description = "Already applied or no screening slot available"),
        (status = 422, description = "Validation error, missing application PDF or a screening slot this account does not hold")
    ),
    tag = "Admissions",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = %auth_user.user_id()))]
pub async fn submit_application(
    State(state): State<AppState>,
    RequireStudent(auth_user): RequireStudent,
    multipart: Multipart,
) -> Result<(StatusCode, Json<SubmitApplicationResponse>), AppError> {
    let submission = read_submission(multipart).await?;
    let response = AdmissionService::submit_application(
        &state.db,
        state.storage.as_ref(),
        &state.admissions_config,
        auth_user.user_id(),
        submission,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    get,
    path = "/api/admissions/applications/me",
    responses(
        (status = 200, description = "The caller's application", body = ApplicationDetails),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No application found")
    ),
    tag = "Admissions",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id()))]
pub async fn get_my_application(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<ApplicationDetails>, AppError> {
    let details = AdmissionService::get_my_application(
        &state.db,
        state.storage.as_ref(),
        &state.admissions_config.screening_location,
        auth_user.user_id(),
    )
    .await?;
    Ok(Json(details))
}

#[utoipa::path(
    get,
    path = "/api/admissions/applications",
    params(ApplicantFilterParams),
    responses(
        (status = 200, description = "Paginated applicants", body = Paginated<StudentSummary>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin only")
    ),
    tag = "Admissions",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth_user))]
pub async fn list_applicants(
    State(state): State<AppState>,
    RequireApplicantsView(_auth_user): RequireApplicantsView,
    Query(filters): Query<ApplicantFilterParams>,
) -> Result<Json<Paginated<StudentSummary>>, AppError> {
    let applicants = AdmissionService::list_applicants(&state.db, filters).await?;
    Ok(Json(applicants))
}

#[utoipa::path(
    get,
    path = "/api/admissions/applications/{id}",
    params(("id" = Uuid, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Application with document links", body = ApplicationDetails),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "Student not found")
    ),
    tag = "Admissions",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_application(
    State(state): State<AppState>,
    RequireApplicantsView(_auth_user): RequireApplicantsView,
    Path(id): Path<StudentId>,
) -> Result<Json<ApplicationDetails>, AppError> {
    let details = AdmissionService::get_application(
        &state.db,
        state.storage.as_ref(),
        &state.admissions_config.screening_location,
        id,
    )
    .await?;
    Ok(Json(details))
}

/// Replace the stored application PDF. Allowed for admins and for the
/// applicant the record belongs to.
#[utoipa::path(
    put,
    path = "/api/admissions/applications/{id}/pdf",
    params(("id" = Uuid, Path, description = "Student ID")),
    request_body(content_type = "multipart/form-data", description = "A `generated_pdf` file part"),
    responses(
        (status = 200, description = "PDF replaced", body = Student),
        (status = 400, description = "Missing file part"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the applicant"),
        (status = 404, description = "Student not found"),
        (status = 422, description = "File rejected")
    ),
    tag = "Admissions",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = %auth_user.user_id()))]
pub async fn replace_generated_pdf(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<StudentId>,
    mut multipart: Multipart,
) -> Result<Json<Student>, AppError> {
    let student = StudentService::get_student(&state.db, id).await?;
    if !auth_user.is_admin() && student.user_id != auth_user.user_id() {
        return Err(AppError::forbidden(
            "Only the applicant or an admin can replace this document",
        ));
    }

    let mut pdf = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() == Some(DocumentKind::GeneratedPdf.as_str()) {
            pdf = read_document(field, DocumentKind::GeneratedPdf).await?;
        }
    }
    let pdf = pdf.ok_or_else(|| {
        AppError::bad_request(anyhow::anyhow!("Missing 'generated_pdf' file"))
    })?;

    let student =
        AdmissionService::replace_generated_pdf(&state.db, state.storage.as_ref(), id, pdf)
            .await?;
    Ok(Json(student))
}

#[utoipa::path(
    get,
    path = "/api/screening-slots",
    responses(
        (status = 200, description = "Screening slots, newest first", body = Vec<ScreeningSlot>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin only")
    ),
    tag = "Screening",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth_user))]
pub async fn list_screening_slots(
    State(state): State<AppState>,
    RequireScreeningView(_auth_user): RequireScreeningView,
) -> Result<Json<Vec<ScreeningSlot>>, AppError> {
    let slots = AdmissionService::list_screening_slots(&state.db).await?;
    Ok(Json(slots))
}

#[utoipa::path(
    post,
    path = "/api/screening-slots",
    request_body = CreateScreeningSlotDto,
    responses(
        (status = 201, description = "Slot created", body = ScreeningSlot),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 422, description = "Validation error")
    ),
    tag = "Screening",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth_user))]
pub async fn add_screening_slot(
    State(state): State<AppState>,
    RequireScreeningManage(_auth_user): RequireScreeningManage,
    ValidatedJson(dto): ValidatedJson<CreateScreeningSlotDto>,
) -> Result<(StatusCode, Json<ScreeningSlot>), AppError> {
    let slot = AdmissionService::add_screening_slot(
        &state.db,
        dto,
        state.admissions_config.default_slot_capacity,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(slot)))
}

#[utoipa::path(
    get,
    path = "/api/screening-slots/next",
    responses(
        (status = 200, description = "Earliest upcoming slot with room, or null", body = Option<ScreeningSlot>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Screening",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_next_available_slot(
    State(state): State<AppState>,
    _auth_user: AuthUser,
) -> Result<Json<Option<ScreeningSlot>>, AppError> {
    let slot = AdmissionService::next_available_slot(&state.db).await?;
    Ok(Json(slot))
}

#[utoipa::path(
    post,
    path = "/api/screening-slots/reserve",
    responses(
        (status = 201, description = "Seat reserved, or the seat this account already holds", body = ScreeningReservation),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "No available screening slots")
    ),
    tag = "Screening",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id()))]
pub async fn reserve_screening_slot(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<(StatusCode, Json<ScreeningReservation>), AppError> {
    let reservation = AdmissionService::reserve_screening_slot(
        &state.db,
        auth_user.user_id(),
        &state.admissions_config.screening_location,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(reservation)))
}
