pub use registrar_models::admissions::{
    ApplicantFilterParams, ApplicationDetails, ApplicationDocuments, ApplicationForm,
    CreateScreeningSlotDto, DocumentKind, DocumentLink, ScreeningReservation, ScreeningSlot,
    SubmitApplicationResponse, first_available, format_application_number,
};
use registrar_models::ScreeningSlotId;

/// A file part received with an application.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub kind: DocumentKind,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadedDocument {
    /// Storage key extension derived from the declared content type.
    pub fn extension(&self) -> &'static str {
        match self.content_type.as_str() {
            "application/pdf" => "pdf",
            "image/png" => "png",
            "image/jpeg" => "jpg",
            "image/webp" => "webp",
            _ => "bin",
        }
    }
}

/// A parsed multipart submission.
#[derive(Debug, Clone)]
pub struct ApplicationSubmission {
    pub form: ApplicationForm,
    /// Seat already reserved through the reservation endpoint, if any.
    pub screening_slot_id: Option<ScreeningSlotId>,
    pub documents: Vec<UploadedDocument>,
}

impl ApplicationSubmission {
    pub fn document(&self, kind: DocumentKind) -> Option<&UploadedDocument> {
        self.documents.iter().find(|doc| doc.kind == kind)
    }
}
