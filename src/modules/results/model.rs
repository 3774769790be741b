use serde::Deserialize;
use utoipa::IntoParams;

pub use registrar_models::results::{
    Assessment, Cgpa, CourseResult, Grade, RecordResultDto, ResultFilterParams, StudentResult,
    compute_cgpa,
};

/// Narrows a result query or CGPA to one semester; cumulative when absent.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SemesterParams {
    #[serde(default, deserialize_with = "registrar_core::serde::empty_string_as_none")]
    pub semester: Option<String>,
}
