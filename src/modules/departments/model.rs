pub use registrar_models::departments::{
    CreateDepartmentDto, Department, DepartmentPromotion, DepartmentWithCounts,
    UpdateDepartmentDto,
};
