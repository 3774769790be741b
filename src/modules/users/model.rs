pub use registrar_models::users::{
    ApplicationStage, NavigationItem, NavigationResponse, RoleAndStatus, UpdateUserRoleDto, User,
    UserFilterParams,
};
