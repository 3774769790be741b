pub use registrar_models::programs::{
    CreateProgramDto, Program, ProgramCountDeltas, ProgramCounts, ProgramFilterParams,
    ProgramPromotion, PromoteProgramDto, UpdateProgramDto,
};
