pub use registrar_models::levels::{DEFAULT_LEVELS, InitializeLevelsResponse, Level};
