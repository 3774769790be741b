pub use registrar_models::events::{CreateEventDto, Event, EventWithCreator};
