pub use registrar_models::announcements::{
    Announcement, AnnouncementTarget, AnnouncementWithCreator, CreateAnnouncementDto,
    is_visible_to, visible_targets,
};
