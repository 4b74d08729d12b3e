pub mod errors;
pub mod events;
pub mod ids;
pub mod records;

pub use errors::CoreError;
pub use events::Event;
pub use records::{Announcement, AnnouncementKind, AudioFile};
