pub mod announcements;
pub mod audio_files;
pub mod database;
pub mod error;
mod row_helpers;
pub mod schema;

pub use announcements::AnnouncementRepo;
pub use audio_files::AudioFileRepo;
pub use database::Database;
pub use error::StoreError;
