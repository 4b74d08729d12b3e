use rusqlite::OptionalExtension;
use tracing::instrument;

use soundpost_core::ids::AudioFileId;
use soundpost_core::AudioFile;

use crate::database::Database;
use crate::error::StoreError;
use crate::row_helpers::{format_timestamp, parse_timestamp};

/// Default page size for listings.
pub const DEFAULT_LIST_LIMIT: usize = 100;

type RawAudioRow = (String, String, String, String);

pub struct AudioFileRepo {
    db: Database,
}

impl AudioFileRepo {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    #[instrument(skip(self, file), fields(file_id = %file.id))]
    pub fn insert(&self, file: &AudioFile) -> Result<(), StoreError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO audio_files (id, filename, file_path, uploaded_at) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![
                    file.id.as_str(),
                    file.filename,
                    file.file_path,
                    format_timestamp(&file.uploaded_at),
                ],
            )?;
            Ok(())
        })
    }

    #[instrument(skip(self), fields(file_id = %id))]
    pub fn get(&self, id: &AudioFileId) -> Result<Option<AudioFile>, StoreError> {
        self.db.with_conn(|conn| {
            let raw: Option<RawAudioRow> = conn
                .query_row(
                    "SELECT id, filename, file_path, uploaded_at FROM audio_files WHERE id = ?1",
                    [id.as_str()],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
                )
                .optional()?;
            raw.map(into_audio_file).transpose()
        })
    }

    /// Newest uploads first.
    #[instrument(skip(self))]
    pub fn list(&self, limit: usize) -> Result<Vec<AudioFile>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, filename, file_path, uploaded_at FROM audio_files
                 ORDER BY uploaded_at DESC, rowid DESC LIMIT ?1",
            )?;
            let raw = stmt
                .query_map([limit as i64], |row| {
                    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
                })?
                .collect::<Result<Vec<RawAudioRow>, _>>()?;
            raw.into_iter().map(into_audio_file).collect()
        })
    }
}

fn into_audio_file((id, filename, file_path, uploaded_at): RawAudioRow) -> Result<AudioFile, StoreError> {
    Ok(AudioFile {
        id: AudioFileId::from_raw(id),
        filename,
        file_path,
        uploaded_at: parse_timestamp(&uploaded_at, "audio_files", "uploaded_at")?,
    })
}
