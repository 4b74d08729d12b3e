use rusqlite::OptionalExtension;
use tracing::instrument;

use soundpost_core::ids::AnnouncementId;
use soundpost_core::{Announcement, AnnouncementKind};

use crate::database::Database;
use crate::error::StoreError;
use crate::row_helpers::{format_timestamp, parse_timestamp};

type RawAnnouncementRow = (String, String, String, String);

pub struct AnnouncementRepo {
    db: Database,
}

impl AnnouncementRepo {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    #[instrument(skip(self, announcement), fields(announcement_id = %announcement.id, kind = %announcement.kind))]
    pub fn insert(&self, announcement: &Announcement) -> Result<(), StoreError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO announcements (id, text, kind, created_at) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![
                    announcement.id.as_str(),
                    announcement.text,
                    announcement.kind.as_str(),
                    format_timestamp(&announcement.created_at),
                ],
            )?;
            Ok(())
        })
    }

    #[instrument(skip(self), fields(announcement_id = %id))]
    pub fn get(&self, id: &AnnouncementId) -> Result<Option<Announcement>, StoreError> {
        self.db.with_conn(|conn| {
            let raw: Option<RawAnnouncementRow> = conn
                .query_row(
                    "SELECT id, text, kind, created_at FROM announcements WHERE id = ?1",
                    [id.as_str()],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
                )
                .optional()?;
            raw.map(into_announcement).transpose()
        })
    }

    /// Most recent first.
    #[instrument(skip(self))]
    pub fn list(&self, limit: usize) -> Result<Vec<Announcement>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, text, kind, created_at FROM announcements
                 ORDER BY created_at DESC, rowid DESC LIMIT ?1",
            )?;
            let raw = stmt
                .query_map([limit as i64], |row| {
                    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
                })?
                .collect::<Result<Vec<RawAnnouncementRow>, _>>()?;
            raw.into_iter().map(into_announcement).collect()
        })
    }
}

fn into_announcement((id, text, kind, created_at): RawAnnouncementRow) -> Result<Announcement, StoreError> {
    Ok(Announcement {
        id: AnnouncementId::from_raw(id),
        text,
        kind: AnnouncementKind::from(kind),
        created_at: parse_timestamp(&created_at, "announcements", "created_at")?,
    })
}
