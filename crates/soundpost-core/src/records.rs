//! Metadata records shared between the store, the HTTP layer and event payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{AnnouncementId, AudioFileId};

/// An uploaded audio file as stored on disk.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AudioFile {
    pub id: AudioFileId,
    /// Name the client uploaded the file under.
    pub filename: String,
    /// Location of the stored bytes on the station host.
    pub file_path: String,
    pub uploaded_at: DateTime<Utc>,
}

impl AudioFile {
    pub fn new(id: AudioFileId, filename: impl Into<String>, file_path: impl Into<String>) -> Self {
        Self {
            id,
            filename: filename.into(),
            file_path: file_path.into(),
            uploaded_at: Utc::now(),
        }
    }
}

/// Announcement `type`. The two kinds the station plays are named; any other
/// label a client sends is kept as given.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AnnouncementKind {
    TextToSpeech,
    VoiceRecording,
    Other(String),
}

impl AnnouncementKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::TextToSpeech => "text-to-speech",
            Self::VoiceRecording => "voice-recording",
            Self::Other(kind) => kind,
        }
    }
}

impl From<String> for AnnouncementKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "text-to-speech" => Self::TextToSpeech,
            "voice-recording" => Self::VoiceRecording,
            _ => Self::Other(s),
        }
    }
}

impl From<&str> for AnnouncementKind {
    fn from(s: &str) -> Self {
        Self::from(s.to_owned())
    }
}

impl From<AnnouncementKind> for String {
    fn from(kind: AnnouncementKind) -> Self {
        match kind {
            AnnouncementKind::Other(kind) => kind,
            named => named.as_str().to_owned(),
        }
    }
}

impl std::fmt::Display for AnnouncementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Announcement {
    pub id: AnnouncementId,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: AnnouncementKind,
    pub created_at: DateTime<Utc>,
}

impl Announcement {
    pub fn new(text: impl Into<String>, kind: AnnouncementKind) -> Self {
        Self {
            id: AnnouncementId::new(),
            text: text.into(),
            kind,
            created_at: Utc::now(),
        }
    }
}
