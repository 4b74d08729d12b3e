//! HTTP handlers for `/api`.
//!
//! Each handler performs its own action (validation, persistence, file
//! storage) and then asks the broadcast core to emit the matching event.

use std::path::Path as FsPath;

use axum::extract::{Multipart, Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use soundpost_core::ids::AudioFileId;
use soundpost_core::{Announcement, AnnouncementKind, AudioFile, Event};
use soundpost_store::audio_files::DEFAULT_LIST_LIMIT;
use soundpost_store::{AnnouncementRepo, AudioFileRepo};
use tracing::info;

use crate::config::SpotifyConfig;
use crate::error::ApiError;
use crate::server::AppState;

/// Accepted upload extensions, compared case-insensitively.
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "m4a", "ogg"];

const MAX_VOLUME: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct SpotifyAuthRequest {
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PlayTrackRequest {
    pub track_uri: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateAnnouncementRequest {
    pub text: String,
    #[serde(rename = "type")]
    pub kind: AnnouncementKind,
}

#[derive(Debug, Deserialize)]
pub struct TextToSpeechRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct VolumeRequest {
    pub volume: i64,
}

// ── Spotify placeholders ────────────────────────────────────────────────

pub async fn spotify_config(State(state): State<AppState>) -> Json<SpotifyConfig> {
    Json(state.config.spotify.clone())
}

pub async fn spotify_auth(Json(req): Json<SpotifyAuthRequest>) -> Json<Value> {
    info!(has_code = req.code.is_some(), "spotify auth requested");
    Json(json!({
        "status": "placeholder",
        "message": "Spotify auth will be implemented with real credentials",
    }))
}

pub async fn spotify_player() -> Json<Value> {
    Json(json!({ "status": "placeholder", "player": null }))
}

pub async fn spotify_play(
    State(state): State<AppState>,
    Json(req): Json<PlayTrackRequest>,
) -> Json<Value> {
    state
        .core
        .emit(Event::SpotifyPlay {
            track_uri: req.track_uri.clone(),
        })
        .await;
    Json(json!({ "status": "playing", "track": req.track_uri }))
}

// ── Audio files ─────────────────────────────────────────────────────────

/// Extension of `filename` (with the dot, original case) if it is a
/// supported audio format.
pub fn audio_extension(filename: &str) -> Option<String> {
    let ext = FsPath::new(filename).extension()?.to_str()?;
    AUDIO_EXTENSIONS
        .iter()
        .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        .then(|| format!(".{ext}"))
}

pub async fn upload_audio(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AudioFile>, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let ext = audio_extension(&filename).ok_or_else(|| {
            ApiError::BadRequest(
                "Invalid file format. Please upload MP3, WAV, M4A, or OGG files.".into(),
            )
        })?;

        let bytes = field.bytes().await?;
        let id = AudioFileId::new();
        tokio::fs::create_dir_all(&state.config.uploads_dir).await?;
        let stored = state.config.uploads_dir.join(format!("{id}{ext}"));
        tokio::fs::write(&stored, &bytes).await?;

        let file = AudioFile::new(id, filename, stored.to_string_lossy().into_owned());
        AudioFileRepo::new(state.db.clone()).insert(&file)?;
        info!(file_id = %file.id, size = bytes.len(), "audio file uploaded");

        state
            .core
            .emit(Event::AudioUploaded { file: file.clone() })
            .await;
        return Ok(Json(file));
    }

    Err(ApiError::BadRequest("No file provided".into()))
}

pub async fn list_audio_files(State(state): State<AppState>) -> Result<Json<Vec<AudioFile>>, ApiError> {
    let files = AudioFileRepo::new(state.db.clone()).list(DEFAULT_LIST_LIMIT)?;
    Ok(Json(files))
}

pub async fn play_audio_file(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = AudioFileId::from_raw(file_id);
    let file = AudioFileRepo::new(state.db.clone())
        .get(&id)?
        .ok_or_else(|| ApiError::NotFound("File not found".into()))?;

    state
        .core
        .emit(Event::PlayAudioFile {
            file_id: file.id.clone(),
            file_path: file.file_path,
        })
        .await;
    Ok(Json(json!({ "status": "playing", "file_id": file.id })))
}

pub async fn set_volume(
    State(state): State<AppState>,
    Json(req): Json<VolumeRequest>,
) -> Result<Json<Value>, ApiError> {
    let volume = u8::try_from(req.volume)
        .ok()
        .filter(|v| i64::from(*v) <= MAX_VOLUME)
        .ok_or_else(|| ApiError::BadRequest("Volume must be between 0 and 100".into()))?;

    state.core.emit(Event::VolumeChange { volume }).await;
    Ok(Json(json!({ "status": "volume_set", "volume": volume })))
}

pub async fn stop_audio(State(state): State<AppState>) -> Json<Value> {
    state.core.emit(Event::StopAudio).await;
    Json(json!({ "status": "stopped" }))
}

// ── Announcements ───────────────────────────────────────────────────────

pub async fn create_announcement(
    State(state): State<AppState>,
    Json(req): Json<CreateAnnouncementRequest>,
) -> Result<Json<Announcement>, ApiError> {
    let announcement = Announcement::new(req.text, req.kind);
    AnnouncementRepo::new(state.db.clone()).insert(&announcement)?;

    state
        .core
        .emit(Event::Announcement {
            announcement: announcement.clone(),
        })
        .await;
    Ok(Json(announcement))
}

pub async fn list_announcements(
    State(state): State<AppState>,
) -> Result<Json<Vec<Announcement>>, ApiError> {
    let items = AnnouncementRepo::new(state.db.clone()).list(DEFAULT_LIST_LIMIT)?;
    Ok(Json(items))
}

pub async fn text_to_speech(
    State(state): State<AppState>,
    Json(req): Json<TextToSpeechRequest>,
) -> Result<Json<Announcement>, ApiError> {
    let announcement = Announcement::new(req.text, AnnouncementKind::TextToSpeech);
    AnnouncementRepo::new(state.db.clone()).insert(&announcement)?;

    state
        .core
        .emit(Event::TtsAnnouncement {
            text: announcement.text.clone(),
            id: announcement.id.clone(),
        })
        .await;
    Ok(Json(announcement))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_supported_extensions_any_case() {
        assert_eq!(audio_extension("bell.mp3").as_deref(), Some(".mp3"));
        assert_eq!(audio_extension("Chime.WAV").as_deref(), Some(".WAV"));
        assert_eq!(audio_extension("a.b.m4a").as_deref(), Some(".m4a"));
        assert_eq!(audio_extension("x.Ogg").as_deref(), Some(".Ogg"));
    }

    #[test]
    fn rejects_other_names() {
        assert_eq!(audio_extension("notes.txt"), None);
        assert_eq!(audio_extension("mp3"), None);
        assert_eq!(audio_extension(""), None);
        assert_eq!(audio_extension("song.mp3.exe"), None);
    }
}
