use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::CoreError;
use crate::ids::{AnnouncementId, AudioFileId};
use crate::records::{Announcement, AudioFile};

/// State-change and relay events exchanged with station clients.
///
/// On the wire every event is a JSON object tagged by `type`. Anything that
/// parses as an object with an unrecognised `type` lands in [`Event::Unknown`]
/// so newer clients can talk to older stations without being disconnected.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    SpotifyPlay {
        track_uri: String,
    },

    AudioUploaded {
        file: AudioFile,
    },

    PlayAudioFile {
        file_id: AudioFileId,
        file_path: String,
    },

    Announcement {
        announcement: Announcement,
    },

    TtsAnnouncement {
        text: String,
        id: AnnouncementId,
    },

    /// Range is enforced by whoever builds the event, not here.
    VolumeChange {
        volume: u8,
    },

    StopAudio,

    /// Inbound chunk of a live voice recording.
    VoiceData {
        data: Value,
    },

    /// Outbound relay of a [`Event::VoiceData`] chunk.
    VoiceAnnouncement {
        data: Value,
    },

    AudioStream {
        #[serde(default)]
        data: Value,
    },

    #[serde(other)]
    Unknown,
}

impl Event {
    /// Parse one text frame received from a client.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Serialize to the canonical wire form.
    ///
    /// `Unknown` has no payload to send and is refused.
    pub fn to_wire(&self) -> Result<String, CoreError> {
        if matches!(self, Self::Unknown) {
            return Err(CoreError::UnknownType);
        }
        Ok(serde_json::to_string(self)?)
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            Self::SpotifyPlay { .. } => "spotify_play",
            Self::AudioUploaded { .. } => "audio_uploaded",
            Self::PlayAudioFile { .. } => "play_audio_file",
            Self::Announcement { .. } => "announcement",
            Self::TtsAnnouncement { .. } => "tts_announcement",
            Self::VolumeChange { .. } => "volume_change",
            Self::StopAudio => "stop_audio",
            Self::VoiceData { .. } => "voice_data",
            Self::VoiceAnnouncement { .. } => "voice_announcement",
            Self::AudioStream { .. } => "audio_stream",
            Self::Unknown => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::AnnouncementKind;
    use serde_json::json;

    #[test]
    fn stop_audio_has_only_type() {
        let wire = Event::StopAudio.to_wire().unwrap();
        assert_eq!(wire, r#"{"type":"stop_audio"}"#);
    }

    #[test]
    fn volume_change_wire_shape() {
        let wire = Event::VolumeChange { volume: 40 }.to_wire().unwrap();
        let value: Value = serde_json::from_str(&wire).unwrap();
        assert_eq!(value, json!({"type": "volume_change", "volume": 40}));
    }

    #[test]
    fn play_audio_file_wire_shape() {
        let event = Event::PlayAudioFile {
            file_id: AudioFileId::from_raw("audio_1"),
            file_path: "/uploads/audio_1.mp3".into(),
        };
        let value: Value = serde_json::from_str(&event.to_wire().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({"type": "play_audio_file", "file_id": "audio_1", "file_path": "/uploads/audio_1.mp3"})
        );
    }

    #[test]
    fn announcement_nests_record() {
        let ann = Announcement::new("lunch is served", AnnouncementKind::VoiceRecording);
        let event = Event::Announcement { announcement: ann.clone() };
        let value: Value = serde_json::from_str(&event.to_wire().unwrap()).unwrap();
        assert_eq!(value["type"], "announcement");
        assert_eq!(value["announcement"]["id"], ann.id.as_str());
        assert_eq!(value["announcement"]["type"], "voice-recording");
    }

    #[test]
    fn tts_announcement_wire_shape() {
        let event = Event::TtsAnnouncement {
            text: "hello".into(),
            id: AnnouncementId::from_raw("ann_9"),
        };
        let value: Value = serde_json::from_str(&event.to_wire().unwrap()).unwrap();
        assert_eq!(value, json!({"type": "tts_announcement", "text": "hello", "id": "ann_9"}));
    }

    #[test]
    fn parse_voice_data_keeps_opaque_payload() {
        let event = Event::parse(r#"{"type":"voice_data","data":{"chunk":[1,2,3]}}"#).unwrap();
        assert_eq!(event, Event::VoiceData { data: json!({"chunk": [1, 2, 3]}) });
    }

    #[test]
    fn parse_voice_data_without_data_is_malformed() {
        let err = Event::parse(r#"{"type":"voice_data"}"#).unwrap_err();
        assert!(matches!(err, CoreError::Malformed(_)));
    }

    #[test]
    fn parse_audio_stream_tolerates_missing_data() {
        let event = Event::parse(r#"{"type":"audio_stream","seq":4}"#).unwrap();
        assert_eq!(event, Event::AudioStream { data: Value::Null });
    }

    #[test]
    fn parse_unknown_type_is_not_an_error() {
        let event = Event::parse(r#"{"type":"hologram","data":1}"#).unwrap();
        assert_eq!(event, Event::Unknown);
        assert_eq!(event.event_type(), "unknown");
    }

    #[test]
    fn parse_rejects_non_objects_and_garbage() {
        assert!(Event::parse("not json").is_err());
        assert!(Event::parse("[1,2,3]").is_err());
        assert!(Event::parse(r#"{"data":"no type"}"#).is_err());
    }

    #[test]
    fn unknown_refuses_to_serialize() {
        assert!(matches!(Event::Unknown.to_wire(), Err(CoreError::UnknownType)));
    }

    #[test]
    fn event_type_matches_wire_tag() {
        let events = vec![
            Event::SpotifyPlay { track_uri: "spotify:track:1".into() },
            Event::VolumeChange { volume: 10 },
            Event::StopAudio,
            Event::VoiceAnnouncement { data: json!("x") },
            Event::AudioStream { data: json!("y") },
        ];
        for event in &events {
            let value: Value = serde_json::from_str(&event.to_wire().unwrap()).unwrap();
            assert_eq!(value["type"], event.event_type());
        }
    }
}
