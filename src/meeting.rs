use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A completed recording attached to a meeting record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingEntry {
    /// Public playback URL for the recording
    pub url: String,
    /// When the recording was stopped
    pub timestamp: DateTime<Utc>,
    /// Reported length in seconds (a fixed placeholder, see constants)
    pub duration_secs: u32,
}

/// A meeting room record
///
/// `channel_name` equals the meeting id at creation; the two are kept as
/// separate fields because the transport vendor addresses channels by name
/// while the rest of the system addresses meetings by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meeting {
    pub id: String,
    pub title: String,
    pub host_id: String,
    pub host_name: String,
    pub created_at_ms: i64,
    pub status: String,
    /// Unique set of participant user ids; order is irrelevant
    pub participants: Vec<String>,
    /// Vendor application id for the transport SDK
    pub app_id: String,
    pub channel_name: String,
    pub is_recording: bool,
    pub recording_resource_id: Option<String>,
    pub recording_sid: Option<String>,
    pub recordings: Vec<RecordingEntry>,
}

impl Meeting {
    /// Build a new active meeting hosted by `host_id`
    /// A blank title falls back to "Quick Meeting"
    pub fn new(id: &str, title: &str, host_id: &str, host_name: &str, app_id: &str) -> Self {
        let title = if title.trim().is_empty() {
            "Quick Meeting".to_string()
        } else {
            title.to_string()
        };

        Self {
            id: id.to_string(),
            title,
            host_id: host_id.to_string(),
            host_name: host_name.to_string(),
            created_at_ms: Utc::now().timestamp_millis(),
            status: "active".to_string(),
            participants: vec![host_id.to_string()],
            app_id: app_id.to_string(),
            channel_name: id.to_string(),
            is_recording: false,
            recording_resource_id: None,
            recording_sid: None,
            recordings: Vec::new(),
        }
    }

    pub fn has_participant(&self, user_id: &str) -> bool {
        self.participants.iter().any(|p| p == user_id)
    }
}
