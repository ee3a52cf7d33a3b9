use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::constants::generate_meeting_id;
use crate::meeting::{Meeting, RecordingEntry};
use crate::queries::meetings;

/// Persistence layer for meeting records
///
/// All mutations go through the pool; in-memory session state mirrors these
/// records but never replaces them.
#[derive(Clone)]
pub struct MeetingStore {
    pool: SqlitePool,
}

impl MeetingStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create and persist a new meeting
    ///
    /// Uses `custom_id` when given, otherwise generates a random short id.
    /// Fails when the id is already taken.
    pub async fn create_meeting(
        &self,
        title: &str,
        custom_id: Option<&str>,
        host_id: &str,
        host_name: &str,
        app_id: &str,
    ) -> Result<Meeting, Box<dyn std::error::Error + Send + Sync>> {
        let id = match custom_id {
            Some(custom) if !custom.trim().is_empty() => custom.trim().to_string(),
            _ => generate_meeting_id(),
        };

        let sql = meetings::exists(&id);
        if sqlx::query(&sql).fetch_optional(&self.pool).await?.is_some() {
            return Err(format!("Meeting '{}' already exists", id).into());
        }

        let meeting = Meeting::new(&id, title, host_id, host_name, app_id);
        let participants_json = serde_json::to_string(&meeting.participants)?;
        let sql = meetings::insert(
            &meeting.id,
            &meeting.title,
            &meeting.host_id,
            &meeting.host_name,
            meeting.created_at_ms,
            &meeting.status,
            &participants_json,
            &meeting.app_id,
            &meeting.channel_name,
        );
        sqlx::query(&sql).execute(&self.pool).await?;

        Ok(meeting)
    }

    /// Fetch a meeting by id
    pub async fn get_meeting(
        &self,
        id: &str,
    ) -> Result<Option<Meeting>, Box<dyn std::error::Error + Send + Sync>> {
        let sql = meetings::select_by_id(id);
        let row = sqlx::query(&sql).fetch_optional(&self.pool).await?;
        row.map(row_to_meeting).transpose()
    }

    /// Fetch a meeting that must exist
    pub async fn get_meeting_required(
        &self,
        id: &str,
    ) -> Result<Meeting, Box<dyn std::error::Error + Send + Sync>> {
        self.get_meeting(id)
            .await?
            .ok_or_else(|| format!("Meeting '{}' not found", id).into())
    }

    /// Add a participant to a meeting's persisted participant set
    ///
    /// Idempotent, and safe under concurrent joins: the append happens in a
    /// single UPDATE rather than a read-then-replace, so two users joining
    /// at once both land in the set.
    pub async fn add_participant(
        &self,
        id: &str,
        user_id: &str,
    ) -> Result<Meeting, Box<dyn std::error::Error + Send + Sync>> {
        let sql = meetings::append_participant(id, user_id);
        sqlx::query(&sql).execute(&self.pool).await?;
        self.get_meeting_required(id).await
    }

    /// Mark a recording as active and store the vendor job identifiers
    pub async fn set_recording_started(
        &self,
        id: &str,
        resource_id: &str,
        sid: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let sql = meetings::update_recording_started(id, resource_id, sid);
        let result = sqlx::query(&sql).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(format!("Meeting '{}' not found", id).into());
        }
        Ok(())
    }

    /// Clear the active-recording state and append a finished recording entry
    /// The append and the state reset happen in one UPDATE
    pub async fn set_recording_stopped(
        &self,
        id: &str,
        entry: RecordingEntry,
    ) -> Result<Meeting, Box<dyn std::error::Error + Send + Sync>> {
        let entry_json = serde_json::to_string(&entry)?;
        let sql = meetings::update_recording_stopped(id, &entry_json);
        let result = sqlx::query(&sql).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(format!("Meeting '{}' not found", id).into());
        }
        self.get_meeting_required(id).await
    }

    /// List meetings hosted by a user, newest first
    pub async fn list_meetings_for_host(
        &self,
        host_id: &str,
    ) -> Result<Vec<Meeting>, Box<dyn std::error::Error + Send + Sync>> {
        let sql = meetings::select_by_host(host_id);
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.into_iter().map(row_to_meeting).collect()
    }
}

fn row_to_meeting(row: SqliteRow) -> Result<Meeting, Box<dyn std::error::Error + Send + Sync>> {
    let participants_json: String = row.try_get("participants")?;
    let participants: Vec<String> = serde_json::from_str(&participants_json)?;
    let recordings_json: String = row.try_get("recordings")?;
    let recordings: Vec<RecordingEntry> = serde_json::from_str(&recordings_json)?;

    Ok(Meeting {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        host_id: row.try_get("host_id")?,
        host_name: row.try_get("host_name")?,
        created_at_ms: row.try_get("created_at_ms")?,
        status: row.try_get("status")?,
        participants,
        app_id: row.try_get("app_id")?,
        channel_name: row.try_get("channel_name")?,
        is_recording: row.try_get("is_recording")?,
        recording_resource_id: row.try_get("recording_resource_id")?,
        recording_sid: row.try_get("recording_sid")?,
        recordings,
    })
}
