use async_trait::async_trait;
use chrono::Utc;
use log::{info, warn};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::constants::PLACEHOLDER_RECORDING_DURATION_SECS;
use crate::credentials;
use crate::meeting::RecordingEntry;
use crate::store::MeetingStore;

/// Opaque identifiers for an active vendor recording job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingHandle {
    pub resource_id: String,
    pub sid: String,
}

/// Boundary over the vendor cloud-recording REST API
#[async_trait]
pub trait RecordingApi: Send + Sync {
    /// Reserve a recording resource for a channel, returning its resource id
    async fn acquire(
        &self,
        app_id: &str,
        channel: &str,
        uid: &str,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>>;

    /// Start recording on an acquired resource, returning the session id
    async fn start(
        &self,
        resource_id: &str,
        app_id: &str,
        channel: &str,
        uid: &str,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>>;

    /// Stop an active recording job
    async fn stop(
        &self,
        resource_id: &str,
        sid: &str,
        app_id: &str,
        channel: &str,
        uid: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// HTTP implementation speaking to the vendor's cloud recording endpoints
/// Authenticates with HTTP Basic credentials read from the environment at
/// request time
pub struct HttpRecordingApi {
    base_url: String,
    client: reqwest::Client,
}

impl HttpRecordingApi {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Deserialize)]
struct AcquireResponse {
    #[serde(rename = "resourceId")]
    resource_id: String,
}

#[derive(Deserialize)]
struct StartResponse {
    sid: String,
}

#[async_trait]
impl RecordingApi for HttpRecordingApi {
    async fn acquire(
        &self,
        app_id: &str,
        channel: &str,
        uid: &str,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let auth = credentials::recording_basic_auth()?;
        let url = format!("{}/v1/apps/{}/cloud_recording/acquire", self.base_url, app_id);
        let body = json!({
            "cname": channel,
            "uid": uid,
            "clientRequest": {},
        });

        let response = self
            .client
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, auth)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(format!("Recording acquire failed: {}", response.status()).into());
        }

        let body: AcquireResponse = response.json().await?;
        Ok(body.resource_id)
    }

    async fn start(
        &self,
        resource_id: &str,
        app_id: &str,
        channel: &str,
        uid: &str,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let auth = credentials::recording_basic_auth()?;
        let url = format!(
            "{}/v1/apps/{}/cloud_recording/resourceid/{}/mode/mix/start",
            self.base_url, app_id, resource_id
        );
        let body = json!({
            "cname": channel,
            "uid": uid,
            "clientRequest": {},
        });

        let response = self
            .client
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, auth)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(format!("Recording start failed: {}", response.status()).into());
        }

        let body: StartResponse = response.json().await?;
        Ok(body.sid)
    }

    async fn stop(
        &self,
        resource_id: &str,
        sid: &str,
        app_id: &str,
        channel: &str,
        uid: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let auth = credentials::recording_basic_auth()?;
        let url = format!(
            "{}/v1/apps/{}/cloud_recording/resourceid/{}/sid/{}/mode/mix/stop",
            self.base_url, app_id, resource_id, sid
        );
        let body = json!({
            "cname": channel,
            "uid": uid,
            "clientRequest": {},
        });

        let response = self
            .client
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, auth)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(format!("Recording stop failed: {}", response.status()).into());
        }

        Ok(())
    }
}

/// Public playback URL for a finished recording, following the vendor's
/// fixed S3 object layout
pub fn playback_url(bucket: &str, meeting_id: &str) -> String {
    format!(
        "https://{}.s3.amazonaws.com/recordings/{}/recording.m3u8",
        bucket, meeting_id
    )
}

/// Coordinates recording start/stop for meetings and keeps the persisted
/// meeting record in step with the vendor job state
pub struct RecordingCoordinator {
    api: Arc<dyn RecordingApi>,
}

impl RecordingCoordinator {
    pub fn new(api: Arc<dyn RecordingApi>) -> Self {
        Self { api }
    }

    /// Acquire a resource and start recording the meeting's channel
    ///
    /// There is no guard against starting while a recording is already
    /// active: every call acquires a fresh vendor resource and overwrites
    /// the stored identifiers. Callers must check `is_recording` first.
    pub async fn start(
        &self,
        store: &MeetingStore,
        meeting_id: &str,
        uid: &str,
    ) -> Result<RecordingHandle, Box<dyn std::error::Error + Send + Sync>> {
        let meeting = store.get_meeting_required(meeting_id).await?;

        let resource_id = self
            .api
            .acquire(&meeting.app_id, &meeting.channel_name, uid)
            .await?;
        let sid = self
            .api
            .start(&resource_id, &meeting.app_id, &meeting.channel_name, uid)
            .await?;

        store
            .set_recording_started(meeting_id, &resource_id, &sid)
            .await?;
        info!(
            "Recording started for meeting {} (resource {}, sid {})",
            meeting_id, resource_id, sid
        );

        Ok(RecordingHandle { resource_id, sid })
    }

    /// Stop the meeting's active recording and append a finished entry
    ///
    /// The reported duration is a fixed placeholder; the vendor endpoints we
    /// call do not return the real length. If the vendor stop call fails the
    /// persisted record keeps `is_recording = true` and the error is
    /// returned to the caller.
    pub async fn stop(
        &self,
        store: &MeetingStore,
        meeting_id: &str,
        uid: &str,
        s3_bucket: &str,
    ) -> Result<RecordingEntry, Box<dyn std::error::Error + Send + Sync>> {
        let meeting = store.get_meeting_required(meeting_id).await?;

        let (resource_id, sid) = match (&meeting.recording_resource_id, &meeting.recording_sid) {
            (Some(resource_id), Some(sid)) => (resource_id.clone(), sid.clone()),
            _ => {
                warn!("Stop requested but meeting {} has no active recording", meeting_id);
                return Err(format!("No active recording for meeting '{}'", meeting_id).into());
            }
        };

        self.api
            .stop(&resource_id, &sid, &meeting.app_id, &meeting.channel_name, uid)
            .await?;

        let entry = RecordingEntry {
            url: playback_url(s3_bucket, meeting_id),
            timestamp: Utc::now(),
            duration_secs: PLACEHOLDER_RECORDING_DURATION_SECS,
        };
        store.set_recording_stopped(meeting_id, entry.clone()).await?;
        info!("Recording stopped for meeting {} (sid {})", meeting_id, sid);

        Ok(entry)
    }
}
