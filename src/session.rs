use dashmap::DashMap;
use log::{error, info, warn};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::chat::{ChatLog, ChatMessage};
use crate::meeting::Meeting;
use crate::recording::{RecordingCoordinator, RecordingHandle};
use crate::roster::{Roster, RosterEvent};
use crate::rtc::{RtcTransport, TokenProvider};
use crate::store::MeetingStore;

/// Lifecycle states of a meeting session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Loading,
    JoinPrompt,
    Joined,
    Leaving,
}

/// Per-meeting session controller
///
/// Owns the full lifecycle of one user's presence in one meeting:
/// `Idle -> Loading -> JoinPrompt -> Joined -> Leaving -> Idle`. All vendor
/// side effects (token fetch, transport join/leave, capture publish,
/// recording start/stop) run inside state-transition handlers; everything
/// else observes the session through read-only accessors. Operations called
/// in the wrong state fail instead of interleaving.
pub struct MeetingSession {
    meeting_id: String,
    user_id: String,
    user_name: String,
    state: SessionState,
    meeting: Option<Meeting>,
    roster: Roster,
    chat: ChatLog,
    audio_enabled: bool,
    video_enabled: bool,
    store: MeetingStore,
    token_provider: Arc<dyn TokenProvider>,
    transport: Arc<dyn RtcTransport>,
    recording: Arc<RecordingCoordinator>,
    s3_bucket: String,
}

impl MeetingSession {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        meeting_id: &str,
        user_id: &str,
        user_name: &str,
        store: MeetingStore,
        token_provider: Arc<dyn TokenProvider>,
        transport: Arc<dyn RtcTransport>,
        recording: Arc<RecordingCoordinator>,
        s3_bucket: &str,
    ) -> Self {
        Self {
            meeting_id: meeting_id.to_string(),
            user_id: user_id.to_string(),
            user_name: user_name.to_string(),
            state: SessionState::Idle,
            meeting: None,
            roster: Roster::new(),
            chat: ChatLog::new(),
            audio_enabled: false,
            video_enabled: false,
            store,
            token_provider,
            transport,
            recording,
            s3_bucket: s3_bucket.to_string(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn meeting(&self) -> Option<&Meeting> {
        self.meeting.as_ref()
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn chat_messages(&self) -> &[ChatMessage] {
        self.chat.messages()
    }

    pub fn audio_enabled(&self) -> bool {
        self.audio_enabled
    }

    pub fn video_enabled(&self) -> bool {
        self.video_enabled
    }

    /// Whether the local user hosts the loaded meeting
    pub fn is_host(&self) -> bool {
        self.meeting
            .as_ref()
            .map(|m| m.host_id == self.user_id)
            .unwrap_or(false)
    }

    /// Load the meeting record and land on the join prompt
    /// An unknown meeting id drops the session back to Idle
    pub async fn prepare(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.state != SessionState::Idle {
            return Err(format!("prepare called in state {:?}", self.state).into());
        }
        self.state = SessionState::Loading;

        match self.store.get_meeting(&self.meeting_id).await {
            Ok(Some(meeting)) => {
                self.meeting = Some(meeting);
                self.state = SessionState::JoinPrompt;
                Ok(())
            }
            Ok(None) => {
                self.state = SessionState::Idle;
                Err(format!("Meeting '{}' not found", self.meeting_id).into())
            }
            Err(e) => {
                self.state = SessionState::Idle;
                Err(e)
            }
        }
    }

    /// Join the call: fetch a transport credential, open the channel,
    /// publish local capture, and record the caller as a participant
    ///
    /// On any failure the session rolls back to the join prompt and the
    /// error is surfaced once; there is no retry.
    pub async fn join_call(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.state != SessionState::JoinPrompt {
            return Err(format!("join_call called in state {:?}", self.state).into());
        }
        self.state = SessionState::Loading;

        match self.join_call_inner().await {
            Ok(()) => {
                self.state = SessionState::Joined;
                info!(
                    "User {} joined meeting {}",
                    self.user_id, self.meeting_id
                );
                Ok(())
            }
            Err(e) => {
                error!(
                    "Failed to join meeting {} as {}: {}",
                    self.meeting_id, self.user_id, e
                );
                self.state = SessionState::JoinPrompt;
                Err(e)
            }
        }
    }

    async fn join_call_inner(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let meeting = self
            .meeting
            .clone()
            .ok_or("No meeting loaded for this session")?;

        let token = self
            .token_provider
            .fetch_token(&meeting.channel_name)
            .await?;
        self.transport
            .join(&meeting.app_id, &meeting.channel_name, &token)
            .await?;

        let tracks = self.transport.publish_local_tracks().await?;
        self.audio_enabled = tracks.audio;
        self.video_enabled = tracks.video;

        let updated = self
            .store
            .add_participant(&self.meeting_id, &self.user_id)
            .await?;
        self.meeting = Some(updated);

        Ok(())
    }

    /// Leave the call: stop any active recording first (best-effort), then
    /// release local capture and close the transport session
    ///
    /// Teardown failures after the state flips to Leaving are logged and do
    /// not prevent the session from reaching Idle.
    pub async fn leave_call(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.state != SessionState::Joined {
            return Err(format!("leave_call called in state {:?}", self.state).into());
        }
        self.state = SessionState::Leaving;

        let recording_active = self
            .meeting
            .as_ref()
            .map(|m| m.is_recording)
            .unwrap_or(false);
        if recording_active {
            if let Err(e) = self
                .recording
                .stop(&self.store, &self.meeting_id, &self.user_id, &self.s3_bucket)
                .await
            {
                // The persisted record still claims an active recording here;
                // it stays divergent until a later stop succeeds.
                warn!(
                    "Failed to stop recording while leaving meeting {}: {}",
                    self.meeting_id, e
                );
            }
        }

        if let Err(e) = self.transport.close_local_tracks().await {
            warn!("Failed to close local tracks: {}", e);
        }
        if let Err(e) = self.transport.leave().await {
            warn!("Failed to leave transport channel: {}", e);
        }

        if let Ok(Some(meeting)) = self.store.get_meeting(&self.meeting_id).await {
            self.meeting = Some(meeting);
        }

        self.roster.clear();
        self.chat.clear();
        self.audio_enabled = false;
        self.video_enabled = false;
        self.state = SessionState::Idle;
        info!("User {} left meeting {}", self.user_id, self.meeting_id);

        Ok(())
    }

    /// Start recording the meeting's channel while joined
    /// Callers decide who may record; `is_host` exposes the check they need
    pub async fn start_recording(
        &mut self,
    ) -> Result<RecordingHandle, Box<dyn std::error::Error + Send + Sync>> {
        if self.state != SessionState::Joined {
            return Err(format!("start_recording called in state {:?}", self.state).into());
        }

        let handle = self
            .recording
            .start(&self.store, &self.meeting_id, &self.user_id)
            .await?;
        self.meeting = Some(self.store.get_meeting_required(&self.meeting_id).await?);
        Ok(handle)
    }

    /// Stop the active recording while joined
    pub async fn stop_recording(
        &mut self,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.state != SessionState::Joined {
            return Err(format!("stop_recording called in state {:?}", self.state).into());
        }

        self.recording
            .stop(&self.store, &self.meeting_id, &self.user_id, &self.s3_bucket)
            .await?;
        self.meeting = Some(self.store.get_meeting_required(&self.meeting_id).await?);
        Ok(())
    }

    /// Toggle the local audio track, returning the new enabled state
    pub async fn toggle_audio(&mut self) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        if self.state != SessionState::Joined {
            return Err(format!("toggle_audio called in state {:?}", self.state).into());
        }
        let enabled = !self.audio_enabled;
        self.transport.set_audio_enabled(enabled).await?;
        self.audio_enabled = enabled;
        Ok(enabled)
    }

    /// Toggle the local video track, returning the new enabled state
    pub async fn toggle_video(&mut self) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        if self.state != SessionState::Joined {
            return Err(format!("toggle_video called in state {:?}", self.state).into());
        }
        let enabled = !self.video_enabled;
        self.transport.set_video_enabled(enabled).await?;
        self.video_enabled = enabled;
        Ok(enabled)
    }

    /// Feed a transport roster event into the session's roster
    /// Events arriving outside a joined call are dropped
    pub fn handle_roster_event(&mut self, event: RosterEvent) {
        if self.state != SessionState::Joined {
            return;
        }
        self.roster.apply(event);
    }

    /// Append an in-call chat message from the local user
    /// Returns whether the message was accepted
    pub fn send_chat_message(&mut self, message: &str) -> bool {
        if self.state != SessionState::Joined {
            return false;
        }
        let user_id = self.user_id.clone();
        let user_name = self.user_name.clone();
        self.chat.push(&user_id, &user_name, message)
    }
}

/// Registry of live sessions, one per meeting id
///
/// Each session sits behind its own async mutex, so join/leave transitions
/// and roster events for the same meeting are serialized while different
/// meetings proceed independently.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<DashMap<String, Arc<Mutex<MeetingSession>>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session, replacing any previous one for the meeting
    pub fn insert(&self, session: MeetingSession) -> Arc<Mutex<MeetingSession>> {
        let meeting_id = session.meeting_id.clone();
        let handle = Arc::new(Mutex::new(session));
        self.inner.insert(meeting_id, handle.clone());
        handle
    }

    pub fn get(&self, meeting_id: &str) -> Option<Arc<Mutex<MeetingSession>>> {
        self.inner.get(meeting_id).map(|entry| entry.value().clone())
    }

    pub fn remove(&self, meeting_id: &str) -> Option<Arc<Mutex<MeetingSession>>> {
        self.inner.remove(meeting_id).map(|(_, handle)| handle)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
