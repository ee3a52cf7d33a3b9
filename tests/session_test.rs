//! # Meeting Session Tests
//!
//! These tests drive the session state machine end to end with stub transport
//! and token providers: prepare/join/leave transitions, wrong-state
//! rejections, rollback on failed joins, and the gating of roster events and
//! chat on the joined state.
//!
//! ## Running the Tests
//!
//! ```bash
//! cargo test --test session_test
//! ```

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use nextalk::recording::{RecordingApi, RecordingCoordinator};
use nextalk::roster::{MediaKind, RosterEvent, RosterEventKind};
use nextalk::rtc::{LocalTracks, RtcTransport, TokenProvider};
use nextalk::session::{MeetingSession, SessionRegistry, SessionState};
use nextalk::store::MeetingStore;

struct StubTokenProvider {
    fail: AtomicBool,
}

impl StubTokenProvider {
    fn new() -> Self {
        Self {
            fail: AtomicBool::new(false),
        }
    }

    fn fail_next(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl TokenProvider for StubTokenProvider {
    async fn fetch_token(
        &self,
        channel: &str,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        if self.fail.swap(false, Ordering::SeqCst) {
            return Err("token server unreachable".into());
        }
        Ok(format!("token-for-{}", channel))
    }
}

#[derive(Default)]
struct StubTransport {
    joins: AtomicUsize,
    leaves: AtomicUsize,
}

#[async_trait]
impl RtcTransport for StubTransport {
    async fn join(
        &self,
        _app_id: &str,
        _channel: &str,
        _token: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.joins.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn publish_local_tracks(
        &self,
    ) -> Result<LocalTracks, Box<dyn std::error::Error + Send + Sync>> {
        Ok(LocalTracks {
            audio: true,
            video: true,
        })
    }

    async fn set_audio_enabled(
        &self,
        _enabled: bool,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }

    async fn set_video_enabled(
        &self,
        _enabled: bool,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }

    async fn close_local_tracks(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }

    async fn leave(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.leaves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
struct StubRecordingApi {
    stops: AtomicUsize,
}

#[async_trait]
impl RecordingApi for StubRecordingApi {
    async fn acquire(
        &self,
        _app_id: &str,
        _channel: &str,
        _uid: &str,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        Ok("res-1".to_string())
    }

    async fn start(
        &self,
        _resource_id: &str,
        _app_id: &str,
        _channel: &str,
        _uid: &str,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        Ok("sid-1".to_string())
    }

    async fn stop(
        &self,
        _resource_id: &str,
        _sid: &str,
        _app_id: &str,
        _channel: &str,
        _uid: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct TestHarness {
    store: MeetingStore,
    meeting_id: String,
    tokens: Arc<StubTokenProvider>,
    transport: Arc<StubTransport>,
    recording_api: Arc<StubRecordingApi>,
}

impl TestHarness {
    async fn new() -> Self {
        let pool = nextalk::db::create_test_connection_in_memory()
            .await
            .unwrap();
        let store = MeetingStore::new(pool);
        let meeting = store
            .create_meeting("Standup", None, "host-1", "Alice", "app123")
            .await
            .unwrap();

        Self {
            store,
            meeting_id: meeting.id,
            tokens: Arc::new(StubTokenProvider::new()),
            transport: Arc::new(StubTransport::default()),
            recording_api: Arc::new(StubRecordingApi::default()),
        }
    }

    fn session_for(&self, user_id: &str, user_name: &str) -> MeetingSession {
        MeetingSession::new(
            &self.meeting_id,
            user_id,
            user_name,
            self.store.clone(),
            self.tokens.clone(),
            self.transport.clone(),
            Arc::new(RecordingCoordinator::new(self.recording_api.clone())),
            "my-bucket",
        )
    }
}

#[tokio::test]
async fn test_prepare_lands_on_join_prompt() {
    let harness = TestHarness::new().await;
    let mut session = harness.session_for("host-1", "Alice");

    assert_eq!(session.state(), SessionState::Idle);
    session.prepare().await.unwrap();
    assert_eq!(session.state(), SessionState::JoinPrompt);
    assert_eq!(session.meeting().unwrap().title, "Standup");
    assert!(session.is_host());
}

#[tokio::test]
async fn test_prepare_unknown_meeting_returns_to_idle() {
    let harness = TestHarness::new().await;
    let mut session = MeetingSession::new(
        "nope1234",
        "host-1",
        "Alice",
        harness.store.clone(),
        harness.tokens.clone(),
        harness.transport.clone(),
        Arc::new(RecordingCoordinator::new(harness.recording_api.clone())),
        "my-bucket",
    );

    assert!(session.prepare().await.is_err());
    assert_eq!(session.state(), SessionState::Idle);
    assert!(session.meeting().is_none());
}

#[tokio::test]
async fn test_join_requires_join_prompt_state() {
    let harness = TestHarness::new().await;
    let mut session = harness.session_for("guest-1", "Bob");

    // Join straight from Idle is rejected without touching the transport
    assert!(session.join_call().await.is_err());
    assert_eq!(session.state(), SessionState::Idle);
    assert_eq!(harness.transport.joins.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_join_publishes_tracks_and_records_participant() {
    let harness = TestHarness::new().await;
    let mut session = harness.session_for("guest-1", "Bob");

    session.prepare().await.unwrap();
    session.join_call().await.unwrap();

    assert_eq!(session.state(), SessionState::Joined);
    assert!(session.audio_enabled());
    assert!(session.video_enabled());
    assert!(!session.is_host());
    assert_eq!(harness.transport.joins.load(Ordering::SeqCst), 1);

    // The persisted participant set now includes the guest
    let meeting = harness
        .store
        .get_meeting(&harness.meeting_id)
        .await
        .unwrap()
        .unwrap();
    assert!(meeting.has_participant("guest-1"));
    assert_eq!(session.meeting().unwrap().participants, meeting.participants);
}

#[tokio::test]
async fn test_failed_join_rolls_back_to_join_prompt() {
    let harness = TestHarness::new().await;
    let mut session = harness.session_for("guest-1", "Bob");

    session.prepare().await.unwrap();
    harness.tokens.fail_next();
    assert!(session.join_call().await.is_err());
    assert_eq!(session.state(), SessionState::JoinPrompt);

    // The prompt stays live, so a retry can succeed
    session.join_call().await.unwrap();
    assert_eq!(session.state(), SessionState::Joined);
}

#[tokio::test]
async fn test_leave_resets_session() {
    let harness = TestHarness::new().await;
    let mut session = harness.session_for("host-1", "Alice");

    session.prepare().await.unwrap();
    session.join_call().await.unwrap();
    session.handle_roster_event(RosterEvent {
        uid: 42,
        kind: RosterEventKind::Published(MediaKind::Video),
    });
    assert!(session.send_chat_message("hello"));

    session.leave_call().await.unwrap();
    assert_eq!(session.state(), SessionState::Idle);
    assert!(session.roster().is_empty());
    assert!(session.chat_messages().is_empty());
    assert!(!session.audio_enabled());
    assert!(!session.video_enabled());
    assert_eq!(harness.transport.leaves.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_leave_stops_active_recording_first() {
    let harness = TestHarness::new().await;
    let mut session = harness.session_for("host-1", "Alice");

    session.prepare().await.unwrap();
    session.join_call().await.unwrap();
    session.start_recording().await.unwrap();
    assert!(session.meeting().unwrap().is_recording);

    session.leave_call().await.unwrap();
    assert_eq!(harness.recording_api.stops.load(Ordering::SeqCst), 1);

    let meeting = harness
        .store
        .get_meeting(&harness.meeting_id)
        .await
        .unwrap()
        .unwrap();
    assert!(!meeting.is_recording);
    assert_eq!(meeting.recordings.len(), 1);
}

#[tokio::test]
async fn test_recording_controls_require_joined_state() {
    let harness = TestHarness::new().await;
    let mut session = harness.session_for("host-1", "Alice");

    session.prepare().await.unwrap();
    assert!(session.start_recording().await.is_err());
    assert!(session.stop_recording().await.is_err());
    assert!(session.toggle_audio().await.is_err());
    assert!(session.toggle_video().await.is_err());
}

#[tokio::test]
async fn test_toggles_flip_track_state() {
    let harness = TestHarness::new().await;
    let mut session = harness.session_for("host-1", "Alice");

    session.prepare().await.unwrap();
    session.join_call().await.unwrap();

    assert!(!session.toggle_audio().await.unwrap());
    assert!(!session.audio_enabled());
    assert!(session.toggle_audio().await.unwrap());
    assert!(session.audio_enabled());

    assert!(!session.toggle_video().await.unwrap());
    assert!(!session.video_enabled());
}

#[tokio::test]
async fn test_roster_events_dropped_outside_joined_state() {
    let harness = TestHarness::new().await;
    let mut session = harness.session_for("host-1", "Alice");

    session.prepare().await.unwrap();
    session.handle_roster_event(RosterEvent {
        uid: 42,
        kind: RosterEventKind::Published(MediaKind::Video),
    });
    assert!(session.roster().is_empty());

    session.join_call().await.unwrap();
    session.handle_roster_event(RosterEvent {
        uid: 42,
        kind: RosterEventKind::Published(MediaKind::Video),
    });
    assert_eq!(session.roster().len(), 1);
}

#[tokio::test]
async fn test_chat_rejected_outside_joined_state() {
    let harness = TestHarness::new().await;
    let mut session = harness.session_for("host-1", "Alice");

    assert!(!session.send_chat_message("too early"));

    session.prepare().await.unwrap();
    session.join_call().await.unwrap();
    assert!(session.send_chat_message("hello"));
    assert!(!session.send_chat_message("   "));
    assert_eq!(session.chat_messages().len(), 1);
    assert_eq!(session.chat_messages()[0].message, "hello");
}

#[tokio::test]
async fn test_registry_replaces_and_removes_sessions() {
    let harness = TestHarness::new().await;
    let registry = SessionRegistry::new();

    registry.insert(harness.session_for("host-1", "Alice"));
    assert_eq!(registry.len(), 1);

    // A second session for the same meeting replaces the first
    registry.insert(harness.session_for("guest-1", "Bob"));
    assert_eq!(registry.len(), 1);

    let handle = registry.get(&harness.meeting_id).unwrap();
    assert_eq!(handle.lock().await.state(), SessionState::Idle);

    assert!(registry.remove(&harness.meeting_id).is_some());
    assert!(registry.is_empty());
    assert!(registry.get(&harness.meeting_id).is_none());
}
