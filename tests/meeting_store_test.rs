//! # Meeting Store Tests
//!
//! These tests verify meeting persistence against a real SQLite database:
//! creation defaults, custom ids, duplicate rejection, participant updates,
//! and the recording state round trip.
//!
//! ## Running the Tests
//!
//! ```bash
//! cargo test --test meeting_store_test
//! ```

use chrono::Utc;

use nextalk::constants::{MEETING_ID_CHARSET, MEETING_ID_LEN};
use nextalk::meeting::RecordingEntry;
use nextalk::store::MeetingStore;

async fn create_test_store() -> MeetingStore {
    let pool = nextalk::db::create_test_connection_in_memory()
        .await
        .unwrap();
    MeetingStore::new(pool)
}

#[tokio::test]
async fn test_create_and_fetch_meeting() {
    let store = create_test_store().await;

    let created = store
        .create_meeting("Standup", None, "user-1", "Alice", "app123")
        .await
        .unwrap();
    assert_eq!(created.title, "Standup");
    assert_eq!(created.id.len(), MEETING_ID_LEN);
    assert!(created.id.bytes().all(|b| MEETING_ID_CHARSET.contains(&b)));
    assert_eq!(created.channel_name, created.id);

    let fetched = store.get_meeting(&created.id).await.unwrap().unwrap();
    assert_eq!(fetched.title, "Standup");
    assert_eq!(fetched.host_id, "user-1");
    assert_eq!(fetched.host_name, "Alice");
    assert_eq!(fetched.status, "active");
    assert_eq!(fetched.participants, vec!["user-1".to_string()]);
    assert_eq!(fetched.app_id, "app123");
    assert!(!fetched.is_recording);
    assert!(fetched.recordings.is_empty());
}

#[tokio::test]
async fn test_blank_title_falls_back_to_default() {
    let store = create_test_store().await;

    let created = store
        .create_meeting("   ", None, "user-1", "Alice", "app123")
        .await
        .unwrap();
    assert_eq!(created.title, "Quick Meeting");

    let fetched = store.get_meeting(&created.id).await.unwrap().unwrap();
    assert_eq!(fetched.title, "Quick Meeting");
}

#[tokio::test]
async fn test_custom_id_is_honored() {
    let store = create_test_store().await;

    let created = store
        .create_meeting("Planning", Some("team-room"), "user-1", "Alice", "app123")
        .await
        .unwrap();
    assert_eq!(created.id, "team-room");
    assert_eq!(created.channel_name, "team-room");
}

#[tokio::test]
async fn test_duplicate_id_rejected() {
    let store = create_test_store().await;

    store
        .create_meeting("First", Some("team-room"), "user-1", "Alice", "app123")
        .await
        .unwrap();
    let err = store
        .create_meeting("Second", Some("team-room"), "user-2", "Bob", "app123")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("already exists"));
}

#[tokio::test]
async fn test_unknown_meeting_returns_none() {
    let store = create_test_store().await;
    assert!(store.get_meeting("nope1234").await.unwrap().is_none());
}

#[tokio::test]
async fn test_add_participant_is_idempotent() {
    let store = create_test_store().await;
    let meeting = store
        .create_meeting("Standup", None, "user-1", "Alice", "app123")
        .await
        .unwrap();

    let updated = store.add_participant(&meeting.id, "user-2").await.unwrap();
    assert_eq!(updated.participants, vec!["user-1", "user-2"]);

    // A second join by the same user must not duplicate the entry
    let updated = store.add_participant(&meeting.id, "user-2").await.unwrap();
    assert_eq!(updated.participants, vec!["user-1", "user-2"]);

    let fetched = store.get_meeting(&meeting.id).await.unwrap().unwrap();
    assert_eq!(fetched.participants, vec!["user-1", "user-2"]);
}

#[tokio::test]
async fn test_concurrent_joins_keep_every_participant() {
    // File-backed pool with multiple connections, so the joins really race
    let (pool, _guard) = nextalk::db::create_test_connection_in_temporary_file()
        .await
        .unwrap();
    let store = MeetingStore::new(pool);

    for round in 0..20 {
        let meeting = store
            .create_meeting(
                "Standup",
                Some(&format!("room-{}", round)),
                "host-1",
                "Alice",
                "app123",
            )
            .await
            .unwrap();

        let store_a = store.clone();
        let store_b = store.clone();
        let id_a = meeting.id.clone();
        let id_b = meeting.id.clone();
        let join_a = tokio::spawn(async move { store_a.add_participant(&id_a, "user-a").await });
        let join_b = tokio::spawn(async move { store_b.add_participant(&id_b, "user-b").await });
        join_a.await.unwrap().unwrap();
        join_b.await.unwrap().unwrap();

        let fetched = store.get_meeting(&meeting.id).await.unwrap().unwrap();
        assert!(
            fetched.has_participant("user-a"),
            "round {}: lost update, participants = {:?}",
            round,
            fetched.participants
        );
        assert!(
            fetched.has_participant("user-b"),
            "round {}: lost update, participants = {:?}",
            round,
            fetched.participants
        );
        assert_eq!(fetched.participants.len(), 3);
    }
}

#[tokio::test]
async fn test_add_participant_to_unknown_meeting_fails() {
    let store = create_test_store().await;
    let err = store.add_participant("nope1234", "user-2").await.unwrap_err();
    assert!(err.to_string().contains("not found"));
}

#[tokio::test]
async fn test_recording_state_round_trip() {
    let store = create_test_store().await;
    let meeting = store
        .create_meeting("Standup", None, "user-1", "Alice", "app123")
        .await
        .unwrap();

    store
        .set_recording_started(&meeting.id, "res-1", "sid-1")
        .await
        .unwrap();
    let active = store.get_meeting(&meeting.id).await.unwrap().unwrap();
    assert!(active.is_recording);
    assert_eq!(active.recording_resource_id.as_deref(), Some("res-1"));
    assert_eq!(active.recording_sid.as_deref(), Some("sid-1"));

    let entry = RecordingEntry {
        url: "https://bucket.s3.amazonaws.com/recordings/x/recording.m3u8".to_string(),
        timestamp: Utc::now(),
        duration_secs: 300,
    };
    let stopped = store
        .set_recording_stopped(&meeting.id, entry.clone())
        .await
        .unwrap();
    assert!(!stopped.is_recording);
    assert!(stopped.recording_resource_id.is_none());
    assert!(stopped.recording_sid.is_none());
    assert_eq!(stopped.recordings, vec![entry.clone()]);

    let fetched = store.get_meeting(&meeting.id).await.unwrap().unwrap();
    assert!(!fetched.is_recording);
    assert_eq!(fetched.recordings, vec![entry]);
}

#[tokio::test]
async fn test_set_recording_started_on_unknown_meeting_fails() {
    let store = create_test_store().await;
    let err = store
        .set_recording_started("nope1234", "res-1", "sid-1")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("not found"));
}

#[tokio::test]
async fn test_meetings_survive_in_file_backed_database() {
    let (pool, _guard) = nextalk::db::create_test_connection_in_temporary_file()
        .await
        .unwrap();
    nextalk::db::check_database_version(&pool).await.unwrap();

    let store = MeetingStore::new(pool);
    let created = store
        .create_meeting("Standup", None, "user-1", "Alice", "app123")
        .await
        .unwrap();
    let fetched = store.get_meeting(&created.id).await.unwrap().unwrap();
    assert_eq!(fetched.id, created.id);
}

#[tokio::test]
async fn test_list_meetings_for_host_newest_first() {
    let store = create_test_store().await;

    store
        .create_meeting("First", Some("aaa"), "user-1", "Alice", "app123")
        .await
        .unwrap();
    store
        .create_meeting("Other host", Some("bbb"), "user-2", "Bob", "app123")
        .await
        .unwrap();
    store
        .create_meeting("Second", Some("ccc"), "user-1", "Alice", "app123")
        .await
        .unwrap();

    let meetings = store.list_meetings_for_host("user-1").await.unwrap();
    assert_eq!(meetings.len(), 2);
    assert!(meetings.iter().all(|m| m.host_id == "user-1"));
    assert!(meetings[0].created_at_ms >= meetings[1].created_at_ms);
}
