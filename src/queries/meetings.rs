use sea_query::{Expr, Query, SqliteQueryBuilder};

use crate::schema::Meetings;

fn all_columns() -> [Meetings; 13] {
    [
        Meetings::Id,
        Meetings::Title,
        Meetings::HostId,
        Meetings::HostName,
        Meetings::CreatedAtMs,
        Meetings::Status,
        Meetings::Participants,
        Meetings::AppId,
        Meetings::ChannelName,
        Meetings::IsRecording,
        Meetings::RecordingResourceId,
        Meetings::RecordingSid,
        Meetings::Recordings,
    ]
}

/// INSERT INTO meetings (...) VALUES (...)
/// New meetings always start with no active recording and an empty
/// recordings list.
#[allow(clippy::too_many_arguments)]
pub fn insert(
    id: &str,
    title: &str,
    host_id: &str,
    host_name: &str,
    created_at_ms: i64,
    status: &str,
    participants_json: &str,
    app_id: &str,
    channel_name: &str,
) -> String {
    Query::insert()
        .into_table(Meetings::Table)
        .columns(all_columns())
        .values_panic([
            id.into(),
            title.into(),
            host_id.into(),
            host_name.into(),
            created_at_ms.into(),
            status.into(),
            participants_json.into(),
            app_id.into(),
            channel_name.into(),
            false.into(),
            Option::<String>::None.into(),
            Option::<String>::None.into(),
            "[]".into(),
        ])
        .to_string(SqliteQueryBuilder)
}

/// SELECT * FROM meetings WHERE id = ?
pub fn select_by_id(id: &str) -> String {
    Query::select()
        .columns(all_columns())
        .from(Meetings::Table)
        .and_where(Expr::col(Meetings::Id).eq(id))
        .to_string(SqliteQueryBuilder)
}

/// SELECT * FROM meetings WHERE host_id = ? ORDER BY created_at_ms DESC
pub fn select_by_host(host_id: &str) -> String {
    Query::select()
        .columns(all_columns())
        .from(Meetings::Table)
        .and_where(Expr::col(Meetings::HostId).eq(host_id))
        .order_by(Meetings::CreatedAtMs, sea_query::Order::Desc)
        .to_string(SqliteQueryBuilder)
}

/// SELECT 1 FROM meetings WHERE id = ? (for existence check)
pub fn exists(id: &str) -> String {
    Query::select()
        .expr(Expr::val(1))
        .from(Meetings::Table)
        .and_where(Expr::col(Meetings::Id).eq(id))
        .to_string(SqliteQueryBuilder)
}

/// UPDATE meetings SET participants = json_insert(participants, '$[#]', ?)
/// WHERE id = ? AND the user is not already in the array
///
/// Single-statement append: SQLite serializes the writes, so concurrent
/// joins cannot clobber each other the way a read-then-replace would. The
/// NOT EXISTS guard keeps the append idempotent per user id. Affects zero
/// rows when the meeting is missing or the user is already present.
pub fn append_participant(id: &str, user_id: &str) -> String {
    Query::update()
        .table(Meetings::Table)
        .value(
            Meetings::Participants,
            Expr::cust_with_values("json_insert(\"participants\", '$[#]', ?)", [user_id]),
        )
        .and_where(Expr::col(Meetings::Id).eq(id))
        .and_where(Expr::cust_with_values(
            "NOT EXISTS (SELECT 1 FROM json_each(\"participants\") WHERE \"json_each\".\"value\" = ?)",
            [user_id],
        ))
        .to_string(SqliteQueryBuilder)
}

/// UPDATE meetings SET is_recording = 1, recording_resource_id = ?,
/// recording_sid = ? WHERE id = ?
pub fn update_recording_started(id: &str, resource_id: &str, sid: &str) -> String {
    Query::update()
        .table(Meetings::Table)
        .value(Meetings::IsRecording, true)
        .value(Meetings::RecordingResourceId, resource_id)
        .value(Meetings::RecordingSid, sid)
        .and_where(Expr::col(Meetings::Id).eq(id))
        .to_string(SqliteQueryBuilder)
}

/// UPDATE meetings SET is_recording = 0, recording_resource_id = NULL,
/// recording_sid = NULL, recordings = json_insert(recordings, '$[#]', json(?))
/// WHERE id = ?
///
/// Appends the finished entry in the same statement that clears the active
/// state, so a concurrent append cannot be lost to a stale snapshot.
pub fn update_recording_stopped(id: &str, entry_json: &str) -> String {
    Query::update()
        .table(Meetings::Table)
        .value(Meetings::IsRecording, false)
        .value(Meetings::RecordingResourceId, Option::<String>::None)
        .value(Meetings::RecordingSid, Option::<String>::None)
        .value(
            Meetings::Recordings,
            Expr::cust_with_values("json_insert(\"recordings\", '$[#]', json(?))", [entry_json]),
        )
        .and_where(Expr::col(Meetings::Id).eq(id))
        .to_string(SqliteQueryBuilder)
}
