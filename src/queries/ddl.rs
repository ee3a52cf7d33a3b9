use sea_query::{ColumnDef, Index, SqliteQueryBuilder, Table};

use crate::schema::{Meetings, Metadata};

/// CREATE TABLE IF NOT EXISTS metadata (key TEXT PRIMARY KEY, value TEXT NOT NULL)
pub fn create_metadata_table() -> String {
    Table::create()
        .table(Metadata::Table)
        .if_not_exists()
        .col(ColumnDef::new(Metadata::Key).string().primary_key())
        .col(ColumnDef::new(Metadata::Value).string().not_null())
        .to_string(SqliteQueryBuilder)
}

/// CREATE TABLE IF NOT EXISTS meetings (
///     id TEXT PRIMARY KEY,
///     title TEXT NOT NULL,
///     host_id TEXT NOT NULL,
///     host_name TEXT NOT NULL,
///     created_at_ms INTEGER NOT NULL,
///     status TEXT NOT NULL,
///     participants TEXT NOT NULL,
///     app_id TEXT NOT NULL,
///     channel_name TEXT NOT NULL,
///     is_recording INTEGER NOT NULL DEFAULT 0,
///     recording_resource_id TEXT,
///     recording_sid TEXT,
///     recordings TEXT NOT NULL DEFAULT '[]'
/// )
pub fn create_meetings_table() -> String {
    Table::create()
        .table(Meetings::Table)
        .if_not_exists()
        .col(ColumnDef::new(Meetings::Id).string().primary_key())
        .col(ColumnDef::new(Meetings::Title).string().not_null())
        .col(ColumnDef::new(Meetings::HostId).string().not_null())
        .col(ColumnDef::new(Meetings::HostName).string().not_null())
        .col(
            ColumnDef::new(Meetings::CreatedAtMs)
                .big_integer()
                .not_null(),
        )
        .col(ColumnDef::new(Meetings::Status).string().not_null())
        .col(ColumnDef::new(Meetings::Participants).string().not_null())
        .col(ColumnDef::new(Meetings::AppId).string().not_null())
        .col(ColumnDef::new(Meetings::ChannelName).string().not_null())
        .col(
            ColumnDef::new(Meetings::IsRecording)
                .integer()
                .not_null()
                .default(0),
        )
        .col(ColumnDef::new(Meetings::RecordingResourceId).string())
        .col(ColumnDef::new(Meetings::RecordingSid).string())
        .col(
            ColumnDef::new(Meetings::Recordings)
                .string()
                .not_null()
                .default("[]"),
        )
        .to_string(SqliteQueryBuilder)
}

/// CREATE INDEX IF NOT EXISTS idx_meetings_host_id ON meetings(host_id)
pub fn create_meetings_host_index() -> String {
    Index::create()
        .if_not_exists()
        .name("idx_meetings_host_id")
        .table(Meetings::Table)
        .col(Meetings::HostId)
        .to_string(SqliteQueryBuilder)
}
