use sea_query::Iden;

/// Metadata table - key-value store for database configuration
#[derive(Iden)]
pub enum Metadata {
    Table,
    Key,
    Value,
}

/// Meetings table - one row per meeting room
///
/// `Participants` and `Recordings` are JSON-encoded arrays. The participant
/// set is small and only ever read or replaced as a whole, so JSON columns
/// keep the schema flat.
#[derive(Iden)]
pub enum Meetings {
    Table,
    Id,
    Title,
    HostId,
    HostName,
    CreatedAtMs,
    Status,
    Participants,
    AppId,
    ChannelName,
    IsRecording,
    RecordingResourceId,
    RecordingSid,
    Recordings,
}
