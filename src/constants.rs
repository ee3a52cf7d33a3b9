use rand::Rng;

/// Expected database schema version
/// All meeting databases must use this version for compatibility
pub const EXPECTED_DB_VERSION: &str = "1";

/// Length of generated meeting IDs
pub const MEETING_ID_LEN: usize = 8;

/// Character set for generated meeting IDs (lowercase alphanumeric)
pub const MEETING_ID_CHARSET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Placeholder duration reported for finished recordings, in seconds.
/// The recording vendor does not expose the real length through the
/// endpoints we call, so a fixed value is reported instead.
pub const PLACEHOLDER_RECORDING_DURATION_SECS: u32 = 300;

/// Generate a random meeting ID
/// Short lowercase alphanumeric token, collision-resistant enough for
/// human-shareable meeting codes
pub fn generate_meeting_id() -> String {
    let mut rng = rand::thread_rng();
    (0..MEETING_ID_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..MEETING_ID_CHARSET.len());
            MEETING_ID_CHARSET[idx] as char
        })
        .collect()
}
