use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

/// Environment variable holding the recording vendor customer key
pub const RECORDING_KEY_ENV: &str = "NEXTALK_RECORDING_KEY";

/// Environment variable holding the recording vendor secret certificate
pub const RECORDING_CERT_ENV: &str = "NEXTALK_RECORDING_CERT";

/// Environment variable holding the object storage service key
pub const STORAGE_SERVICE_KEY_ENV: &str = "NEXTALK_STORAGE_SERVICE_KEY";

/// Environment variable overriding the S3 bucket recordings land in
pub const S3_BUCKET_ENV: &str = "NEXTALK_S3_BUCKET";

/// Build the HTTP Basic authorization header value for the recording vendor
///
/// Secrets are read from the environment at call time rather than once at
/// startup, so rotated credentials take effect without a restart.
pub fn recording_basic_auth() -> Result<String, String> {
    let key = std::env::var(RECORDING_KEY_ENV)
        .map_err(|_| format!("{} environment variable not set", RECORDING_KEY_ENV))?;
    let cert = std::env::var(RECORDING_CERT_ENV)
        .map_err(|_| format!("{} environment variable not set", RECORDING_CERT_ENV))?;
    Ok(format!(
        "Basic {}",
        BASE64.encode(format!("{}:{}", key, cert))
    ))
}

/// Bearer key for the object storage service, read at call time
pub fn storage_service_key() -> Result<String, String> {
    std::env::var(STORAGE_SERVICE_KEY_ENV)
        .map_err(|_| format!("{} environment variable not set", STORAGE_SERVICE_KEY_ENV))
}

/// S3 bucket for synthesized recording playback URLs
/// The environment wins over the configured fallback
pub fn s3_bucket(config_fallback: &str) -> Result<String, String> {
    match std::env::var(S3_BUCKET_ENV) {
        Ok(bucket) if !bucket.is_empty() => Ok(bucket),
        _ if !config_fallback.is_empty() => Ok(config_fallback.to_string()),
        _ => Err(format!(
            "No S3 bucket configured ({} is unset and the config file has no s3_bucket)",
            S3_BUCKET_ENV
        )),
    }
}
