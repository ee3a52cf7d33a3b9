use async_trait::async_trait;
use serde::Deserialize;

/// Local capture tracks currently published into the channel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LocalTracks {
    pub audio: bool,
    pub video: bool,
}

/// Side-effect boundary over the vendor real-time transport SDK
///
/// The session controller is the only caller, and it invokes these methods
/// exclusively from state-transition handlers. The trait mirrors the vendor
/// session object: one joined channel at a time per transport instance.
#[async_trait]
pub trait RtcTransport: Send + Sync {
    /// Open the transport session for a channel using a fetched credential
    async fn join(
        &self,
        app_id: &str,
        channel: &str,
        token: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Acquire local microphone and camera capture and publish both
    async fn publish_local_tracks(
        &self,
    ) -> Result<LocalTracks, Box<dyn std::error::Error + Send + Sync>>;

    /// Enable or disable the published local audio track
    async fn set_audio_enabled(
        &self,
        enabled: bool,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Enable or disable the published local video track
    async fn set_video_enabled(
        &self,
        enabled: bool,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Release local capture resources
    async fn close_local_tracks(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Close the transport session
    async fn leave(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Boundary over the external token service issuing transport credentials
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn fetch_token(
        &self,
        channel: &str,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>>;
}

/// HTTP client for the external RTC token service
pub struct TokenClient {
    base_url: String,
    client: reqwest::Client,
}

impl TokenClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    token: String,
}

#[async_trait]
impl TokenProvider for TokenClient {
    async fn fetch_token(
        &self,
        channel: &str,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let url = format!(
            "{}/rtc-token?channelName={}",
            self.base_url,
            urlencoding::encode(channel)
        );
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(format!("Token server error: {}", response.status()).into());
        }

        let body: TokenResponse = response.json().await?;
        Ok(body.token)
    }
}
