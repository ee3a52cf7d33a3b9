// Library interface for testing

// Declare all modules
pub mod chat;
pub mod config;
pub mod constants;
pub mod credentials;
pub mod db;
pub mod meeting;
pub mod queries;
pub mod recording;
pub mod roster;
pub mod rtc;
pub mod schema;
pub mod serve;
pub mod session;
pub mod storage;
pub mod store;

// Re-export the expected database version for convenience
pub use constants::EXPECTED_DB_VERSION;
