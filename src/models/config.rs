//! Configuration model loaded from external sources.

use std::path::PathBuf;

use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
/// Basic configuration shared across handlers.
pub struct ServerConfig {
    pub address: String,
    pub port: u16,
    /// Directory holding the browser form (`index.html`, `logo.jpeg`, scripts).
    pub static_dir: String,
    /// Upper bound for a whole multipart submission, in megabytes.
    #[serde(default = "default_upload_limit_mb")]
    pub upload_limit_mb: usize,
    pub storage: StorageConfig,
    #[serde(default)]
    pub photos: PhotoConfig,
    pub smtp: SmtpConfig,
}

#[derive(Clone, Debug, Deserialize)]
/// Filesystem locations for transient and persisted state.
pub struct StorageConfig {
    pub upload_dir: PathBuf,
    pub optimized_dir: PathBuf,
    pub output_dir: PathBuf,
    pub counter_file: PathBuf,
    pub clients_file: PathBuf,
    #[serde(default)]
    pub logo_path: Option<PathBuf>,
    #[serde(default = "default_retained_receipts")]
    pub retained_receipts: usize,
    /// Treat a corrupt counter file as "next number is 1" instead of failing.
    #[serde(default = "default_true")]
    pub reset_counter_on_corrupt: bool,
}

#[derive(Clone, Debug, Deserialize)]
/// Limits applied to uploaded photos before they are embedded.
pub struct PhotoConfig {
    pub max_width: u32,
    pub max_height: u32,
    pub jpeg_quality: u8,
    pub max_files: usize,
}

impl Default for PhotoConfig {
    fn default() -> Self {
        Self {
            max_width: 1024,
            max_height: 768,
            jpeg_quality: 70,
            max_files: 8,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
/// Outgoing mail settings.
pub struct SmtpConfig {
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    /// Implicit TLS when true, opportunistic STARTTLS otherwise.
    #[serde(default = "default_true")]
    pub secure: bool,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub bcc: Option<String>,
    #[serde(default = "default_from_name")]
    pub from_name: String,
    /// Sender address; falls back to `username`.
    #[serde(default)]
    pub from_address: Option<String>,
    #[serde(default = "default_true")]
    pub accept_invalid_certs: bool,
}

fn default_upload_limit_mb() -> usize {
    100
}

fn default_retained_receipts() -> usize {
    5
}

fn default_smtp_port() -> u16 {
    465
}

fn default_from_name() -> String {
    "JYM Electromecánica".to_string()
}

fn default_true() -> bool {
    true
}
