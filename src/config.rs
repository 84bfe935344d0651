use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

/// Application-level constants
pub const APP_NAME: &str = "ClinicDesk";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default staff session idle timeout: 15 minutes.
pub const DEFAULT_SESSION_IDLE_SECS: u64 = 900;

/// Default budget for a single analytics count query.
pub const DEFAULT_ANALYTICS_TIMEOUT_MS: u64 = 2_000;

/// Database file name inside the data directory.
const DATABASE_FILE: &str = "clinicdesk.db";

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "clinicdesk=info,clinicdesk_lib=info,tower_http=warn"
}

/// Get the application data directory
/// ~/ClinicDesk/ on all platforms. Falls back to the working directory
/// when no home directory can be determined (containers, service accounts).
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Get the default database path
pub fn database_path() -> PathBuf {
    app_data_dir().join(DATABASE_FILE)
}

/// Runtime configuration for the clinic server.
///
/// Every flag can also be supplied through the environment, which is
/// how the field secret is expected to arrive in deployments.
#[derive(Debug, Clone, Parser)]
#[command(name = "clinicdesk", version, about = "Clinic patient records and appointment analytics")]
pub struct ServerConfig {
    /// Address the HTTP API binds to.
    #[arg(long, env = "CLINICDESK_BIND", default_value = "127.0.0.1:8080")]
    pub bind: SocketAddr,

    /// Directory holding the SQLite database.
    #[arg(long, env = "CLINICDESK_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Shared secret the diagnosis encryption key is derived from.
    #[arg(long, env = "CLINICDESK_FIELD_SECRET", hide_env_values = true)]
    pub field_secret: String,

    /// Username created on first start when no staff account exists.
    #[arg(long, env = "CLINICDESK_ADMIN_USER", default_value = "admin")]
    pub admin_user: String,

    /// Password for the bootstrap account. Without it no account is created.
    #[arg(long, env = "CLINICDESK_ADMIN_PASSWORD", hide_env_values = true)]
    pub admin_password: Option<String>,

    /// Idle seconds before a staff session expires.
    #[arg(long, env = "CLINICDESK_SESSION_IDLE_SECS", default_value_t = DEFAULT_SESSION_IDLE_SECS)]
    pub session_idle_secs: u64,

    /// Milliseconds an analytics count query may wait on a locked database.
    #[arg(long, env = "CLINICDESK_ANALYTICS_TIMEOUT_MS", default_value_t = DEFAULT_ANALYTICS_TIMEOUT_MS)]
    pub analytics_timeout_ms: u64,
}

impl ServerConfig {
    /// Resolved database path: `--data-dir` if given, else the home default.
    pub fn database_path(&self) -> PathBuf {
        match &self.data_dir {
            Some(dir) => dir.join(DATABASE_FILE),
            None => database_path(),
        }
    }
}
