use core_config::{AppInfo, FromEnv, app_info, env_optional, server::ServerConfig};
use domain_notifications::EmailConfig;

pub use core_config::Environment;

/// Application-specific configuration.
/// Composes shared config components from the `config` library.
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub environment: Environment,
    pub server: ServerConfig,
    pub email: EmailConfig,
    /// Default recipient for schedule change requests
    pub center_email: Option<String>,
    /// Empty means any origin may call the API
    pub cors_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let server = ServerConfig::from_env()?; // Uses defaults: HOST=0.0.0.0, PORT=8080
        let email = EmailConfig::from_env()?; // Missing credentials are not an error here

        let cors_origins = env_optional("CORS_ALLOWED_ORIGIN")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            app: app_info!(),
            environment,
            server,
            email,
            center_email: env_optional("CENTER_EMAIL"),
            cors_origins,
        })
    }
}
