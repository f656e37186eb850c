use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Retention caps for the two persistent tables.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetentionConfig {
    /// Maximum number of rows kept in the activity log.
    #[serde(default = "default_max_log_rows")]
    pub max_log_rows: usize,
    /// Maximum number of IP-history rows retained per distinct service.
    #[serde(default = "default_max_ips_per_service")]
    pub max_ips_per_service: usize,
}

fn default_max_log_rows() -> usize {
    2000
}

fn default_max_ips_per_service() -> usize {
    10
}

impl Default for RetentionConfig {
    fn default() -> Self {
        RetentionConfig {
            max_log_rows: default_max_log_rows(),
            max_ips_per_service: default_max_ips_per_service(),
        }
    }
}

/// Settings for the reporting agent binary.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AgentConfig {
    /// Base URL of the collector.
    #[serde(default)]
    pub collector_url: String,
    /// Name this machine reports itself under.
    #[serde(default)]
    pub service_name: String,
    /// Plain-text echo endpoint used to discover our own public IP.
    #[serde(default = "default_ip_echo_url")]
    pub ip_echo_url: String,
    /// Minutes between update checks.
    #[serde(default = "default_update_interval")]
    pub update_interval_minutes: u64,
}

fn default_ip_echo_url() -> String {
    "https://api.ipify.org".to_string()
}

fn default_update_interval() -> u64 {
    10
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig {
            collector_url: String::new(),
            service_name: String::new(),
            ip_echo_url: default_ip_echo_url(),
            update_interval_minutes: default_update_interval(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegistryConfig {
    /// Shared secret every request must carry in `authCode`.
    pub auth_code: String,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default)]
    pub retention: RetentionConfig,
    #[serde(default)]
    pub agent: AgentConfig,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_data_dir() -> String {
    "dynhub_data".to_string()
}

#[derive(Serialize)]
struct RegistryConfigDefaults {
    bind_addr: String,
    data_dir: String,
    retention: RetentionConfig,
    agent: AgentConfig,
}

/// Load layered configuration: defaults, then a TOML file, then
/// `DYNHUB_`-prefixed environment variables.
pub fn load_config(path: Option<&str>) -> Result<RegistryConfig, figment::Error> {
    let figment = Figment::from(Serialized::defaults(RegistryConfigDefaults {
        bind_addr: default_bind_addr(),
        data_dir: default_data_dir(),
        retention: RetentionConfig::default(),
        agent: AgentConfig::default(),
    }))
    .merge(Toml::file(path.unwrap_or("dynhub.toml")))
    .merge(Env::prefixed("DYNHUB_").split("__"));

    let config: RegistryConfig = figment.extract()?;

    if config.auth_code.trim().is_empty() {
        return Err(figment::Error::from("auth_code must be set".to_string()));
    }
    if config.retention.max_ips_per_service == 0 {
        return Err(figment::Error::from(
            "retention.max_ips_per_service must be at least 1".to_string(),
        ));
    }

    Ok(config)
}
