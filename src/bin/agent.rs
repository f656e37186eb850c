// DynHub agent
// Periodically discovers this machine's public IP, reports it to the
// collector when it changes, and fetches the current network snapshot.

use std::net::Ipv4Addr;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use serde_json::json;

use dynhub::config_loader::{load_config, AgentConfig};
use dynhub::web::ResponseEnvelope;

#[derive(Parser, Debug)]
#[command(name = "agent", about = "DynHub reporting agent")]
struct Args {
    /// Path to the TOML config file.
    #[arg(long)]
    config: Option<String>,

    /// Run a single update check and exit.
    #[arg(long)]
    oneshot: bool,
}

struct IpReporter {
    client: reqwest::blocking::Client,
    config: AgentConfig,
    auth_code: String,
    last_known_ip: Option<String>,
}

impl IpReporter {
    fn new(config: AgentConfig, auth_code: String) -> Self {
        IpReporter {
            client: reqwest::blocking::Client::new(),
            config,
            auth_code,
            last_known_ip: None,
        }
    }

    /// GET the configured echo endpoint and trim the result.
    fn own_ip(&self) -> anyhow::Result<String> {
        let text = self
            .client
            .get(&self.config.ip_echo_url)
            .send()
            .context("ip echo request failed")?
            .text()
            .context("ip echo response unreadable")?;
        Ok(text.trim().to_string())
    }

    fn is_valid_ipv4(ip: &str) -> bool {
        ip.parse::<Ipv4Addr>().is_ok()
    }

    fn request_body(&self, request_type: &str, ip: &str) -> serde_json::Value {
        json!({
            "authCode": self.auth_code,
            "requestType": request_type,
            "serviceName": self.config.service_name,
            "ip": ip,
        })
    }

    fn post(&self, request_type: &str, ip: &str) -> anyhow::Result<ResponseEnvelope> {
        let body = self.request_body(request_type, ip);
        let envelope: ResponseEnvelope = self
            .client
            .post(&self.config.collector_url)
            .json(&body)
            .send()
            .context("collector request failed")?
            .json()
            .context("collector response was not a valid envelope")?;
        Ok(envelope)
    }

    /// One check: discover the public IP and report it if it changed.
    fn update(&mut self) -> anyhow::Result<()> {
        let ip = self.own_ip()?;
        if !Self::is_valid_ipv4(&ip) {
            bail!("echo endpoint returned an invalid IPv4 address: {ip:?}");
        }

        if self.last_known_ip.as_deref() == Some(ip.as_str()) {
            tracing::info!("IP has not changed since last check ({ip})");
            return Ok(());
        }

        tracing::info!("IP changed to {ip}, reporting");
        let envelope = self.post("UPDATE_IP", &ip)?;
        if envelope.status != 200 {
            bail!("collector rejected update: {} {}", envelope.status, envelope.message);
        }
        self.last_known_ip = Some(ip);
        Ok(())
    }

    /// Fetch the latest (service, ip) pairs known to the collector. The
    /// `ip` field carries no meaning for this request type, so it is left
    /// empty rather than echoing our own address.
    fn fetch_network(&self) -> anyhow::Result<Vec<(String, String)>> {
        let envelope = self.post("REQUEST_NETWORK", "")?;
        if envelope.status != 200 {
            bail!(
                "collector rejected network request: {} {}",
                envelope.status,
                envelope.message
            );
        }
        serde_json::from_value(envelope.value).context("malformed network value")
    }

    fn run_once(&mut self) {
        if let Err(e) = self.update() {
            tracing::warn!("update failed: {e:#}");
        }
        match self.fetch_network() {
            Ok(network) => {
                for (service, ip) in &network {
                    tracing::info!("network: {service} -> {ip}");
                }
            }
            Err(e) => tracing::warn!("network fetch failed: {e:#}"),
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    let config = load_config(args.config.as_deref()).context("failed to load config")?;

    if config.agent.collector_url.trim().is_empty() {
        bail!("agent.collector_url must be set");
    }
    if config.agent.service_name.trim().is_empty() {
        bail!("agent.service_name must be set");
    }

    let interval = Duration::from_secs(config.agent.update_interval_minutes * 60);
    let mut reporter = IpReporter::new(config.agent.clone(), config.auth_code.clone());

    reporter.run_once();
    if args.oneshot {
        return Ok(());
    }

    loop {
        thread::sleep(interval);
        reporter.run_once();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reporter() -> IpReporter {
        let config = AgentConfig {
            collector_url: "http://localhost:1".to_string(),
            service_name: "homebox".to_string(),
            ..AgentConfig::default()
        };
        IpReporter::new(config, "secret".to_string())
    }

    #[test]
    pub fn update_body_carries_the_reported_ip() {
        let body = reporter().request_body("UPDATE_IP", "1.2.3.4");
        assert_eq!(body["requestType"], "UPDATE_IP");
        assert_eq!(body["serviceName"], "homebox");
        assert_eq!(body["ip"], "1.2.3.4");
        assert_eq!(body["authCode"], "secret");
    }

    #[test]
    pub fn network_request_sends_an_empty_ip() {
        let mut r = reporter();
        r.last_known_ip = Some("1.2.3.4".to_string());
        let body = r.request_body("REQUEST_NETWORK", "");
        assert_eq!(body["requestType"], "REQUEST_NETWORK");
        assert_eq!(body["ip"], "");
    }

    #[test]
    pub fn ipv4_validation_accepts_dotted_quads_only() {
        assert!(IpReporter::is_valid_ipv4("151.26.154.189"));
        assert!(!IpReporter::is_valid_ipv4(""));
        assert!(!IpReporter::is_valid_ipv4("not an ip"));
        assert!(!IpReporter::is_valid_ipv4("::1"));
    }
}
