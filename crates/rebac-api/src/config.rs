use std::net::SocketAddr;

/// Startup configuration. Field list mirrors the recognized options in
/// §6 "Configuration (startup)": metrics/probe/webhook bind addresses, TLS
/// cert directory, leader election, initial-seed toggle, store backend
/// address and name, and optional tracing endpoint/sample ratio.
#[derive(Debug, Clone)]
pub struct Config {
    pub metrics_bind_addr: String,
    pub probe_bind_addr: String,
    pub webhook_bind_addr: SocketAddr,
    pub tls_cert_dir: Option<String>,
    pub enable_leader_election: bool,
    pub leader_election_id: Option<String>,
    pub reconcile_rbac: bool,
    pub store_backend_addr: String,
    pub store_name: String,
    pub tracing_endpoint: Option<String>,
    pub tracing_sample_ratio: Option<f64>,
}

impl Config {
    pub fn from_env() -> Self {
        let webhook_bind_addr = std::env::var("WEBHOOK_BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8443".to_string())
            .parse::<SocketAddr>()
            .expect("WEBHOOK_BIND_ADDR must be a valid host:port address");

        Self {
            metrics_bind_addr: std::env::var("METRICS_BIND_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            probe_bind_addr: std::env::var("PROBE_BIND_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:8081".to_string()),
            webhook_bind_addr,
            tls_cert_dir: std::env::var("TLS_CERT_DIR").ok(),
            enable_leader_election: std::env::var("ENABLE_LEADER_ELECTION")
                .map(|v| v == "true")
                .unwrap_or(false),
            leader_election_id: std::env::var("LEADER_ELECTION_ID").ok(),
            reconcile_rbac: std::env::var("RECONCILE_RBAC")
                .map(|v| v != "false")
                .unwrap_or(true),
            store_backend_addr: std::env::var("STORE_BACKEND_ADDR")
                .expect("STORE_BACKEND_ADDR must be set"),
            store_name: std::env::var("STORE_NAME").expect("STORE_NAME must be set"),
            tracing_endpoint: std::env::var("TRACING_ENDPOINT").ok(),
            tracing_sample_ratio: std::env::var("TRACING_SAMPLE_RATIO")
                .ok()
                .and_then(|v| v.parse().ok()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic(expected = "STORE_NAME must be set")]
    fn missing_store_name_panics() {
        std::env::remove_var("STORE_BACKEND_ADDR");
        std::env::remove_var("STORE_NAME");
        std::env::set_var("STORE_BACKEND_ADDR", "store.internal:8081");
        Config::from_env();
        std::env::remove_var("STORE_BACKEND_ADDR");
    }

    #[test]
    #[should_panic(expected = "WEBHOOK_BIND_ADDR must be a valid host:port address")]
    fn invalid_webhook_address_panics() {
        std::env::set_var("STORE_BACKEND_ADDR", "store.internal:8081");
        std::env::set_var("STORE_NAME", "rbac");
        std::env::set_var("WEBHOOK_BIND_ADDR", "not-an-address");
        Config::from_env();
        std::env::remove_var("STORE_BACKEND_ADDR");
        std::env::remove_var("STORE_NAME");
        std::env::remove_var("WEBHOOK_BIND_ADDR");
    }
}
