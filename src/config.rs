use clap::Parser;

/// Command-line configuration for the game server.
#[derive(Debug, Clone, Parser)]
#[command(name = "dos-server", version, about = "Real-time DOS card game server")]
pub struct ServerConfig {
    /// Interface to listen on
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = 8080)]
    pub port: u16,

    /// Fixed shuffle seed, for reproducible games
    #[arg(long)]
    pub seed: Option<u64>,

    /// Default log filter when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::parse_from(["dos-server"]);
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.seed, None);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::parse_from([
            "dos-server",
            "--host",
            "0.0.0.0",
            "-p",
            "9000",
            "--seed",
            "17",
            "--log-level",
            "debug",
        ]);
        assert_eq!(config.bind_address(), "0.0.0.0:9000");
        assert_eq!(config.seed, Some(17));
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_rejects_bad_port() {
        assert!(ServerConfig::try_parse_from(["dos-server", "--port", "http"]).is_err());
    }
}
