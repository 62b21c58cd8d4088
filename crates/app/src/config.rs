use std::net::{IpAddr, Ipv4Addr, SocketAddr};

pub const DEFAULT_DB_URL: &str = "sqlite://lms.sqlite3?mode=rwc";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub db_url: String,
}

impl Config {
    /// Reads `HOST`, `PORT`, `RUST_LOG` and `LMS_DB_URL`. Call after `dotenvy::dotenv()`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = lookup("PORT")
            .and_then(|value| value.trim().parse::<u16>().ok())
            .unwrap_or(3000);

        let host = lookup("HOST")
            .and_then(|value| value.trim().parse::<IpAddr>().ok())
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

        let log_level = lookup("RUST_LOG")
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| "info".to_string());

        let db_url = lookup("LMS_DB_URL")
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DB_URL.to_string());

        Self {
            host,
            port,
            log_level,
            db_url,
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config(&[]);
        assert_eq!(config.bind_addr().to_string(), "0.0.0.0:3000");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.db_url, DEFAULT_DB_URL);
    }

    #[test]
    fn invalid_values_fall_back() {
        let config = config(&[("PORT", "http"), ("HOST", "localhost"), ("LMS_DB_URL", " ")]);
        assert_eq!(config.port, 3000);
        assert_eq!(config.host, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert_eq!(config.db_url, DEFAULT_DB_URL);
    }

    #[test]
    fn explicit_values_win() {
        let config = config(&[
            ("PORT", "8080"),
            ("HOST", "127.0.0.1"),
            ("RUST_LOG", "debug,sqlx=warn"),
            ("LMS_DB_URL", "sqlite://data/lms.sqlite3"),
        ]);
        assert_eq!(config.bind_addr().to_string(), "127.0.0.1:8080");
        assert_eq!(config.log_level, "debug,sqlx=warn");
        assert_eq!(config.db_url, "sqlite://data/lms.sqlite3");
    }
}
