use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Sheets,
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sheets" | "google_sheets" => Ok(Self::Sheets),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown STORE_BACKEND '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub frontend_url: String,

    pub store_backend: StoreBackend,

    // Google Sheets
    pub spreadsheet_id: String,
    pub worksheet_name: String,
    pub service_account_json: Option<String>,
    pub service_account_file: String,

    // Postgres
    pub database_url: Option<String>,

    pub data_cache_ttl_secs: u64,
    pub connection_cache_ttl_secs: u64,

    pub submit_rate_limit: u32,
    pub submit_rate_window_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()
                .expect("PORT must be a number"),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),

            store_backend: env::var("STORE_BACKEND")
                .unwrap_or_else(|_| "sheets".into())
                .parse()
                .expect("STORE_BACKEND must be one of sheets, postgres, memory"),

            spreadsheet_id: env::var("SPREADSHEET_ID").unwrap_or_default(),
            worksheet_name: env::var("WORKSHEET_NAME").unwrap_or_else(|_| "Sheet1".into()),
            service_account_json: env::var("GOOGLE_SERVICE_ACCOUNT_JSON")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            service_account_file: env::var("GOOGLE_APPLICATION_CREDENTIALS")
                .unwrap_or_else(|_| "google_credentials.json".into()),

            database_url: env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),

            data_cache_ttl_secs: env::var("DATA_CACHE_TTL_SECS")
                .unwrap_or_else(|_| "60".into())
                .parse()
                .unwrap_or(60),
            connection_cache_ttl_secs: env::var("CONNECTION_CACHE_TTL_SECS")
                .unwrap_or_else(|_| "600".into())
                .parse()
                .unwrap_or(600),

            submit_rate_limit: env::var("SUBMIT_RATE_LIMIT")
                .unwrap_or_else(|_| "5".into())
                .parse()
                .unwrap_or(5),
            submit_rate_window_secs: env::var("SUBMIT_RATE_WINDOW_SECS")
                .unwrap_or_else(|_| "60".into())
                .parse()
                .unwrap_or(60),
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Defaults suitable for tests: memory store, short caches.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            frontend_url: "http://localhost:3000".into(),
            store_backend: StoreBackend::Memory,
            spreadsheet_id: String::new(),
            worksheet_name: "Sheet1".into(),
            service_account_json: None,
            service_account_file: "google_credentials.json".into(),
            database_url: None,
            data_cache_ttl_secs: 60,
            connection_cache_ttl_secs: 600,
            submit_rate_limit: 5,
            submit_rate_window_secs: 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_backend_parses() {
        assert_eq!("sheets".parse::<StoreBackend>(), Ok(StoreBackend::Sheets));
        assert_eq!(" Postgres ".parse::<StoreBackend>(), Ok(StoreBackend::Postgres));
        assert_eq!("memory".parse::<StoreBackend>(), Ok(StoreBackend::Memory));
        assert!("excel".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn test_listen_addr() {
        let config = Config::for_tests();
        assert_eq!(config.listen_addr(), "127.0.0.1:0");
    }
}
