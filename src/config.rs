use anyhow::Result;
use dotenvy::dotenv;
use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub service_name: String,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let host = env::var("INVOICING_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("INVOICING_PORT")
            .unwrap_or_else(|_| "3001".to_string())
            .parse()?;

        let db_url =
            env::var("INVOICING_DATABASE_URL").unwrap_or_else(|_| "sqlite:invoicing.db".to_string());
        let max_connections = env::var("INVOICING_DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse()?;

        Ok(Self {
            server: ServerConfig { host, port },
            database: DatabaseConfig {
                url: db_url,
                max_connections,
            },
            service_name: "invoicing-server".to_string(),
        })
    }
}
