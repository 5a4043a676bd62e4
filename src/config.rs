use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Shared token-signing secret. Must be identical in every process that
    /// mints or verifies tokens, including the backend RPC servers.
    pub secret_key: String,
    pub auth_rpc_addr: String,
    pub payment_rpc_addr: String,
    pub cors_origin: String,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let secret_key = std::env::var("ACCESS_TOKEN_SECRET_KEY")
            .context("ACCESS_TOKEN_SECRET_KEY is required")?;
        Ok(Self {
            secret_key,
            auth_rpc_addr: std::env::var("AUTH_RPC_ADDR")
                .unwrap_or_else(|_| "http://localhost:50052".into()),
            payment_rpc_addr: std::env::var("PAYMENT_RPC_ADDR")
                .unwrap_or_else(|_| "http://localhost:50053".into()),
            cors_origin: std::env::var("CORS_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:5173".into()),
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: std::env::var("APP_PORT")
                .unwrap_or_else(|_| "8081".into())
                .parse()
                .context("APP_PORT must be a port number")?,
        })
    }

    /// Socket address string the HTTP server binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
