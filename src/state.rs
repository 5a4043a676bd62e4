use std::sync::Arc;

use anyhow::Context;
use tonic::transport::{Channel, Endpoint};

use crate::config::AppConfig;
use crate::rpc::pb::{
    auth_service_client::AuthServiceClient, payment_service_client::PaymentServiceClient,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth: AuthServiceClient<Channel>,
    pub payment: PaymentServiceClient<Channel>,
}

impl AppState {
    pub fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        Self::from_config(config)
    }

    /// Channels connect lazily; the first RPC establishes the connection.
    pub fn from_config(config: Arc<AppConfig>) -> anyhow::Result<Self> {
        let auth_channel = Endpoint::from_shared(config.auth_rpc_addr.clone())
            .context("invalid auth rpc address")?
            .connect_lazy();
        let payment_channel = Endpoint::from_shared(config.payment_rpc_addr.clone())
            .context("invalid payment rpc address")?
            .connect_lazy();
        Ok(Self {
            config,
            auth: AuthServiceClient::new(auth_channel),
            payment: PaymentServiceClient::new(payment_channel),
        })
    }
}
