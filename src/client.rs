use std::sync::Arc;

use crate::config::{Configuration, ConfigurationOverride};
use crate::errors::Result;
use crate::provider::{ApiClientProvider, ApiVersion};
use crate::repositories::{ApiCapabilities, ContractRepository, WalletRepository};
use crate::simulator::Simulator;
use crate::transport::ApiClient;

/// State shared by the repositories of one client.
#[derive(Debug)]
pub(crate) struct ClientContext {
    pub(crate) configuration: Configuration,
    pub(crate) capabilities: ApiCapabilities,
    provider: ApiClientProvider,
}

impl ClientContext {
    pub(crate) fn api(&self, version: ApiVersion) -> Result<Arc<ApiClient>> {
        self.provider.get(version)
    }

    /// Project prefix; v1 and v2 spell it differently.
    pub(crate) fn project_path(&self, version: ApiVersion) -> String {
        let config = &self.configuration;
        match version {
            ApiVersion::V1 => format!(
                "/account/{}/project/{}",
                config.account_name, config.project_name
            ),
            ApiVersion::V2 => format!(
                "/accounts/{}/projects/{}",
                config.account_name, config.project_name
            ),
        }
    }
}

/// Entry point: validated configuration plus per-version transports.
#[derive(Debug, Clone)]
pub struct Client {
    context: Arc<ClientContext>,
}

impl Client {
    /// Fails with `InvalidConstructorParameters` before any request is made.
    pub fn new(configuration: Configuration) -> Result<Self> {
        Self::with_capabilities_inner(configuration, ApiCapabilities::default())
    }

    fn with_capabilities_inner(
        configuration: Configuration,
        capabilities: ApiCapabilities,
    ) -> Result<Self> {
        configuration.validate()?;
        let provider = ApiClientProvider::new(&configuration);

        tracing::debug!(
            "Created client for {}/{} on network {}",
            configuration.account_name,
            configuration.project_name,
            configuration.network
        );

        Ok(Self {
            context: Arc::new(ClientContext {
                configuration,
                capabilities,
                provider,
            }),
        })
    }

    /// New client over the merged configuration; `self` is unchanged.
    pub fn with(&self, overrides: ConfigurationOverride) -> Result<Self> {
        Self::with_capabilities_inner(
            self.context.configuration.with(overrides),
            self.context.capabilities.clone(),
        )
    }

    /// New client selecting API versions from `capabilities`.
    pub fn with_capabilities(&self, capabilities: ApiCapabilities) -> Result<Self> {
        Self::with_capabilities_inner(self.context.configuration.clone(), capabilities)
    }

    pub fn configuration(&self) -> &Configuration {
        &self.context.configuration
    }

    pub fn capabilities(&self) -> &ApiCapabilities {
        &self.context.capabilities
    }

    pub fn contracts(&self) -> ContractRepository {
        ContractRepository::new(Arc::clone(&self.context))
    }

    pub fn wallets(&self) -> WalletRepository {
        WalletRepository::new(Arc::clone(&self.context))
    }

    pub fn simulator(&self) -> Simulator {
        Simulator::new(Arc::clone(&self.context))
    }
}
