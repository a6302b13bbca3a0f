use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::config::Configuration;
use crate::errors::Result;
use crate::transport::ApiClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiVersion {
    V1,
    V2,
}

impl ApiVersion {
    pub fn as_str(self) -> &'static str {
        match self {
            ApiVersion::V1 => "v1",
            ApiVersion::V2 => "v2",
        }
    }
}

/// Lazily builds and caches one [`ApiClient`] per API version.
///
/// Each `Client` owns its provider, so two clients never share transports.
#[derive(Debug)]
pub struct ApiClientProvider {
    clients: Mutex<HashMap<ApiVersion, Arc<ApiClient>>>,
    api_base_url: String,
    access_key: String,
}

impl ApiClientProvider {
    pub fn new(configuration: &Configuration) -> Self {
        Self {
            clients: Mutex::new(HashMap::new()),
            api_base_url: configuration.api_base_url.clone(),
            access_key: configuration.access_key.clone(),
        }
    }

    pub fn get(&self, version: ApiVersion) -> Result<Arc<ApiClient>> {
        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(client) = clients.get(&version) {
            return Ok(Arc::clone(client));
        }

        let client = Arc::new(ApiClient::new(
            &self.api_base_url,
            version,
            &self.access_key,
        )?);
        tracing::debug!("Created {} API client for {}", version.as_str(), client.base_url());
        clients.insert(version, Arc::clone(&client));

        Ok(client)
    }
}
