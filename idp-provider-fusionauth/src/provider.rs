//! FusionAuth Provider implementation
//!
//! This module contains the provider that dispatches resource operations
//! to the per-resource adapters over a shared API client.

use std::sync::Arc;

use idp_core::provider::{ProviderError, ProviderResult};
use idp_core::resource::{Resource, ResourceId, State};

use crate::client::{FusionAuthClient, IdentityProviderApi};
use crate::config::{EnvelopeParsing, FusionAuthConfig};
use crate::idp_google;
use crate::resources::find_resource_type;

/// FusionAuth Provider
pub struct FusionAuthProvider {
    client: Arc<dyn IdentityProviderApi>,
    envelope_parsing: EnvelopeParsing,
}

impl FusionAuthProvider {
    /// Create a new FusionAuthProvider talking to the configured instance
    pub fn new(config: &FusionAuthConfig) -> ProviderResult<Self> {
        let client = FusionAuthClient::new(config).map_err(|e| {
            ProviderError::new(format!("Failed to build FusionAuth client: {}", e)).with_cause(e)
        })?;
        Ok(Self::with_client(Arc::new(client), config.envelope_parsing))
    }

    /// Create a provider over an existing client
    pub fn with_client(
        client: Arc<dyn IdentityProviderApi>,
        envelope_parsing: EnvelopeParsing,
    ) -> Self {
        Self {
            client,
            envelope_parsing,
        }
    }

    fn unknown_type(id: &ResourceId) -> ProviderError {
        ProviderError::new(format!("Unknown resource type: {}", id.resource_type))
            .for_resource(id.clone())
    }

    // =========================================================================
    // Resource Operations
    // =========================================================================

    /// Read a resource by its service identifier
    pub async fn read_resource(
        &self,
        id: &ResourceId,
        identifier: Option<&str>,
    ) -> ProviderResult<State> {
        match id.resource_type.as_str() {
            idp_google::RESOURCE_TYPE => match identifier {
                Some(identifier) => {
                    idp_google::read(self.client.as_ref(), id, identifier, self.envelope_parsing)
                        .await
                }
                None => Ok(State::not_found(id.clone())),
            },
            _ => Err(Self::unknown_type(id)),
        }
    }

    /// Create a resource
    pub async fn create_resource(&self, resource: Resource) -> ProviderResult<State> {
        match resource.id.resource_type.as_str() {
            idp_google::RESOURCE_TYPE => idp_google::create(self.client.as_ref(), &resource).await,
            _ => Err(Self::unknown_type(&resource.id)),
        }
    }

    /// Update a resource
    pub async fn update_resource(
        &self,
        id: ResourceId,
        identifier: &str,
        to: Resource,
    ) -> ProviderResult<State> {
        match id.resource_type.as_str() {
            idp_google::RESOURCE_TYPE => {
                idp_google::update(self.client.as_ref(), identifier, &to).await
            }
            _ => Err(Self::unknown_type(&id)),
        }
    }

    /// Delete a resource
    pub async fn delete_resource(&self, id: &ResourceId, identifier: &str) -> ProviderResult<()> {
        match id.resource_type.as_str() {
            idp_google::RESOURCE_TYPE => {
                idp_google::delete(self.client.as_ref(), id, identifier).await
            }
            _ => Err(Self::unknown_type(id)),
        }
    }

    /// Adopt an existing object by identifier (pass-through, then read)
    pub async fn import_resource(&self, id: &ResourceId, identifier: &str) -> ProviderResult<State> {
        match find_resource_type(&id.resource_type) {
            Some(resource_type) if resource_type.supports_import() => {
                self.read_resource(id, Some(identifier)).await
            }
            Some(_) => Err(ProviderError::new(format!(
                "Import not supported for {}",
                id.resource_type
            ))
            .for_resource(id.clone())),
            None => Err(Self::unknown_type(id)),
        }
    }
}
