//! IdP FusionAuth Provider
//!
//! FusionAuth Provider implementation.
//!
//! ## Module Structure
//!
//! - `client` - API capability trait and its REST implementation
//! - `config` - Connection settings
//! - `idp_google` - Google identity provider adapter
//! - `provider` - FusionAuthProvider implementation
//! - `resources` - Resource type definitions
//! - `schemas` - Resource schemas
//! - `utils` - Conversions between JSON documents and attribute values

pub mod client;
pub mod config;
pub mod idp_google;
pub mod provider;
pub mod resources;
pub mod schemas;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main types
pub use client::{ClientError, FusionAuthClient, IdentityProviderApi};
pub use config::{ConfigError, EnvelopeParsing, FusionAuthConfig};
pub use provider::FusionAuthProvider;

use idp_core::provider::{BoxFuture, Provider, ProviderResult};
use idp_core::resource::{Resource, ResourceId, State};

use resources::resource_types;

// =============================================================================
// Provider Trait Implementation
// =============================================================================

impl Provider for FusionAuthProvider {
    fn name(&self) -> &'static str {
        "fusionauth"
    }

    fn resource_types(&self) -> Vec<Box<dyn idp_core::provider::ResourceType>> {
        resource_types()
    }

    fn read(
        &self,
        id: &ResourceId,
        identifier: Option<&str>,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.map(|s| s.to_string());
        Box::pin(async move { self.read_resource(&id, identifier.as_deref()).await })
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let resource = resource.clone();
        Box::pin(async move { self.create_resource(resource).await })
    }

    fn update(
        &self,
        id: &ResourceId,
        identifier: &str,
        _from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        let to = to.clone();
        Box::pin(async move { self.update_resource(id, &identifier, to).await })
    }

    fn delete(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<()>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        Box::pin(async move { self.delete_resource(&id, &identifier).await })
    }

    fn import(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        Box::pin(async move { self.import_resource(&id, &identifier).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use idp_core::provider::ErrorKind;
    use idp_core::resource::Value;

    use crate::testing::{Call, RecordingClient};

    fn provider(client: &Arc<RecordingClient>) -> FusionAuthProvider {
        FusionAuthProvider::with_client(client.clone(), EnvelopeParsing::Lenient)
    }

    fn google_resource() -> Resource {
        Resource::new("idp_google", "google")
            .with_attribute("button_text", "Sign in")
            .with_attribute("client_id", "abc123")
    }

    #[test]
    fn provider_name_and_types() {
        let client = Arc::new(RecordingClient::responding("{}"));
        let provider = provider(&client);
        assert_eq!(provider.name(), "fusionauth");
        let names: Vec<_> = provider.resource_types().iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["idp_google"]);
    }

    #[tokio::test]
    async fn create_through_trait_object() {
        let client = Arc::new(RecordingClient::responding(
            r#"{"identityProvider":{"id":"idp-1"}}"#,
        ));
        let provider: Box<dyn Provider> = Box::new(provider(&client));

        let state = provider.create(&google_resource()).await.unwrap();

        assert!(state.exists);
        assert_eq!(state.identifier.as_deref(), Some("idp-1"));
        assert_eq!(
            state.attributes.get("client_id"),
            Some(&Value::String("abc123".to_string()))
        );
    }

    #[tokio::test]
    async fn read_without_identifier_is_not_found() {
        let client = Arc::new(RecordingClient::responding("{}"));
        let id = ResourceId::new("idp_google", "google");

        let state = provider(&client).read(&id, None).await.unwrap();

        assert!(!state.exists);
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn import_reads_by_given_identifier() {
        let client = Arc::new(RecordingClient::responding(
            r#"{"identityProvider":{"buttonText":"Sign in","client_id":"abc123","enabled":true}}"#,
        ));
        let id = ResourceId::new("idp_google", "imported");

        let state = provider(&client).import(&id, "existing-id").await.unwrap();

        assert_eq!(client.calls(), vec![Call::Read("existing-id".to_string())]);
        assert_eq!(state.identifier.as_deref(), Some("existing-id"));
        assert_eq!(state.attributes.get("enabled"), Some(&Value::Bool(true)));
    }

    #[tokio::test]
    async fn update_and_delete_use_identifier() {
        let client = Arc::new(RecordingClient::responding(
            r#"{"identityProvider":{"id":"idp-1"}}"#,
        ));
        let provider = provider(&client);
        let resource = google_resource();
        let from = State::not_found(resource.id.clone());

        provider
            .update(&resource.id, "idp-1", &from, &resource)
            .await
            .unwrap();
        provider.delete(&resource.id, "idp-1").await.unwrap();

        let calls = client.calls();
        assert_eq!(calls.len(), 2);
        assert!(matches!(&calls[0], Call::Update(_, id) if id == "idp-1"));
        assert_eq!(calls[1], Call::Delete("idp-1".to_string()));
    }

    #[tokio::test]
    async fn unknown_resource_type_is_rejected() {
        let client = Arc::new(RecordingClient::responding("{}"));
        let resource = Resource::new("idp_facebook", "fb");

        let err = provider(&client).create(&resource).await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::Other);
        assert_eq!(
            err.to_string(),
            "[idp_facebook.fb] Unknown resource type: idp_facebook"
        );
        assert!(client.calls().is_empty());
    }

    #[test]
    fn new_rejects_invalid_host() {
        let config = FusionAuthConfig::new("::not-a-url::", "key");
        assert!(FusionAuthProvider::new(&config).is_err());
    }
}
