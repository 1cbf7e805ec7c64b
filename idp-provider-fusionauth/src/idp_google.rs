//! Google identity provider resource
//!
//! Translates between the declarative `idp_google` attributes and the
//! FusionAuth `identityProvider` JSON document, and runs the four CRUD
//! exchanges against an [`IdentityProviderApi`].
//!
//! Locally, application overrides are an unordered set of records that each
//! carry an `application_id`. On the wire they are an object keyed by the
//! application id.

use std::collections::{BTreeMap, HashMap};

use idp_core::provider::{ProviderError, ProviderResult};
use idp_core::resource::{Resource, ResourceId, State, Value};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Map as JsonMap;

use crate::client::IdentityProviderApi;
use crate::config::EnvelopeParsing;
use crate::schemas::idp_google::schema;

/// Resource type name
pub const RESOURCE_TYPE: &str = "idp_google";

/// Prefix of read-path field errors
const FIELD_SCOPE: &str = "idpGoogle";

// =============================================================================
// Typed configuration
// =============================================================================

/// Identity provider settings, validated and defaulted
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GoogleIdentityProviderConfig {
    pub button_text: String,
    pub client_id: String,
    pub client_secret: Option<String>,
    pub scope: Option<String>,
    pub debug: bool,
    pub enabled: bool,
    pub lambda_reconcile_id: Option<String>,
    pub application_configuration: Vec<GoogleApplicationConfig>,
}

/// Override of the identity provider for one application
#[derive(Debug, Clone, PartialEq)]
pub struct GoogleApplicationConfig {
    pub application_id: String,
    pub button_text: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub scope: Option<String>,
    pub create_registration: bool,
    pub enabled: bool,
}

impl GoogleApplicationConfig {
    pub fn new(application_id: impl Into<String>) -> Self {
        Self {
            application_id: application_id.into(),
            button_text: None,
            client_id: None,
            client_secret: None,
            scope: None,
            create_registration: true,
            enabled: false,
        }
    }
}

impl GoogleIdentityProviderConfig {
    /// Validate the resource against the schema, apply defaults and convert
    ///
    /// Fails before any network call when a required attribute is missing,
    /// an application id is not a UUID, or an attribute is unknown.
    pub fn from_resource(resource: &Resource) -> ProviderResult<Self> {
        let schema = schema();
        if let Err(errors) = schema.validate(&resource.attributes) {
            let message = errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(ProviderError::validation(message).for_resource(resource.id.clone()));
        }

        let mut attributes = resource.attributes.clone();
        schema.apply_defaults(&mut attributes);
        Self::from_attributes(&attributes).map_err(|e| e.for_resource(resource.id.clone()))
    }

    /// Convert validated, defaulted attributes
    pub fn from_attributes(attributes: &HashMap<String, Value>) -> ProviderResult<Self> {
        let application_configuration = match attributes.get("application_configuration") {
            None => Vec::new(),
            Some(Value::List(items)) => items
                .iter()
                .map(GoogleApplicationConfig::from_value)
                .collect::<ProviderResult<Vec<_>>>()?,
            Some(_) => {
                return Err(ProviderError::validation(
                    "application_configuration must be a set of blocks",
                ));
            }
        };

        Ok(Self {
            button_text: required_string(attributes, "button_text")?,
            client_id: required_string(attributes, "client_id")?,
            client_secret: optional_string(attributes, "client_secret")?,
            scope: optional_string(attributes, "scope")?,
            debug: bool_or(attributes, "debug", false)?,
            enabled: bool_or(attributes, "enabled", false)?,
            lambda_reconcile_id: optional_string(attributes, "lambda_reconcile_id")?,
            application_configuration,
        })
    }

    /// Declarative attributes; unset strings become empty strings
    pub fn to_attributes(&self) -> HashMap<String, Value> {
        let mut attributes = HashMap::new();
        attributes.insert("button_text".to_string(), string_value(Some(&self.button_text)));
        attributes.insert("client_id".to_string(), string_value(Some(&self.client_id)));
        attributes.insert(
            "client_secret".to_string(),
            string_value(self.client_secret.as_ref()),
        );
        attributes.insert("scope".to_string(), string_value(self.scope.as_ref()));
        attributes.insert("debug".to_string(), Value::Bool(self.debug));
        attributes.insert("enabled".to_string(), Value::Bool(self.enabled));
        attributes.insert(
            "lambda_reconcile_id".to_string(),
            string_value(self.lambda_reconcile_id.as_ref()),
        );
        attributes.insert(
            "application_configuration".to_string(),
            Value::List(
                self.application_configuration
                    .iter()
                    .map(GoogleApplicationConfig::to_value)
                    .collect(),
            ),
        );
        attributes
    }

    /// Build the request document sent on create and update
    pub fn to_request(&self) -> GoogleIdentityProviderRequest {
        GoogleIdentityProviderRequest {
            identity_provider: GoogleIdentityProvider {
                button_text: self.button_text.clone(),
                client_id: self.client_id.clone(),
                client_secret: self.client_secret.clone(),
                scope: self.scope.clone(),
                debug: self.debug,
                enabled: self.enabled,
                lambda_configuration: LambdaConfiguration {
                    reconcile_id: self.lambda_reconcile_id.clone(),
                },
                id: None,
                application_configuration: application_configs_to_wire(
                    &self.application_configuration,
                ),
            },
        }
    }

    /// Build from the service representation
    pub fn from_wire(provider: GoogleIdentityProvider) -> Self {
        Self {
            button_text: provider.button_text,
            client_id: provider.client_id,
            client_secret: provider.client_secret.filter(|s| !s.is_empty()),
            scope: provider.scope.filter(|s| !s.is_empty()),
            debug: provider.debug,
            enabled: provider.enabled,
            lambda_reconcile_id: provider
                .lambda_configuration
                .reconcile_id
                .filter(|s| !s.is_empty()),
            application_configuration: application_configs_from_wire(
                provider.application_configuration,
            ),
        }
    }
}

impl GoogleApplicationConfig {
    fn from_value(value: &Value) -> ProviderResult<Self> {
        let map = value.as_map().ok_or_else(|| {
            ProviderError::validation("application_configuration entries must be blocks")
        })?;

        Ok(Self {
            application_id: required_string(map, "application_id")?,
            button_text: optional_string(map, "button_text")?,
            client_id: optional_string(map, "client_id")?,
            client_secret: optional_string(map, "client_secret")?,
            scope: optional_string(map, "scope")?,
            create_registration: bool_or(map, "create_registration", true)?,
            enabled: bool_or(map, "enabled", false)?,
        })
    }

    fn to_value(&self) -> Value {
        let mut map = HashMap::new();
        map.insert(
            "application_id".to_string(),
            string_value(Some(&self.application_id)),
        );
        map.insert("button_text".to_string(), string_value(self.button_text.as_ref()));
        map.insert("client_id".to_string(), string_value(self.client_id.as_ref()));
        map.insert(
            "client_secret".to_string(),
            string_value(self.client_secret.as_ref()),
        );
        map.insert("scope".to_string(), string_value(self.scope.as_ref()));
        map.insert(
            "create_registration".to_string(),
            Value::Bool(self.create_registration),
        );
        map.insert("enabled".to_string(), Value::Bool(self.enabled));
        Value::Map(map)
    }
}

fn string_value(s: Option<&String>) -> Value {
    Value::String(s.cloned().unwrap_or_default())
}

fn required_string(attributes: &HashMap<String, Value>, key: &str) -> ProviderResult<String> {
    optional_string(attributes, key)?
        .ok_or_else(|| ProviderError::validation(format!("Required attribute '{}' is missing", key)))
}

/// Empty strings count as unset
fn optional_string(
    attributes: &HashMap<String, Value>,
    key: &str,
) -> ProviderResult<Option<String>> {
    match attributes.get(key) {
        None => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(ProviderError::validation(format!(
            "Attribute '{}' must be a string",
            key
        ))),
    }
}

fn bool_or(attributes: &HashMap<String, Value>, key: &str, default: bool) -> ProviderResult<bool> {
    match attributes.get(key) {
        None => Ok(default),
        Some(Value::Bool(b)) => Ok(*b),
        Some(_) => Err(ProviderError::validation(format!(
            "Attribute '{}' must be a boolean",
            key
        ))),
    }
}

// =============================================================================
// Wire format
// =============================================================================

/// `{"identityProvider": {...}}` envelope used for requests and responses
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GoogleIdentityProviderRequest {
    #[serde(rename = "identityProvider")]
    pub identity_provider: GoogleIdentityProvider,
}

/// FusionAuth Google identity provider object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GoogleIdentityProvider {
    #[serde(
        rename = "buttonText",
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub button_text: String,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub client_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "is_false"
    )]
    pub debug: bool,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "is_false"
    )]
    pub enabled: bool,
    #[serde(
        rename = "lambdaConfiguration",
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "LambdaConfiguration::is_empty"
    )]
    pub lambda_configuration: LambdaConfiguration,
    /// Assigned by the service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(
        rename = "applicationConfiguration",
        default,
        deserialize_with = "null_as_default"
    )]
    pub application_configuration: BTreeMap<String, GoogleApplicationConfiguration>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LambdaConfiguration {
    #[serde(rename = "reconcileId", default, skip_serializing_if = "Option::is_none")]
    pub reconcile_id: Option<String>,
}

impl LambdaConfiguration {
    fn is_empty(&self) -> bool {
        self.reconcile_id.is_none()
    }
}

/// Value of one `applicationConfiguration` entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoogleApplicationConfiguration {
    #[serde(rename = "buttonText", default, skip_serializing_if = "Option::is_none")]
    pub button_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(
        rename = "createRegistration",
        default = "default_true",
        deserialize_with = "null_as_true"
    )]
    pub create_registration: bool,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "is_false"
    )]
    pub enabled: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

fn default_true() -> bool {
    true
}

/// The service may send `null` for fields it considers unset
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_true<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(true))
}

/// Key override records by application id for the wire
///
/// Records sharing an application id collapse to the last one.
pub fn application_configs_to_wire(
    configs: &[GoogleApplicationConfig],
) -> BTreeMap<String, GoogleApplicationConfiguration> {
    configs
        .iter()
        .map(|c| {
            (
                c.application_id.clone(),
                GoogleApplicationConfiguration {
                    button_text: c.button_text.clone(),
                    client_id: c.client_id.clone(),
                    client_secret: c.client_secret.clone(),
                    scope: c.scope.clone(),
                    create_registration: c.create_registration,
                    enabled: c.enabled,
                },
            )
        })
        .collect()
}

/// Turn the wire map back into records, moving each key into `application_id`
pub fn application_configs_from_wire(
    configs: BTreeMap<String, GoogleApplicationConfiguration>,
) -> Vec<GoogleApplicationConfig> {
    configs
        .into_iter()
        .map(|(application_id, c)| GoogleApplicationConfig {
            application_id,
            button_text: c.button_text.filter(|s| !s.is_empty()),
            client_id: c.client_id.filter(|s| !s.is_empty()),
            client_secret: c.client_secret.filter(|s| !s.is_empty()),
            scope: c.scope.filter(|s| !s.is_empty()),
            create_registration: c.create_registration,
            enabled: c.enabled,
        })
        .collect()
}

// =============================================================================
// Response parsing
// =============================================================================

/// Parse a create/update response and return the service-assigned id
///
/// Only the id is read; other response fields never fail a completed write.
fn response_identifier(body: &[u8]) -> ProviderResult<Option<String>> {
    let response: serde_json::Value = serde_json::from_slice(body).map_err(|e| {
        ProviderError::deserialization(format!("Failed to parse identity provider response: {}", e))
            .with_cause(e)
    })?;
    Ok(response
        .get("identityProvider")
        .and_then(|provider| provider.get("id"))
        .and_then(serde_json::Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_string))
}

/// Extract the `identityProvider` object from a read response
fn read_envelope(
    body: &[u8],
    envelope: EnvelopeParsing,
) -> ProviderResult<JsonMap<String, serde_json::Value>> {
    let parsed = serde_json::from_slice::<serde_json::Value>(body)
        .map_err(|e| e.to_string())
        .and_then(|value| match value {
            serde_json::Value::Object(mut root) => match root.remove("identityProvider") {
                Some(serde_json::Value::Object(inner)) => Ok(inner),
                Some(_) => Err("'identityProvider' is not an object".to_string()),
                None => Err("missing 'identityProvider'".to_string()),
            },
            _ => Err("response is not a JSON object".to_string()),
        });

    match (parsed, envelope) {
        (Ok(inner), _) => Ok(inner),
        (Err(message), EnvelopeParsing::Lenient) => {
            warn!("Ignoring malformed identity provider response: {}", message);
            Ok(JsonMap::new())
        }
        (Err(message), EnvelopeParsing::Strict) => Err(ProviderError::deserialization(format!(
            "Failed to parse identity provider response: {}",
            message
        ))),
    }
}

/// Decode one field; absent and null fields take the type's default
fn field<T: DeserializeOwned + Default>(
    object: &JsonMap<String, serde_json::Value>,
    wire_name: &str,
    field_name: &str,
) -> ProviderResult<T> {
    match object.get(wire_name) {
        None | Some(serde_json::Value::Null) => Ok(T::default()),
        Some(value) => T::deserialize(value).map_err(|e| ProviderError::field(FIELD_SCOPE, field_name, e)),
    }
}

/// Decode the identity provider field by field so a failure names its field
pub fn parse_identity_provider(
    object: &JsonMap<String, serde_json::Value>,
) -> ProviderResult<GoogleIdentityProvider> {
    Ok(GoogleIdentityProvider {
        button_text: field(object, "buttonText", "button_text")?,
        debug: field(object, "debug", "debug")?,
        enabled: field(object, "enabled", "enabled")?,
        lambda_configuration: field(object, "lambdaConfiguration", "lambda_reconcile_id")?,
        client_id: field(object, "client_id", "client_id")?,
        client_secret: field(object, "client_secret", "client_secret")?,
        scope: field(object, "scope", "scope")?,
        id: field(object, "id", "id")?,
        application_configuration: field(
            object,
            "applicationConfiguration",
            "application_configuration",
        )?,
    })
}

// =============================================================================
// Operations
// =============================================================================

fn encode(config: &GoogleIdentityProviderConfig) -> ProviderResult<Vec<u8>> {
    serde_json::to_vec(&config.to_request()).map_err(|e| {
        ProviderError::serialization(format!("Failed to encode identity provider: {}", e))
            .with_cause(e)
    })
}

/// Create the identity provider and record the service-assigned identifier
pub async fn create(
    client: &dyn IdentityProviderApi,
    resource: &Resource,
) -> ProviderResult<State> {
    let config = GoogleIdentityProviderConfig::from_resource(resource)?;
    let body = encode(&config).map_err(|e| e.for_resource(resource.id.clone()))?;

    debug!("Creating Google identity provider {}", resource.id);
    let response = client.create_identity_provider(body).await.map_err(|e| {
        ProviderError::transport(format!("Failed to create identity provider: {}", e))
            .with_cause(e)
            .for_resource(resource.id.clone())
    })?;

    let identifier = response_identifier(&response)
        .map_err(|e| e.for_resource(resource.id.clone()))?
        .ok_or_else(|| {
            ProviderError::deserialization("Identity provider response did not include an id")
                .for_resource(resource.id.clone())
        })?;

    Ok(State::existing(resource.id.clone(), config.to_attributes()).with_identifier(identifier))
}

/// Read the identity provider and populate every declarative attribute
pub async fn read(
    client: &dyn IdentityProviderApi,
    id: &ResourceId,
    identifier: &str,
    envelope: EnvelopeParsing,
) -> ProviderResult<State> {
    debug!("Reading Google identity provider {} ({})", id, identifier);
    let response = client.read_identity_provider(identifier).await.map_err(|e| {
        ProviderError::transport(format!("Failed to read identity provider: {}", e))
            .with_cause(e)
            .for_resource(id.clone())
    })?;

    let object = read_envelope(&response, envelope).map_err(|e| e.for_resource(id.clone()))?;
    let provider = parse_identity_provider(&object).map_err(|e| e.for_resource(id.clone()))?;
    let config = GoogleIdentityProviderConfig::from_wire(provider);

    Ok(State::existing(id.clone(), config.to_attributes()).with_identifier(identifier))
}

/// Replace the identity provider stored under `identifier`
pub async fn update(
    client: &dyn IdentityProviderApi,
    identifier: &str,
    resource: &Resource,
) -> ProviderResult<State> {
    let config = GoogleIdentityProviderConfig::from_resource(resource)?;
    let body = encode(&config).map_err(|e| e.for_resource(resource.id.clone()))?;

    debug!(
        "Updating Google identity provider {} ({})",
        resource.id, identifier
    );
    let response = client
        .update_identity_provider(body, identifier)
        .await
        .map_err(|e| {
            ProviderError::transport(format!("Failed to update identity provider: {}", e))
                .with_cause(e)
                .for_resource(resource.id.clone())
        })?;

    let identifier = match response_identifier(&response)
        .map_err(|e| e.for_resource(resource.id.clone()))?
    {
        Some(new_identifier) => new_identifier,
        None => {
            debug!("Update response had no id, keeping {}", identifier);
            identifier.to_string()
        }
    };

    Ok(State::existing(resource.id.clone(), config.to_attributes()).with_identifier(identifier))
}

/// Delete the identity provider stored under `identifier`
pub async fn delete(
    client: &dyn IdentityProviderApi,
    id: &ResourceId,
    identifier: &str,
) -> ProviderResult<()> {
    debug!("Deleting Google identity provider {} ({})", id, identifier);
    client.delete_identity_provider(identifier).await.map_err(|e| {
        ProviderError::transport(format!("Failed to delete identity provider: {}", e))
            .with_cause(e)
            .for_resource(id.clone())
    })
}
