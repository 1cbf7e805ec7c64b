use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::Deserialize;

use idp_core::provider::Provider;
use idp_core::resource::{Resource, ResourceId, State, Value};
use idp_core::schema::{AttributeSchema, ResourceSchema};
use idp_provider_fusionauth::config::{ENV_API_KEY, ENV_HOST, ENV_TENANT_ID};
use idp_provider_fusionauth::resources::find_resource_type;
use idp_provider_fusionauth::utils::{
    attributes_to_json_object, json_object_to_attributes, value_to_json,
};
use idp_provider_fusionauth::{ConfigError, FusionAuthConfig, FusionAuthProvider};

const DEFAULT_RESOURCE_TYPE: &str = "idp_google";
const DEFAULT_NAME: &str = "main";

#[derive(Parser)]
#[command(name = "idpctl")]
#[command(about = "Manage FusionAuth identity providers declaratively", long_about = None)]
struct Cli {
    /// FusionAuth base URL
    #[arg(long, global = true, env = ENV_HOST)]
    host: Option<String>,

    /// FusionAuth API key
    #[arg(long, global = true, env = ENV_API_KEY, hide_env_values = true)]
    api_key: Option<String>,

    /// Tenant id sent with every request
    #[arg(long, global = true, env = ENV_TENANT_ID)]
    tenant_id: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout_seconds: Option<i64>,

    /// Fail reads whose response envelope cannot be parsed
    #[arg(long, global = true)]
    strict_envelope: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a resource file without contacting the server
    Validate {
        /// Path to resource JSON file
        file: PathBuf,
    },
    /// Show the attributes a resource type accepts
    Schema {
        #[arg(default_value = DEFAULT_RESOURCE_TYPE)]
        resource_type: String,
    },
    /// Create the resource described by a file
    Create {
        /// Path to resource JSON file
        file: PathBuf,
    },
    /// Read a resource by identifier
    Read {
        /// Service-assigned identifier
        #[arg(long)]
        id: String,
        #[arg(long, default_value = DEFAULT_RESOURCE_TYPE)]
        resource_type: String,
    },
    /// Replace a resource with the contents of a file
    Update {
        /// Path to resource JSON file
        file: PathBuf,
        /// Service-assigned identifier
        #[arg(long)]
        id: String,
    },
    /// Delete a resource by identifier
    Delete {
        /// Service-assigned identifier
        #[arg(long)]
        id: String,
        #[arg(long, default_value = DEFAULT_RESOURCE_TYPE)]
        resource_type: String,
    },
    /// Adopt an existing resource by identifier
    Import {
        /// Service-assigned identifier
        #[arg(long)]
        id: String,
        #[arg(long, default_value = DEFAULT_RESOURCE_TYPE)]
        resource_type: String,
        /// Local name for the imported resource
        #[arg(long, default_value = DEFAULT_NAME)]
        name: String,
    },
}

/// On-disk resource description
#[derive(Debug, Deserialize)]
struct ResourceFile {
    #[serde(rename = "type", default = "default_resource_type")]
    resource_type: String,
    #[serde(default = "default_name")]
    name: String,
    #[serde(default)]
    attributes: serde_json::Map<String, serde_json::Value>,
}

fn default_resource_type() -> String {
    DEFAULT_RESOURCE_TYPE.to_string()
}

fn default_name() -> String {
    DEFAULT_NAME.to_string()
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Validate { file } => run_validate(file),
        Commands::Schema { resource_type } => run_schema(resource_type),
        Commands::Create { file } => run_create(&cli, file).await,
        Commands::Read { id, resource_type } => run_read(&cli, resource_type, id).await,
        Commands::Update { file, id } => run_update(&cli, file, id).await,
        Commands::Delete { id, resource_type } => run_delete(&cli, resource_type, id).await,
        Commands::Import {
            id,
            resource_type,
            name,
        } => run_import(&cli, resource_type, name, id).await,
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

/// Provider block assembled from the connection flags
fn provider_attributes(cli: &Cli) -> HashMap<String, Value> {
    let mut attributes = HashMap::new();
    let settings = [
        ("host", &cli.host),
        ("api_key", &cli.api_key),
        ("tenant_id", &cli.tenant_id),
    ];
    for (key, value) in settings {
        if let Some(value) = value {
            attributes.insert(key.to_string(), Value::String(value.clone()));
        }
    }
    if let Some(seconds) = cli.timeout_seconds {
        attributes.insert("timeout_seconds".to_string(), Value::Int(seconds));
    }
    if cli.strict_envelope {
        attributes.insert(
            "envelope_parsing".to_string(),
            Value::String("strict".to_string()),
        );
    }
    attributes
}

fn build_provider(cli: &Cli) -> Result<FusionAuthProvider, String> {
    let config =
        FusionAuthConfig::from_attributes(&provider_attributes(cli)).map_err(|e| match e {
            ConfigError::Missing(key) if key == "host" => {
                format!("--host or {} is required", ENV_HOST)
            }
            ConfigError::Missing(key) if key == "api_key" => {
                format!("--api-key or {} is required", ENV_API_KEY)
            }
            other => other.to_string(),
        })?;

    FusionAuthProvider::new(&config).map_err(|e| e.to_string())
}

fn schema_for(resource_type: &str) -> Result<ResourceSchema, String> {
    find_resource_type(resource_type)
        .map(|t| t.schema())
        .ok_or_else(|| format!("Unknown resource type: {}", resource_type))
}

fn load_resource(path: &Path) -> Result<Resource, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    let file: ResourceFile = serde_json::from_str(&content)
        .map_err(|e| format!("Failed to parse {}: {}", path.display(), e))?;

    let attributes = json_object_to_attributes(&file.attributes)
        .map_err(|e| format!("Invalid attributes in {}: {}", path.display(), e))?;

    Ok(Resource {
        id: ResourceId::new(file.resource_type, file.name),
        attributes,
    })
}

fn validate_resource(resource: &Resource) -> Result<ResourceSchema, String> {
    let schema = schema_for(&resource.id.resource_type)?;
    if let Err(errors) = schema.validate(&resource.attributes) {
        let messages: Vec<String> = errors
            .iter()
            .map(|e| format!("{}: {}", resource.id, e))
            .collect();
        return Err(messages.join("\n"));
    }
    Ok(schema)
}

/// Pretty JSON of the state with sensitive values masked
fn render_state(state: &State, schema: &ResourceSchema) -> String {
    let mut document = serde_json::Map::new();
    document.insert(
        "type".to_string(),
        serde_json::Value::String(state.id.resource_type.clone()),
    );
    document.insert(
        "name".to_string(),
        serde_json::Value::String(state.id.name.clone()),
    );
    document.insert(
        "id".to_string(),
        state
            .identifier
            .clone()
            .map(serde_json::Value::String)
            .unwrap_or(serde_json::Value::Null),
    );
    document.insert(
        "attributes".to_string(),
        serde_json::Value::Object(attributes_to_json_object(
            &schema.redact(&state.attributes),
        )),
    );
    serde_json::to_string_pretty(&serde_json::Value::Object(document))
        .unwrap_or_else(|e| format!("<unprintable state: {}>", e))
}

fn run_validate(file: &Path) -> Result<(), String> {
    println!("{}", "Validating...".cyan());

    let mut resource = load_resource(file)?;
    let schema = validate_resource(&resource)?;
    schema.apply_defaults(&mut resource.attributes);

    println!(
        "{}",
        format!("✓ {} validated successfully.", resource.id)
            .green()
            .bold()
    );
    let state = State::existing(resource.id.clone(), resource.attributes);
    println!("{}", render_state(&state, &schema));
    Ok(())
}

fn run_schema(resource_type: &str) -> Result<(), String> {
    let schema = schema_for(resource_type)?;

    println!("{}", schema.resource_type.bold());
    if let Some(description) = &schema.description {
        println!("{}", description);
    }

    let mut attributes: Vec<_> = schema.attributes.values().collect();
    attributes.sort_by(|a, b| a.name.cmp(&b.name));
    for attribute in attributes {
        let flags = attribute_flags(attribute);
        println!(
            "  {} ({}){}",
            attribute.name.cyan(),
            attribute.attr_type,
            if flags.is_empty() {
                String::new()
            } else {
                format!(" [{}]", flags.join(", "))
            }
        );
        if let Some(description) = &attribute.description {
            println!("      {}", description.dimmed());
        }
    }
    Ok(())
}

fn attribute_flags(attribute: &AttributeSchema) -> Vec<String> {
    let mut flags = Vec::new();
    if attribute.required {
        flags.push("required".to_string());
    }
    if attribute.sensitive {
        flags.push("sensitive".to_string());
    }
    if let Some(default) = &attribute.default {
        flags.push(format!("default: {}", format_value(default)));
    }
    if let Some(provider_name) = &attribute.provider_name {
        flags.push(format!("wire: {}", provider_name));
    }
    flags
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", s),
        Value::Int(i) => i.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::List(_) | Value::Map(_) => value_to_json(value).to_string(),
    }
}

async fn run_create(cli: &Cli, file: &Path) -> Result<(), String> {
    let resource = load_resource(file)?;
    let schema = validate_resource(&resource)?;
    let provider = build_provider(cli)?;

    let state = provider
        .create(&resource)
        .await
        .map_err(|e| e.to_string())?;

    println!("  {} create {}", "✓".green(), resource.id);
    println!("{}", render_state(&state, &schema));
    Ok(())
}

async fn run_read(cli: &Cli, resource_type: &str, identifier: &str) -> Result<(), String> {
    let schema = schema_for(resource_type)?;
    let provider = build_provider(cli)?;
    let id = ResourceId::new(resource_type, DEFAULT_NAME);

    let state = provider
        .read(&id, Some(identifier))
        .await
        .map_err(|e| e.to_string())?;

    println!("{}", render_state(&state, &schema));
    Ok(())
}

async fn run_update(cli: &Cli, file: &Path, identifier: &str) -> Result<(), String> {
    let resource = load_resource(file)?;
    let schema = validate_resource(&resource)?;
    let provider = build_provider(cli)?;

    let from = State::existing(resource.id.clone(), HashMap::new()).with_identifier(identifier);
    let state = provider
        .update(&resource.id, identifier, &from, &resource)
        .await
        .map_err(|e| e.to_string())?;

    println!("  {} update {}", "✓".green(), resource.id);
    println!("{}", render_state(&state, &schema));
    Ok(())
}

async fn run_delete(cli: &Cli, resource_type: &str, identifier: &str) -> Result<(), String> {
    schema_for(resource_type)?;
    let provider = build_provider(cli)?;
    let id = ResourceId::new(resource_type, DEFAULT_NAME);

    provider
        .delete(&id, identifier)
        .await
        .map_err(|e| e.to_string())?;

    println!("  {} delete {} ({})", "✓".green(), id, identifier);
    Ok(())
}

async fn run_import(
    cli: &Cli,
    resource_type: &str,
    name: &str,
    identifier: &str,
) -> Result<(), String> {
    let schema = schema_for(resource_type)?;
    let provider = build_provider(cli)?;
    let id = ResourceId::new(resource_type, name);

    let state = provider
        .import(&id, identifier)
        .await
        .map_err(|e| e.to_string())?;

    println!("  {} import {} ({})", "✓".green(), id, identifier);
    println!("{}", render_state(&state, &schema));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn load_resource_reads_type_name_and_attributes() {
        let file = write_file(
            r#"{
                "type": "idp_google",
                "name": "google",
                "attributes": {
                    "button_text": "Sign in",
                    "client_id": "abc123",
                    "application_configuration": [
                        {"application_id": "11111111-1111-1111-1111-111111111111"}
                    ]
                }
            }"#,
        );

        let resource = load_resource(file.path()).unwrap();

        assert_eq!(resource.id, ResourceId::new("idp_google", "google"));
        assert_eq!(
            resource.attributes.get("button_text"),
            Some(&Value::String("Sign in".to_string()))
        );
        assert!(validate_resource(&resource).is_ok());
    }

    #[test]
    fn load_resource_defaults_type_and_name() {
        let file = write_file(r#"{"attributes": {"button_text": "Go"}}"#);

        let resource = load_resource(file.path()).unwrap();

        assert_eq!(resource.id, ResourceId::new("idp_google", "main"));
    }

    #[test]
    fn load_resource_rejects_fractional_numbers() {
        let file = write_file(r#"{"attributes": {"button_text": "Go", "debug": 1.5}}"#);

        let err = load_resource(file.path()).unwrap_err();

        assert!(err.contains("debug: Unsupported number 1.5"));
    }

    #[test]
    fn validate_reports_missing_client_id() {
        let file = write_file(r#"{"attributes": {"button_text": "Go"}}"#);
        let resource = load_resource(file.path()).unwrap();

        let err = validate_resource(&resource).unwrap_err();

        assert!(err.contains("idp_google.main"));
        assert!(err.contains("Required attribute 'client_id' is missing"));
    }

    #[test]
    fn render_state_masks_secrets() {
        let schema = schema_for("idp_google").unwrap();
        let mut attributes = HashMap::new();
        attributes.insert("client_id".to_string(), Value::String("abc123".to_string()));
        attributes.insert(
            "client_secret".to_string(),
            Value::String("hunter2".to_string()),
        );
        let state = State::existing(ResourceId::new("idp_google", "google"), attributes)
            .with_identifier("idp-1");

        let rendered = render_state(&state, &schema);

        assert!(rendered.contains("\"id\": \"idp-1\""));
        assert!(rendered.contains("abc123"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn unknown_resource_type_is_rejected() {
        assert!(schema_for("idp_github").is_err());
    }

    #[test]
    fn invalid_host_is_reported() {
        let cli = Cli::parse_from([
            "idpctl",
            "--host",
            "::bad::",
            "--api-key",
            "key",
            "read",
            "--id",
            "x",
        ]);

        let err = build_provider(&cli).err().unwrap();

        assert!(err.contains("Failed to build FusionAuth client"));
    }

    #[test]
    fn connection_flags_become_provider_attributes() {
        let cli = Cli::parse_from([
            "idpctl",
            "--host",
            "https://auth.example.com",
            "--api-key",
            "key",
            "--tenant-id",
            "tenant",
            "--timeout-seconds",
            "30",
            "--strict-envelope",
            "read",
            "--id",
            "x",
        ]);

        let config = FusionAuthConfig::from_attributes(&provider_attributes(&cli)).unwrap();

        assert_eq!(config.host, "https://auth.example.com");
        assert_eq!(config.api_key, "key");
        assert_eq!(config.tenant_id.as_deref(), Some("tenant"));
        assert_eq!(config.timeout, Some(std::time::Duration::from_secs(30)));
        assert_eq!(
            config.envelope_parsing,
            idp_provider_fusionauth::EnvelopeParsing::Strict
        );
        assert!(build_provider(&cli).is_ok());
    }

    #[test]
    fn non_positive_timeout_is_reported() {
        let cli = Cli::parse_from([
            "idpctl",
            "--host",
            "https://auth.example.com",
            "--api-key",
            "key",
            "--timeout-seconds",
            "0",
            "read",
            "--id",
            "x",
        ]);

        let err = build_provider(&cli).err().unwrap();

        assert_eq!(
            err,
            "invalid value for 'timeout_seconds': expected a positive integer"
        );
    }

    #[test]
    fn schema_flags_show_wire_names() {
        let schema = schema_for("idp_google").unwrap();

        let flags = attribute_flags(&schema.attributes["button_text"]);

        assert_eq!(flags, vec!["required".to_string(), "wire: buttonText".to_string()]);
    }
}
