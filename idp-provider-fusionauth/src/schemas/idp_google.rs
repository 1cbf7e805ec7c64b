//! Google identity provider schema definition
//!
//! Wire names follow the FusionAuth API: the identity provider itself uses
//! `buttonText` next to `client_id`/`client_secret`, and each application
//! override uses `createRegistration` next to `client_id`/`client_secret`.

use idp_core::resource::Value;
use idp_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

/// Fully qualified schema name
pub const SCHEMA_NAME: &str = "fusionauth.idp_google";

/// Per-application override block
fn application_configuration_type() -> AttributeType {
    AttributeType::Set(Box::new(AttributeType::structure(
        "ApplicationConfiguration",
        vec![
            AttributeSchema::new("application_id", types::uuid())
                .required()
                .with_description("The unique Id of the Application this override applies to."),
            AttributeSchema::new("button_text", AttributeType::String)
                .with_description(
                    "This is an optional Application specific override for the top level button text.",
                )
                .with_provider_name("buttonText"),
            AttributeSchema::new("client_id", AttributeType::String)
                .with_description(
                    "This is an optional Application specific override for the top level client id.",
                )
                .with_provider_name("client_id"),
            AttributeSchema::new("client_secret", AttributeType::String)
                .sensitive()
                .with_description(
                    "This is an optional Application specific override for the top level client secret.",
                )
                .with_provider_name("client_secret"),
            AttributeSchema::new("create_registration", AttributeType::Bool)
                .with_default(Value::Bool(true))
                .with_description(
                    "Determines if a UserRegistration is created for the User automatically when they log in to this Application through the identity provider.",
                )
                .with_provider_name("createRegistration"),
            AttributeSchema::new("enabled", AttributeType::Bool)
                .with_default(Value::Bool(false))
                .with_description(
                    "Determines if this identity provider is enabled for the Application specified by the application_id key.",
                )
                .with_provider_name("enabled"),
            AttributeSchema::new("scope", AttributeType::String)
                .with_description(
                    "This is an optional Application specific override for the top level scope.",
                )
                .with_provider_name("scope"),
        ],
    )))
}

/// Returns the schema for idp_google
pub fn schema() -> ResourceSchema {
    ResourceSchema::new(SCHEMA_NAME)
        .with_description("Google identity provider for FusionAuth login pages.")
        .attribute(
            AttributeSchema::new("application_configuration", application_configuration_type())
                .with_description(
                    "The configuration for each Application that the identity provider is enabled for.",
                )
                .with_provider_name("applicationConfiguration"),
        )
        .attribute(
            AttributeSchema::new("button_text", AttributeType::String)
                .required()
                .with_description(
                    "The top-level button text to use on the FusionAuth login page for this Identity Provider.",
                )
                .with_provider_name("buttonText"),
        )
        .attribute(
            AttributeSchema::new("client_id", AttributeType::String)
                .required()
                .with_description("The top-level Google client id for your Application.")
                .with_provider_name("client_id"),
        )
        .attribute(
            AttributeSchema::new("client_secret", AttributeType::String)
                .sensitive()
                .with_description(
                    "The top-level client secret to use with the Google Identity Provider when retrieving the long-lived token.",
                )
                .with_provider_name("client_secret"),
        )
        .attribute(
            AttributeSchema::new("debug", AttributeType::Bool)
                .with_default(Value::Bool(false))
                .with_description(
                    "Determines if debug is enabled for this provider. When enabled, an Event Log is created each time the provider reconciles a login.",
                )
                .with_provider_name("debug"),
        )
        .attribute(
            AttributeSchema::new("enabled", AttributeType::Bool)
                .with_default(Value::Bool(false))
                .with_description(
                    "Determines if this provider is enabled. If it is false then it will be disabled globally.",
                )
                .with_provider_name("enabled"),
        )
        .attribute(
            AttributeSchema::new("lambda_reconcile_id", AttributeType::String)
                .with_description(
                    "The unique Id of the lambda used during the user reconcile process to map custom claims from the external identity provider to the FusionAuth user.",
                )
                .with_provider_name("lambdaConfiguration.reconcileId"),
        )
        .attribute(
            AttributeSchema::new("scope", AttributeType::String)
                .with_description("The top-level scope that you are requesting from Google.")
                .with_provider_name("scope"),
        )
        .deny_unknown_attributes()
}
