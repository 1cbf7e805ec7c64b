//! Schema - Define type schemas for resources
//!
//! Providers define schemas for each resource type,
//! enabling validation and defaulting before any remote call.

use std::collections::HashMap;
use std::fmt;

use crate::resource::Value;

/// Placeholder shown instead of sensitive values
pub const SENSITIVE_PLACEHOLDER: &str = "(sensitive)";

/// Attribute type
#[derive(Debug, Clone)]
pub enum AttributeType {
    /// String
    String,
    /// Integer
    Int,
    /// Boolean
    Bool,
    /// Custom type (with validation function)
    Custom {
        name: String,
        base: Box<AttributeType>,
        validate: fn(&Value) -> Result<(), String>,
    },
    /// List
    List(Box<AttributeType>),
    /// Unordered collection; carried as `Value::List`
    Set(Box<AttributeType>),
    /// Map
    Map(Box<AttributeType>),
    /// Nested block with its own fields; carried as `Value::Map`
    Struct {
        name: String,
        fields: Vec<AttributeSchema>,
    },
}

impl AttributeType {
    /// Nested block type
    pub fn structure(name: impl Into<String>, fields: Vec<AttributeSchema>) -> Self {
        AttributeType::Struct {
            name: name.into(),
            fields,
        }
    }

    /// Check if a value conforms to this type
    pub fn validate(&self, value: &Value) -> Result<(), TypeError> {
        match (self, value) {
            (AttributeType::String, Value::String(_)) => Ok(()),
            (AttributeType::Int, Value::Int(_)) => Ok(()),
            (AttributeType::Bool, Value::Bool(_)) => Ok(()),

            (AttributeType::Custom { validate, base, .. }, v) => {
                base.validate(v)?;
                validate(v).map_err(|msg| TypeError::ValidationFailed { message: msg })
            }

            (AttributeType::List(inner) | AttributeType::Set(inner), Value::List(items)) => {
                for (i, item) in items.iter().enumerate() {
                    inner.validate(item).map_err(|e| TypeError::ListItemError {
                        index: i,
                        inner: Box::new(e),
                    })?;
                }
                Ok(())
            }

            (AttributeType::Map(inner), Value::Map(map)) => {
                for (k, v) in map {
                    inner.validate(v).map_err(|e| TypeError::MapValueError {
                        key: k.clone(),
                        inner: Box::new(e),
                    })?;
                }
                Ok(())
            }

            (AttributeType::Struct { fields, .. }, Value::Map(map)) => {
                match validate_fields(fields.iter(), map, true).into_iter().next() {
                    Some(e) => Err(e),
                    None => Ok(()),
                }
            }

            _ => Err(TypeError::TypeMismatch {
                expected: self.type_name(),
                got: value.type_name(),
            }),
        }
    }

    fn type_name(&self) -> String {
        match self {
            AttributeType::String => "String".to_string(),
            AttributeType::Int => "Int".to_string(),
            AttributeType::Bool => "Bool".to_string(),
            AttributeType::Custom { name, .. } => name.clone(),
            AttributeType::List(inner) => format!("List<{}>", inner.type_name()),
            AttributeType::Set(inner) => format!("Set<{}>", inner.type_name()),
            AttributeType::Map(inner) => format!("Map<{}>", inner.type_name()),
            AttributeType::Struct { name, .. } => name.clone(),
        }
    }

    /// Fields of the struct carried by this type, directly or as collection elements
    fn struct_fields(&self) -> Option<&[AttributeSchema]> {
        match self {
            AttributeType::Struct { fields, .. } => Some(fields),
            AttributeType::List(inner) | AttributeType::Set(inner) => inner.struct_fields(),
            _ => None,
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// Type error
#[derive(Debug, Clone, thiserror::Error)]
pub enum TypeError {
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Required attribute '{name}' is missing")]
    MissingRequired { name: String },

    #[error("Unknown attribute '{name}'")]
    UnknownAttribute { name: String },

    #[error("Attribute '{name}': {inner}")]
    AttributeError { name: String, inner: Box<TypeError> },

    #[error("List item at index {index}: {inner}")]
    ListItemError { index: usize, inner: Box<TypeError> },

    #[error("Map value for key '{key}': {inner}")]
    MapValueError { key: String, inner: Box<TypeError> },
}

impl Value {
    fn type_name(&self) -> String {
        match self {
            Value::String(_) => "String".to_string(),
            Value::Int(_) => "Int".to_string(),
            Value::Bool(_) => "Bool".to_string(),
            Value::List(_) => "List".to_string(),
            Value::Map(_) => "Map".to_string(),
        }
    }
}

/// Attribute schema
#[derive(Debug, Clone)]
pub struct AttributeSchema {
    pub name: String,
    pub attr_type: AttributeType,
    pub required: bool,
    pub default: Option<Value>,
    /// Value must never be displayed or logged
    pub sensitive: bool,
    pub description: Option<String>,
    /// Provider-side property name (e.g., "buttonText")
    pub provider_name: Option<String>,
}

impl AttributeSchema {
    pub fn new(name: impl Into<String>, attr_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            attr_type,
            required: false,
            default: None,
            sensitive: false,
            description: None,
            provider_name: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn with_provider_name(mut self, name: impl Into<String>) -> Self {
        self.provider_name = Some(name.into());
        self
    }
}

/// Resource schema
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    pub resource_type: String,
    pub attributes: HashMap<String, AttributeSchema>,
    pub description: Option<String>,
    /// Reject attributes the schema does not declare
    pub deny_unknown: bool,
}

impl ResourceSchema {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            attributes: HashMap::new(),
            description: None,
            deny_unknown: false,
        }
    }

    pub fn attribute(mut self, schema: AttributeSchema) -> Self {
        self.attributes.insert(schema.name.clone(), schema);
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn deny_unknown_attributes(mut self) -> Self {
        self.deny_unknown = true;
        self
    }

    /// Validate resource attributes
    pub fn validate(&self, attributes: &HashMap<String, Value>) -> Result<(), Vec<TypeError>> {
        let errors = validate_fields(self.attributes.values(), attributes, self.deny_unknown);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Fill in declared defaults, including inside nested blocks
    pub fn apply_defaults(&self, attributes: &mut HashMap<String, Value>) {
        apply_field_defaults(self.attributes.values(), attributes);
    }

    /// Copy of the attributes with sensitive values masked
    pub fn redact(&self, attributes: &HashMap<String, Value>) -> HashMap<String, Value> {
        redact_fields(
            |name| self.attributes.get(name),
            attributes,
        )
    }
}

fn validate_fields<'a>(
    fields: impl Iterator<Item = &'a AttributeSchema> + Clone,
    attributes: &HashMap<String, Value>,
    deny_unknown: bool,
) -> Vec<TypeError> {
    let mut errors = Vec::new();

    // Check required attributes
    for schema in fields.clone() {
        if schema.required && !attributes.contains_key(&schema.name) && schema.default.is_none() {
            errors.push(TypeError::MissingRequired {
                name: schema.name.clone(),
            });
        }
    }

    // Type check each attribute
    for (name, value) in attributes {
        match fields.clone().find(|s| &s.name == name) {
            Some(schema) => {
                if let Err(e) = schema.attr_type.validate(value) {
                    errors.push(TypeError::AttributeError {
                        name: name.clone(),
                        inner: Box::new(e),
                    });
                }
            }
            None if deny_unknown => {
                errors.push(TypeError::UnknownAttribute { name: name.clone() });
            }
            None => {}
        }
    }

    errors
}

fn apply_field_defaults<'a>(
    fields: impl Iterator<Item = &'a AttributeSchema>,
    attributes: &mut HashMap<String, Value>,
) {
    for schema in fields {
        match attributes.get_mut(&schema.name) {
            None => {
                if let Some(default) = &schema.default {
                    attributes.insert(schema.name.clone(), default.clone());
                }
            }
            Some(value) => {
                if let Some(nested) = schema.attr_type.struct_fields() {
                    apply_nested_defaults(nested, value);
                }
            }
        }
    }
}

fn apply_nested_defaults(fields: &[AttributeSchema], value: &mut Value) {
    match value {
        Value::Map(map) => apply_field_defaults(fields.iter(), map),
        Value::List(items) => {
            for item in items {
                apply_nested_defaults(fields, item);
            }
        }
        _ => {}
    }
}

fn redact_fields<'a>(
    lookup: impl Fn(&str) -> Option<&'a AttributeSchema>,
    attributes: &HashMap<String, Value>,
) -> HashMap<String, Value> {
    attributes
        .iter()
        .map(|(name, value)| {
            let redacted = match lookup(name) {
                Some(schema) if schema.sensitive => {
                    Value::String(SENSITIVE_PLACEHOLDER.to_string())
                }
                Some(schema) => match schema.attr_type.struct_fields() {
                    Some(nested) => redact_nested(nested, value),
                    None => value.clone(),
                },
                None => value.clone(),
            };
            (name.clone(), redacted)
        })
        .collect()
}

fn redact_nested(fields: &[AttributeSchema], value: &Value) -> Value {
    match value {
        Value::Map(map) => Value::Map(redact_fields(
            |name| fields.iter().find(|f| f.name == name),
            map,
        )),
        Value::List(items) => Value::List(items.iter().map(|v| redact_nested(fields, v)).collect()),
        other => other.clone(),
    }
}

/// Helper functions for common types
pub mod types {
    use super::*;

    /// UUID type in canonical hyphenated form (e.g., "11111111-1111-1111-1111-111111111111")
    pub fn uuid() -> AttributeType {
        AttributeType::Custom {
            name: "Uuid".to_string(),
            base: Box::new(AttributeType::String),
            validate: |value| {
                if let Value::String(s) = value {
                    validate_uuid(s)
                } else {
                    Err("Expected string".to_string())
                }
            },
        }
    }
}

/// Validate UUID format (8-4-4-4-12 hex digits)
pub fn validate_uuid(s: &str) -> Result<(), String> {
    // uuid also accepts simple, braced and urn forms; only the hyphenated one is valid here
    if s.len() != 36 {
        return Err(format!("Invalid UUID '{}': expected 8-4-4-4-12 format", s));
    }
    uuid::Uuid::try_parse(s)
        .map(|_| ())
        .map_err(|e| format!("Invalid UUID '{}': {}", s, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn override_type() -> AttributeType {
        AttributeType::Set(Box::new(AttributeType::structure(
            "Override",
            vec![
                AttributeSchema::new("id", types::uuid()).required(),
                AttributeSchema::new("secret", AttributeType::String).sensitive(),
                AttributeSchema::new("flag", AttributeType::Bool).with_default(Value::Bool(true)),
            ],
        )))
    }

    fn sample_schema() -> ResourceSchema {
        ResourceSchema::new("sample")
            .attribute(AttributeSchema::new("name", AttributeType::String).required())
            .attribute(AttributeSchema::new("token", AttributeType::String).sensitive())
            .attribute(
                AttributeSchema::new("enabled", AttributeType::Bool)
                    .with_default(Value::Bool(false)),
            )
            .attribute(AttributeSchema::new("overrides", override_type()))
            .deny_unknown_attributes()
    }

    fn override_item(id: &str) -> Value {
        let mut map = HashMap::new();
        map.insert("id".to_string(), Value::String(id.to_string()));
        Value::Map(map)
    }

    #[test]
    fn validate_string_type() {
        let t = AttributeType::String;
        assert!(t.validate(&Value::String("hello".to_string())).is_ok());
        assert!(t.validate(&Value::Int(42)).is_err());
    }

    #[test]
    fn validate_uuid_type() {
        let t = types::uuid();
        assert!(
            t.validate(&Value::String(
                "11111111-1111-1111-1111-111111111111".to_string()
            ))
            .is_ok()
        );
        assert!(
            t.validate(&Value::String(
                "A1B2C3D4-0000-4000-8000-00000000000F".to_string()
            ))
            .is_ok()
        );
        assert!(t.validate(&Value::String("not-a-uuid".to_string())).is_err());
        assert!(
            t.validate(&Value::String(
                "11111111111111111111111111111111".to_string()
            ))
            .is_err()
        );
        assert!(
            t.validate(&Value::String(
                "1111111-11111-1111-1111-111111111111".to_string()
            ))
            .is_err()
        );
        assert!(t.validate(&Value::Bool(true)).is_err());
    }

    #[test]
    fn validate_resource_schema() {
        let mut attrs = HashMap::new();
        attrs.insert("name".to_string(), Value::String("my-resource".to_string()));
        attrs.insert("enabled".to_string(), Value::Bool(true));
        attrs.insert(
            "overrides".to_string(),
            Value::List(vec![override_item("11111111-1111-1111-1111-111111111111")]),
        );

        assert!(sample_schema().validate(&attrs).is_ok());
    }

    #[test]
    fn missing_required_attribute() {
        let attrs = HashMap::new();
        let errors = sample_schema().validate(&attrs).unwrap_err();
        assert!(
            errors
                .iter()
                .any(|e| matches!(e, TypeError::MissingRequired { name } if name == "name"))
        );
    }

    #[test]
    fn unknown_attribute_is_rejected() {
        let mut attrs = HashMap::new();
        attrs.insert("name".to_string(), Value::String("x".to_string()));
        attrs.insert("colour".to_string(), Value::String("red".to_string()));

        let errors = sample_schema().validate(&attrs).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "Unknown attribute 'colour'");
    }

    #[test]
    fn nested_uuid_error_names_the_path() {
        let mut attrs = HashMap::new();
        attrs.insert("name".to_string(), Value::String("x".to_string()));
        attrs.insert(
            "overrides".to_string(),
            Value::List(vec![override_item("bogus")]),
        );

        let errors = sample_schema().validate(&attrs).unwrap_err();
        assert_eq!(errors.len(), 1);
        let message = errors[0].to_string();
        assert!(message.starts_with("Attribute 'overrides': List item at index 0:"));
        assert!(message.contains("Attribute 'id'"));
        assert!(message.contains("Invalid UUID 'bogus'"));
    }

    #[test]
    fn nested_required_field_is_checked() {
        let mut attrs = HashMap::new();
        attrs.insert("name".to_string(), Value::String("x".to_string()));
        attrs.insert(
            "overrides".to_string(),
            Value::List(vec![Value::Map(HashMap::new())]),
        );

        let errors = sample_schema().validate(&attrs).unwrap_err();
        assert!(errors[0].to_string().contains("Required attribute 'id' is missing"));
    }

    #[test]
    fn apply_defaults_fills_top_level_and_nested() {
        let mut attrs = HashMap::new();
        attrs.insert("name".to_string(), Value::String("x".to_string()));
        attrs.insert(
            "overrides".to_string(),
            Value::List(vec![override_item("11111111-1111-1111-1111-111111111111")]),
        );

        sample_schema().apply_defaults(&mut attrs);

        assert_eq!(attrs.get("enabled"), Some(&Value::Bool(false)));
        let items = attrs.get("overrides").and_then(Value::as_list).unwrap();
        let item = items[0].as_map().unwrap();
        assert_eq!(item.get("flag"), Some(&Value::Bool(true)));
        assert!(!item.contains_key("secret"));
    }

    #[test]
    fn apply_defaults_keeps_explicit_values() {
        let mut attrs = HashMap::new();
        attrs.insert("enabled".to_string(), Value::Bool(true));

        sample_schema().apply_defaults(&mut attrs);

        assert_eq!(attrs.get("enabled"), Some(&Value::Bool(true)));
    }

    #[test]
    fn redact_masks_sensitive_values() {
        let mut item = HashMap::new();
        item.insert(
            "id".to_string(),
            Value::String("11111111-1111-1111-1111-111111111111".to_string()),
        );
        item.insert("secret".to_string(), Value::String("hunter2".to_string()));

        let mut attrs = HashMap::new();
        attrs.insert("name".to_string(), Value::String("x".to_string()));
        attrs.insert("token".to_string(), Value::String("s3cr3t".to_string()));
        attrs.insert("overrides".to_string(), Value::List(vec![Value::Map(item)]));

        let redacted = sample_schema().redact(&attrs);

        assert_eq!(redacted.get("name"), Some(&Value::String("x".to_string())));
        assert_eq!(
            redacted.get("token"),
            Some(&Value::String(SENSITIVE_PLACEHOLDER.to_string()))
        );
        let nested = redacted.get("overrides").and_then(Value::as_list).unwrap()[0]
            .as_map()
            .unwrap();
        assert_eq!(
            nested.get("secret"),
            Some(&Value::String(SENSITIVE_PLACEHOLDER.to_string()))
        );
        assert_eq!(
            nested.get("id"),
            Some(&Value::String(
                "11111111-1111-1111-1111-111111111111".to_string()
            ))
        );
    }
}
