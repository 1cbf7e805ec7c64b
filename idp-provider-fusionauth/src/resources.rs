//! Resource type definitions for the FusionAuth provider

use idp_core::provider::ResourceType;
use idp_core::schema::ResourceSchema;

use crate::schemas;

// =============================================================================
// Resource Type Definitions
// =============================================================================

macro_rules! define_resource_type {
    ($name:ident, $type_name:expr, $schema:path, importable: $importable:expr) => {
        pub struct $name;
        impl ResourceType for $name {
            fn name(&self) -> &'static str {
                $type_name
            }
            fn schema(&self) -> ResourceSchema {
                $schema()
            }
            fn supports_import(&self) -> bool {
                $importable
            }
        }
    };
}

define_resource_type!(
    GoogleIdentityProviderType,
    crate::idp_google::RESOURCE_TYPE,
    schemas::idp_google::schema,
    importable: true
);

/// Returns all resource types supported by this provider
pub fn resource_types() -> Vec<Box<dyn ResourceType>> {
    vec![Box::new(GoogleIdentityProviderType)]
}

/// Look up a resource type by name
pub fn find_resource_type(name: &str) -> Option<Box<dyn ResourceType>> {
    resource_types().into_iter().find(|t| t.name() == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idp_google_is_registered_and_importable() {
        let resource_type = find_resource_type("idp_google").unwrap();
        assert!(resource_type.supports_import());
        assert_eq!(resource_type.schema().resource_type, "fusionauth.idp_google");
    }

    #[test]
    fn unknown_type_is_absent() {
        assert!(find_resource_type("idp_facebook").is_none());
    }
}
