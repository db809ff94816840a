//! Identifiers
//!
//! Every entity in ARCHCAP is keyed by an opaque string. The newtypes keep
//! a capability id from being passed where a realization id is expected.

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord,
            serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Unique identifier for a Capability
    CapabilityId
);
string_id!(
    /// Unique identifier for a CapabilityRealization
    RealizationId
);
string_id!(
    /// Identifier of the IT component (application, system) realizing a capability
    ComponentId
);
string_id!(
    /// Identifier of an organizational Business Domain
    BusinessDomainId
);
string_id!(
    /// Unique identifier for a BusinessDomainAssignment
    AssignmentId
);
