//! Error types for configuration, entity assembly, and field decoding.

use std::path::PathBuf;

use tessera_ecs::EcsError;

use crate::system::SystemCategory;

/// Setup-time errors. They abort the unit being configured (a pipeline's
/// init, a schedule validation, a config load) and leave it untouched.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A schedule entry names a system that was never registered.
    #[error("system '{name}' in category {category} is not registered")]
    UnknownSystem {
        name: String,
        category: SystemCategory,
    },

    /// A component name is not present in the type registry.
    #[error("component '{0}' is not registered")]
    UnknownComponent(String),

    /// Tick settings that cannot drive a fixed-step clock.
    #[error("invalid tick config: {0}")]
    InvalidTick(String),

    /// The config file could not be read.
    #[error("failed to read config '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config text is not valid JSON for the expected shape.
    #[error("malformed config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that abort the assembly of one entity.
#[derive(Debug, thiserror::Error)]
pub enum AssemblyError {
    /// A descriptor names a component type the registry does not know.
    #[error("component '{0}' is not registered")]
    UnknownComponent(String),

    /// The patched field values do not form a valid component.
    #[error("component '{component}' could not be built: {details}")]
    InvalidComponent { component: String, details: String },

    /// Two entries of one descriptor resolve to the same component type.
    #[error("component '{0}' appears more than once")]
    DuplicateComponent(String),

    /// A preset name is not present in the library.
    #[error("preset '{0}' not found")]
    UnknownPreset(String),

    /// The store rejected the entity or a component.
    #[error(transparent)]
    Ecs(#[from] EcsError),
}

/// Field decode failures. Always recovered where they occur: logged, and a
/// zero value substituted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// A vector did not have exactly the expected number of components.
    #[error("expected {expected} whitespace-separated numbers, found {found} in '{text}'")]
    WrongTokenCount {
        expected: usize,
        found: usize,
        text: String,
    },

    /// A token could not be parsed as a number.
    #[error("'{text}' is not a valid {expected}")]
    InvalidNumber { text: String, expected: &'static str },

    /// An enum field named a variant the enum does not declare.
    #[error("'{variant}' is not a variant of {enum_name}")]
    UnknownVariant { enum_name: String, variant: String },
}

/// Errors from controller startup.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// A pipeline failed to initialize.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A startup template could not be assembled.
    #[error(transparent)]
    Assembly(#[from] AssemblyError),
}
