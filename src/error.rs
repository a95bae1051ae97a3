pub use anyhow::{anyhow, Result};

use thiserror::Error as TError;

#[derive(Debug, TError)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to find an http route that references stable service {service} in RouteTable {namespace}.{name}")]
    RuleNotFound {
        service: String,
        namespace: String,
        name: String,
    },

    #[error("failed to find a destination that references stable service {service} in RouteTable {namespace}.{name} in http route {route}")]
    DestinationNotFound {
        service: String,
        namespace: String,
        name: String,
        route: String,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("InvalidWeight: desired weight {0} is not within 0..=100")]
    InvalidWeight(i32),

    #[error("NotInitialized: the plugin has no RouteTable store, call init first")]
    NotInitialized,

    #[error("failed to connect to kubernetes: {0:#}")]
    Init(anyhow::Error),

    #[error("failed to serialize RouteTable: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, TError)]
pub enum ConfigError {
    #[error("ConfigError: rollout has no canary strategy")]
    MissingCanaryStrategy,

    #[error("ConfigError: rollout canary strategy has no {0}")]
    MissingService(&'static str),

    #[error("ConfigError: no traffic routing plugin configuration for {0}")]
    MissingPluginConfig(String),

    #[error("ConfigError: malformed plugin configuration: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("ConfigError: required field {0} is missing or empty")]
    MissingField(&'static str),
}

#[derive(Debug, TError)]
pub enum StoreError {
    #[error("RouteTable {namespace}.{name} not found")]
    NotFound { namespace: String, name: String },

    #[error("conflict while writing RouteTable {namespace}.{name}: {message}")]
    Conflict {
        namespace: String,
        name: String,
        message: String,
    },

    #[error("RouteTable {namespace}.{name} was rejected: {message}")]
    Invalid {
        namespace: String,
        name: String,
        message: String,
    },

    #[error(transparent)]
    Kube(#[from] kube::Error),
}

impl StoreError {
    /// Sort a kube error into the store taxonomy by its api status code.
    pub fn from_kube(err: kube::Error, namespace: &str, name: &str) -> Self {
        let kube::Error::Api(response) = &err else {
            return Self::Kube(err);
        };

        let namespace = namespace.to_string();
        let name = name.to_string();

        match response.code {
            404 => Self::NotFound { namespace, name },
            409 => Self::Conflict {
                namespace,
                name,
                message: response.message.clone(),
            },
            422 => Self::Invalid {
                namespace,
                name,
                message: response.message.clone(),
            },
            _ => Self::Kube(err),
        }
    }
}
