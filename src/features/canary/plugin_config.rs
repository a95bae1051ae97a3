use serde::{Deserialize, Serialize};

use crate::{
    error::ConfigError,
    kube::apis::{argoproj::v1alpha1::Rollout, networking::gloo::v2::DEFAULT_DESTINATION_KIND},
};

/// Key of the configuration block under `trafficRouting.plugins`.
pub const PLUGIN_NAME: &str = "solo-io/glooplatformAPI";

/// Traffic router type reported back to the rollout controller.
pub const PLUGIN_TYPE: &str = "GlooPlatformAPI";

/// Which RouteTable to operate on and how to recognise its destinations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginConfig {
    #[serde(default)]
    pub route_table_name: String,

    #[serde(default)]
    pub route_table_namespace: String,

    #[serde(default)]
    pub destination_kind: String,

    #[serde(default)]
    pub destination_namespace: String,
}

impl PluginConfig {
    /// Deserialize the block registered under [`PLUGIN_NAME`].
    ///
    /// An empty `destinationKind` falls back to `SERVICE` and an empty `destinationNamespace`
    /// falls back to the namespace of the rollout.
    pub fn from_rollout(rollout: &Rollout) -> Result<Self, ConfigError> {
        let raw = rollout
            .plugin_config(PLUGIN_NAME)
            .ok_or_else(|| ConfigError::MissingPluginConfig(PLUGIN_NAME.to_string()))?;

        let mut config: PluginConfig =
            serde_json::from_value(raw.clone()).map_err(ConfigError::Malformed)?;

        if config.route_table_name.is_empty() {
            return Err(ConfigError::MissingField("routeTableName"));
        }

        if config.route_table_namespace.is_empty() {
            return Err(ConfigError::MissingField("routeTableNamespace"));
        }

        if config.destination_kind.is_empty() {
            config.destination_kind = DEFAULT_DESTINATION_KIND.to_string();
        }

        if config.destination_namespace.is_empty() {
            if let Some(ns) = &rollout.metadata.namespace {
                config.destination_namespace = ns.to_string();
            }
        }

        Ok(config)
    }
}

/// Stable and canary service names taken from the rollout canary strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolloutServices {
    pub stable: String,
    pub canary: String,
}

impl RolloutServices {
    pub fn from_rollout(rollout: &Rollout) -> Result<Self, ConfigError> {
        let canary = rollout.canary().ok_or(ConfigError::MissingCanaryStrategy)?;

        if canary.stable_service.is_empty() {
            return Err(ConfigError::MissingService("stableService"));
        }

        if canary.canary_service.is_empty() {
            return Err(ConfigError::MissingService("canaryService"));
        }

        Ok(Self {
            stable: canary.stable_service.clone(),
            canary: canary.canary_service.clone(),
        })
    }
}
