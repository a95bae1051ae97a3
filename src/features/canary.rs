mod emitter;
mod matcher;
mod plugin_config;
mod reconciler;

pub use emitter::{compute_change, diff, Change, UpdateStrategy};
pub use matcher::{find_route_match, DestinationFilter, RouteMatch};
pub use plugin_config::{PluginConfig, RolloutServices, PLUGIN_NAME, PLUGIN_TYPE};
pub use reconciler::{apply_weight, WeightSplit};

use kube::ResourceExt as _;

use crate::{error::Error, kube::RouteTableStore, logger};

/// What a reconciliation did to the stored RouteTable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Unchanged,
    Patched,
    Replaced,
}

/// Fetch the configured RouteTable, shift `desired_weight` to the canary and write the result.
///
/// Nothing is written when the RouteTable already carries the requested weights.
pub async fn set_weight<S>(
    store: &S,
    config: &PluginConfig,
    services: &RolloutServices,
    desired_weight: u32,
    strategy: UpdateStrategy,
) -> Result<Outcome, Error>
where
    S: RouteTableStore + ?Sized,
{
    let original = store
        .get(&config.route_table_namespace, &config.route_table_name)
        .await?;

    logger!(
        debug,
        "found RT {}.{}",
        original.namespace().unwrap_or_default(),
        original.name_any()
    );

    let found = find_route_match(&original, config, services)?;

    let mut modified = original.clone();

    let split = apply_weight(&mut modified, found, desired_weight, &services.canary);

    logger!(
        debug,
        "attempting to set stable={}, canary={}",
        split.stable,
        split.canary
    );

    match compute_change(&original, &modified, found, strategy)? {
        Change::Unchanged => {
            logger!(
                debug,
                "not updating rt {}.{} because it already has the desired weights",
                config.route_table_namespace,
                config.route_table_name
            );

            Ok(Outcome::Unchanged)
        }
        Change::Patch(patch) => {
            store.patch(&original, &patch).await.inspect_err(|e| {
                logger!(error, "failed to patch RouteTable: {}", e);
            })?;

            Ok(Outcome::Patched)
        }
        Change::Replace(route_table) => {
            store.replace(&route_table).await.inspect_err(|e| {
                logger!(error, "failed to update RouteTable: {}", e);
            })?;

            Ok(Outcome::Replaced)
        }
    }
}
