use crate::{
    error::Error,
    kube::apis::networking::gloo::v2::{DestinationReference, HttpRoute, RouteTable},
    logger,
};

use super::plugin_config::{PluginConfig, RolloutServices};

/// Position of the stable/canary pair inside `RouteTable.spec.http`.
///
/// Indices instead of references so that the reconciler can take a `&mut` on the same table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteMatch {
    pub route: usize,
    pub stable: usize,
    pub canary: Option<usize>,
}

/// Destination filter built from the plugin config and the rollout services.
///
/// Every comparison ignores ASCII case.
#[derive(Debug, Clone, Copy)]
pub struct DestinationFilter<'a> {
    kind: &'a str,
    namespace: &'a str,
    stable: &'a str,
    canary: &'a str,
}

impl<'a> DestinationFilter<'a> {
    pub fn new(config: &'a PluginConfig, services: &'a RolloutServices) -> Self {
        Self {
            kind: &config.destination_kind,
            namespace: &config.destination_namespace,
            stable: &services.stable,
            canary: &services.canary,
        }
    }

    fn references(&self, dest: &DestinationReference, service: &str) -> bool {
        let Some(reference) = &dest.reference else {
            return false;
        };

        // kubernetes の名前も Gloo の kind も ASCII なので Unicode の case folding は不要
        dest.kind().eq_ignore_ascii_case(self.kind)
            && reference
                .namespace
                .as_deref()
                .unwrap_or_default()
                .eq_ignore_ascii_case(self.namespace)
            && reference.name.eq_ignore_ascii_case(service)
    }

    pub fn is_stable(&self, dest: &DestinationReference) -> bool {
        self.references(dest, self.stable)
    }

    /// A destination that already matched as stable never counts as canary.
    pub fn is_canary(&self, dest: &DestinationReference) -> bool {
        !self.is_stable(dest) && self.references(dest, self.canary)
    }
}

/// First route (in order) that forwards to the stable service.
pub fn find_stable_route(routes: &[HttpRoute], filter: &DestinationFilter) -> Option<usize> {
    routes
        .iter()
        .position(|route| route.destinations().iter().any(|d| filter.is_stable(d)))
}

/// Stable and canary destination indices within one route.
///
/// When several destinations match, the last one scanned is kept.
pub fn find_destinations(
    route: &HttpRoute,
    filter: &DestinationFilter,
) -> (Option<usize>, Option<usize>) {
    let mut stable = None;
    let mut canary = None;

    for (i, dest) in route.destinations().iter().enumerate() {
        if filter.is_stable(dest) {
            if stable.is_some() {
                logger!(
                    warn,
                    "http route {} has more than one stable destination; using index {}",
                    route.name,
                    i
                );
            }
            stable = Some(i);
        } else if filter.is_canary(dest) {
            if canary.is_some() {
                logger!(
                    warn,
                    "http route {} has more than one canary destination; using index {}",
                    route.name,
                    i
                );
            }
            canary = Some(i);
        }
    }

    (stable, canary)
}

/// Locate the route and destinations that the weight has to be applied to.
pub fn find_route_match(
    route_table: &RouteTable,
    config: &PluginConfig,
    services: &RolloutServices,
) -> Result<RouteMatch, Error> {
    let filter = DestinationFilter::new(config, services);

    let namespace = route_table.metadata.namespace.clone().unwrap_or_default();
    let name = route_table.metadata.name.clone().unwrap_or_default();

    let Some(index) = find_stable_route(&route_table.spec.http, &filter) else {
        return Err(Error::RuleNotFound {
            service: services.stable.clone(),
            namespace,
            name,
        });
    };

    let route = &route_table.spec.http[index];

    match find_destinations(route, &filter) {
        (Some(stable), canary) => Ok(RouteMatch {
            route: index,
            stable,
            canary,
        }),
        (None, _) => Err(Error::DestinationNotFound {
            service: services.stable.clone(),
            namespace,
            name,
            route: route.name.clone(),
        }),
    }
}
