use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    error::Error,
    features::canary::{
        self, Outcome, PluginConfig, RolloutServices, UpdateStrategy, PLUGIN_NAME, PLUGIN_TYPE,
    },
    kube::{
        apis::argoproj::v1alpha1::{Rollout, SetHeaderRoute, SetMirrorRoute, WeightDestination},
        KubeClient, KubeClientOptions, RouteTableStore,
    },
    logger,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verified {
    Verified,
    NotVerified,
}

/// Operations the rollout controller drives a traffic router through.
#[async_trait]
pub trait TrafficRouterPlugin: Send + Sync {
    /// Connect to the cluster. Fails when the api server cannot be reached.
    async fn init(&mut self) -> Result<(), Error>;

    fn plugin_type(&self) -> &'static str;

    async fn update_hash(
        &self,
        rollout: &Rollout,
        canary_hash: &str,
        stable_hash: &str,
        additional_destinations: &[WeightDestination],
    ) -> Result<(), Error>;

    async fn set_weight(
        &self,
        rollout: &Rollout,
        desired_weight: i32,
        additional_destinations: &[WeightDestination],
    ) -> Result<(), Error>;

    async fn set_header_route(
        &self,
        rollout: &Rollout,
        header_route: &SetHeaderRoute,
    ) -> Result<(), Error>;

    async fn set_mirror_route(
        &self,
        rollout: &Rollout,
        mirror_route: &SetMirrorRoute,
    ) -> Result<(), Error>;

    async fn verify_weight(
        &self,
        rollout: &Rollout,
        desired_weight: i32,
        additional_destinations: &[WeightDestination],
    ) -> Result<Verified, Error>;

    async fn remove_managed_routes(&self, rollout: &Rollout) -> Result<(), Error>;
}

/// Gloo Platform RouteTable traffic router.
pub struct GlooPlatformPlugin {
    store: Option<Arc<dyn RouteTableStore>>,
    client_options: KubeClientOptions,
    strategy: UpdateStrategy,
}

impl GlooPlatformPlugin {
    pub fn new(client_options: KubeClientOptions, strategy: UpdateStrategy) -> Self {
        Self {
            store: None,
            client_options,
            strategy,
        }
    }

    /// Plugin bound to an already connected store; `init` becomes a no-op.
    pub fn with_store(store: Arc<dyn RouteTableStore>, strategy: UpdateStrategy) -> Self {
        Self {
            store: Some(store),
            client_options: KubeClientOptions::default(),
            strategy,
        }
    }

    /// Same as [`TrafficRouterPlugin::set_weight`] but reports whether the RouteTable was written.
    pub async fn reconcile_weight(
        &self,
        rollout: &Rollout,
        desired_weight: i32,
    ) -> Result<Outcome, Error> {
        let store = self.store.as_deref().ok_or(Error::NotInitialized)?;

        let desired_weight = u32::try_from(desired_weight)
            .ok()
            .filter(|w| *w <= 100)
            .ok_or(Error::InvalidWeight(desired_weight))?;

        let config = PluginConfig::from_rollout(rollout)?;
        let services = RolloutServices::from_rollout(rollout)?;

        canary::set_weight(
            store,
            &config,
            &services,
            desired_weight,
            self.strategy,
        )
        .await
    }
}

#[async_trait]
impl TrafficRouterPlugin for GlooPlatformPlugin {
    async fn init(&mut self) -> Result<(), Error> {
        if self.store.is_some() {
            return Ok(());
        }

        logger!(
            info,
            "PluginName: {}, update strategy: {}",
            PLUGIN_NAME,
            self.strategy
        );

        let client = KubeClient::try_new(&self.client_options)
            .await
            .map_err(Error::Init)?;

        client.check_connection().await.map_err(Error::Init)?;

        self.store = Some(Arc::new(client));

        Ok(())
    }

    fn plugin_type(&self) -> &'static str {
        PLUGIN_TYPE
    }

    async fn update_hash(
        &self,
        _rollout: &Rollout,
        _canary_hash: &str,
        _stable_hash: &str,
        _additional_destinations: &[WeightDestination],
    ) -> Result<(), Error> {
        Ok(())
    }

    async fn set_weight(
        &self,
        rollout: &Rollout,
        desired_weight: i32,
        additional_destinations: &[WeightDestination],
    ) -> Result<(), Error> {
        if !additional_destinations.is_empty() {
            logger!(
                debug,
                "ignoring {} additional destinations",
                additional_destinations.len()
            );
        }

        self.reconcile_weight(rollout, desired_weight)
            .await
            .map(|_| ())
    }

    async fn set_header_route(
        &self,
        _rollout: &Rollout,
        _header_route: &SetHeaderRoute,
    ) -> Result<(), Error> {
        Ok(())
    }

    async fn set_mirror_route(
        &self,
        _rollout: &Rollout,
        _mirror_route: &SetMirrorRoute,
    ) -> Result<(), Error> {
        Ok(())
    }

    async fn verify_weight(
        &self,
        _rollout: &Rollout,
        _desired_weight: i32,
        _additional_destinations: &[WeightDestination],
    ) -> Result<Verified, Error> {
        Ok(Verified::Verified)
    }

    async fn remove_managed_routes(&self, _rollout: &Rollout) -> Result<(), Error> {
        // canary destination は rollout 完了時に weight 0 になるので残しておく
        Ok(())
    }
}
