use std::path::PathBuf;

use anyhow::Result;
use async_trait::async_trait;
use kube::{
    api::{Patch, PatchParams, PostParams},
    config::{KubeConfigOptions, Kubeconfig},
    Api, Client, Config, ResourceExt as _,
};

use crate::{error::StoreError, logger};

use super::apis::networking::gloo::v2::RouteTable;

/// Field manager recorded on every write.
pub const FIELD_MANAGER: &str = "gloo-trafficrouter";

#[derive(Debug, Default, Clone)]
pub struct KubeClientOptions {
    pub kubeconfig: Option<PathBuf>,
    pub context: Option<String>,
}

#[derive(Clone)]
pub struct KubeClient {
    client: Client,
}

impl KubeClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the given kubeconfig/context, falling back to in-cluster config.
    pub async fn try_new(options: &KubeClientOptions) -> Result<Self> {
        let config = match (&options.kubeconfig, &options.context) {
            (None, None) => Config::infer().await?,
            (path, context) => {
                let kubeconfig = match path {
                    Some(path) => Kubeconfig::read_from(path)?,
                    None => Kubeconfig::read()?,
                };

                let options = KubeConfigOptions {
                    context: context.clone(),
                    ..Default::default()
                };

                Config::from_custom_kubeconfig(kubeconfig, &options).await?
            }
        };

        logger!(debug, "kube cluster url {}", config.cluster_url);

        let client = Client::try_from(config)?;

        Ok(Self::new(client))
    }

    /// Ask the api server for its version. `try_new` alone never talks to the cluster.
    pub async fn check_connection(&self) -> Result<()> {
        let info = self.client.apiserver_version().await?;

        logger!(info, "connected to kubernetes {}", info.git_version);

        Ok(())
    }

    pub fn to_client(&self) -> Client {
        self.client.clone()
    }

    fn api(&self, namespace: &str) -> Api<RouteTable> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

/// Transactional access to RouteTables.
#[async_trait]
pub trait RouteTableStore: Send + Sync {
    async fn get(&self, namespace: &str, name: &str) -> Result<RouteTable, StoreError>;

    /// Overwrite `route_table` as a whole. The resourceVersion it was read with is sent along.
    async fn replace(&self, route_table: &RouteTable) -> Result<(), StoreError>;

    /// Send a JSON patch against the object `original` was read from.
    async fn patch(
        &self,
        original: &RouteTable,
        patch: &json_patch::Patch,
    ) -> Result<(), StoreError>;
}

#[async_trait]
impl RouteTableStore for KubeClient {
    async fn get(&self, namespace: &str, name: &str) -> Result<RouteTable, StoreError> {
        logger!(debug, "get RouteTable {}.{}", namespace, name);

        self.api(namespace)
            .get(name)
            .await
            .map_err(|e| StoreError::from_kube(e, namespace, name))
    }

    async fn replace(&self, route_table: &RouteTable) -> Result<(), StoreError> {
        let namespace = route_table.namespace().unwrap_or_default();
        let name = route_table.name_any();

        logger!(debug, "replace RouteTable {}.{}", namespace, name);

        let params = PostParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..Default::default()
        };

        self.api(&namespace)
            .replace(&name, &params, route_table)
            .await
            .map(|_| ())
            .map_err(|e| StoreError::from_kube(e, &namespace, &name))
    }

    async fn patch(
        &self,
        original: &RouteTable,
        patch: &json_patch::Patch,
    ) -> Result<(), StoreError> {
        let namespace = original.namespace().unwrap_or_default();
        let name = original.name_any();

        logger!(debug, "patch RouteTable {}.{} with {:?}", namespace, name, patch);

        let params = PatchParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..Default::default()
        };

        self.api(&namespace)
            .patch(&name, &params, &Patch::Json::<()>(patch.clone()))
            .await
            .map(|_| ())
            .map_err(|e| StoreError::from_kube(e, &namespace, &name))
    }
}
