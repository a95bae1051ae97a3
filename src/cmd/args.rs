use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context as _, Result};
use clap::Args;
use kube::Api;

use crate::kube::{
    apis::argoproj::v1alpha1::{Rollout, WeightDestination},
    KubeClient, KubeClientOptions,
};

/// Where the Rollout descriptor comes from.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct RolloutArgs {
    /// Rollout manifest file (yaml or json)
    #[arg(short = 'f', long, value_name = "FILE", conflicts_with = "rollout")]
    pub rollout_file: Option<PathBuf>,

    /// Rollout name to fetch from the cluster
    #[arg(short, long, required_unless_present = "rollout_file")]
    pub rollout: Option<String>,

    /// Namespace of the rollout (default: namespace of the current context)
    #[arg(short, long, requires = "rollout")]
    pub namespace: Option<String>,
}

impl RolloutArgs {
    pub async fn load(&self, options: &KubeClientOptions) -> Result<Rollout> {
        if let Some(path) = &self.rollout_file {
            return read_rollout_file(path);
        }

        let name = self
            .rollout
            .as_deref()
            .ok_or_else(|| anyhow!("either --rollout-file or --rollout is required"))?;

        let client = KubeClient::try_new(options).await?.to_client();

        let api: Api<Rollout> = match &self.namespace {
            Some(ns) => Api::namespaced(client, ns),
            None => Api::default_namespaced(client),
        };

        api.get(name)
            .await
            .with_context(|| format!("Failed to get rollout {}", name))
    }
}

fn read_rollout_file(path: &Path) -> Result<Rollout> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read rollout file: {:?}", path))?;

    // yaml は json の上位互換なので両方これで読める
    serde_yaml::from_str(&text).with_context(|| format!("Failed to parse rollout file: {:?}", path))
}

/// `SERVICE=WEIGHT` or `SERVICE:HASH=WEIGHT`
pub fn parse_weight_destination(value: &str) -> Result<WeightDestination> {
    let (service, weight) = value
        .rsplit_once('=')
        .ok_or_else(|| anyhow!("expected SERVICE=WEIGHT, got {}", value))?;

    let weight: i32 = weight
        .parse()
        .with_context(|| format!("invalid weight: {}", weight))?;

    let (service_name, pod_template_hash) = match service.split_once(':') {
        Some((name, hash)) => (name, hash),
        None => (service, ""),
    };

    if service_name.is_empty() {
        return Err(anyhow!("service name is empty: {}", value));
    }

    Ok(WeightDestination {
        service_name: service_name.to_string(),
        pod_template_hash: pod_template_hash.to_string(),
        weight,
    })
}
