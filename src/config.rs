use std::path::PathBuf;

use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::{features::canary::UpdateStrategy, kube::KubeClientOptions};

pub const ENV_PREFIX: &str = "GLOO_TRAFFICROUTER_";

#[derive(Debug, Default)]
pub enum ConfigLoadOption {
    #[default]
    Default,

    Path(PathBuf),
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct KubeConfig {
    pub kubeconfig: Option<PathBuf>,
    pub context: Option<String>,
}

impl From<KubeConfig> for KubeClientOptions {
    fn from(config: KubeConfig) -> Self {
        Self {
            kubeconfig: config.kubeconfig,
            context: config.context,
        }
    }
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// 指定がなければ stderr に出力する
    pub path: Option<PathBuf>,
    pub level: Option<String>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub update_strategy: UpdateStrategy,
    #[serde(default)]
    pub kube: KubeConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn load(option: ConfigLoadOption) -> Result<Self> {
        Ok(Self::figment(option).extract()?)
    }

    fn figment(option: ConfigLoadOption) -> Figment {
        let figment = Figment::new().merge(Serialized::defaults(Self::default()));

        match option {
            ConfigLoadOption::Default => figment,
            ConfigLoadOption::Path(path) => figment.merge(Yaml::file(path)),
        }
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }
}
