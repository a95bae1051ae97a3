use clap::Parser;
use std::path::PathBuf;

use crate::{
    config::{Config, ConfigLoadOption},
    features::canary::UpdateStrategy,
};

use super::SubCommand;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None, disable_help_subcommand = true)]
pub struct Command {
    /// kubeconfig path
    #[arg(short = 'C', long, global = true, display_order = 1000)]
    pub kubeconfig: Option<PathBuf>,

    /// Context
    #[arg(short, long, global = true, display_order = 1000)]
    pub context: Option<String>,

    /// How a modified RouteTable is written back
    #[arg(
        long,
        value_name = "patch|replace",
        value_enum,
        global = true,
        display_order = 1000
    )]
    pub update_strategy: Option<UpdateStrategy>,

    /// Logging
    #[arg(short = 'l', long, global = true, display_order = 1000)]
    pub logging: bool,

    /// Log file path (default: stderr)
    #[arg(long, global = true, display_order = 1000)]
    pub log_file: Option<PathBuf>,

    /// Config file path
    #[arg(long, global = true, display_order = 1000)]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub subcommand: SubCommand,
}

impl Command {
    pub fn init() -> Self {
        Self::parse()
    }

    pub fn config_load_option(&self) -> ConfigLoadOption {
        if let Some(path) = &self.config_file {
            return match path.try_exists() {
                Ok(true) => ConfigLoadOption::Path(path.clone()),
                Ok(false) => {
                    eprintln!("Config file not found: {:?}", path);

                    ConfigLoadOption::Default
                }
                Err(err) => {
                    eprintln!("Failed to check config file exists: {}", err);

                    ConfigLoadOption::Default
                }
            };
        }

        let Some(path) = xdg_config_home().map(|dir| dir.join("config.yaml")) else {
            return ConfigLoadOption::Default;
        };

        match path.try_exists() {
            Ok(true) => ConfigLoadOption::Path(path),
            Ok(false) => ConfigLoadOption::Default,
            Err(err) => {
                eprintln!("Failed to check config file exists: {}", err);

                ConfigLoadOption::Default
            }
        }
    }

    /// Command line flags take precedence over the loaded config.
    pub fn override_config(&self, config: &mut Config) {
        if let Some(kubeconfig) = &self.kubeconfig {
            config.kube.kubeconfig = Some(kubeconfig.clone());
        }

        if let Some(context) = &self.context {
            config.kube.context = Some(context.clone());
        }

        if let Some(strategy) = self.update_strategy {
            config.update_strategy = strategy;
        }

        if let Some(path) = &self.log_file {
            config.logging.path = Some(path.clone());
        }
    }
}

fn xdg_config_home() -> Option<PathBuf> {
    match std::env::var_os("XDG_CONFIG_HOME") {
        Some(dir) => Some(PathBuf::from(dir).join("gloo-trafficrouter")),
        None => dirs::home_dir().map(|home| home.join(".config").join("gloo-trafficrouter")),
    }
}
