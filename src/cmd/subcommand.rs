use anyhow::Result;
use clap::Parser;

use crate::{
    kube::{
        apis::argoproj::v1alpha1::{SetHeaderRoute, SetMirrorRoute, WeightDestination},
        KubeClientOptions,
    },
    plugin::{TrafficRouterPlugin, Verified},
};

use super::args::{parse_weight_destination, RolloutArgs};

#[derive(Parser, Debug, Clone, PartialEq)]
pub enum SubCommand {
    /// Check that the RouteTable store is reachable
    Init,

    /// Print the traffic router type
    Type,

    /// Shift the canary weight of the rollout's RouteTable
    SetWeight {
        #[command(flatten)]
        rollout: RolloutArgs,

        /// Desired canary weight (0-100)
        #[arg(short, long, allow_negative_numbers = true)]
        weight: i32,

        /// Additional destination (SERVICE=WEIGHT or SERVICE:HASH=WEIGHT)
        #[arg(long = "additional-destination", value_parser = parse_weight_destination)]
        additional_destinations: Vec<WeightDestination>,
    },

    /// Verify the canary weight (always verified)
    VerifyWeight {
        #[command(flatten)]
        rollout: RolloutArgs,

        /// Desired canary weight (0-100)
        #[arg(short, long, allow_negative_numbers = true)]
        weight: i32,

        /// Additional destination (SERVICE=WEIGHT or SERVICE:HASH=WEIGHT)
        #[arg(long = "additional-destination", value_parser = parse_weight_destination)]
        additional_destinations: Vec<WeightDestination>,
    },

    /// Remove routes managed by this router (the canary destination is left at weight 0)
    RemoveManagedRoutes {
        #[command(flatten)]
        rollout: RolloutArgs,
    },

    /// Notify the router of new ReplicaSet hashes (no-op)
    UpdateHash {
        #[command(flatten)]
        rollout: RolloutArgs,

        #[arg(long, default_value = "")]
        canary_hash: String,

        #[arg(long, default_value = "")]
        stable_hash: String,
    },

    /// Header based routing (not supported, no-op)
    SetHeaderRoute {
        #[command(flatten)]
        rollout: RolloutArgs,

        #[arg(long, default_value = "")]
        name: String,
    },

    /// Traffic mirroring (not supported, no-op)
    SetMirrorRoute {
        #[command(flatten)]
        rollout: RolloutArgs,

        #[arg(long, default_value = "")]
        name: String,
    },
}

impl SubCommand {
    pub async fn run<P>(self, plugin: &mut P, options: &KubeClientOptions) -> Result<()>
    where
        P: TrafficRouterPlugin,
    {
        if matches!(self, SubCommand::Type) {
            println!("{}", plugin.plugin_type());
            return Ok(());
        }

        plugin.init().await?;

        match self {
            SubCommand::Init | SubCommand::Type => {}
            SubCommand::SetWeight {
                rollout,
                weight,
                additional_destinations,
            } => {
                let rollout = rollout.load(options).await?;

                plugin
                    .set_weight(&rollout, weight, &additional_destinations)
                    .await?;
            }
            SubCommand::VerifyWeight {
                rollout,
                weight,
                additional_destinations,
            } => {
                let rollout = rollout.load(options).await?;

                let verified = plugin
                    .verify_weight(&rollout, weight, &additional_destinations)
                    .await?;

                match verified {
                    Verified::Verified => println!("verified"),
                    Verified::NotVerified => println!("notVerified"),
                }
            }
            SubCommand::RemoveManagedRoutes { rollout } => {
                let rollout = rollout.load(options).await?;

                plugin.remove_managed_routes(&rollout).await?;
            }
            SubCommand::UpdateHash {
                rollout,
                canary_hash,
                stable_hash,
            } => {
                let rollout = rollout.load(options).await?;

                plugin
                    .update_hash(&rollout, &canary_hash, &stable_hash, &[])
                    .await?;
            }
            SubCommand::SetHeaderRoute { rollout, name } => {
                let rollout = rollout.load(options).await?;

                let header_route = SetHeaderRoute {
                    name,
                    ..Default::default()
                };

                plugin.set_header_route(&rollout, &header_route).await?;
            }
            SubCommand::SetMirrorRoute { rollout, name } => {
                let rollout = rollout.load(options).await?;

                let mirror_route = SetMirrorRoute {
                    name,
                    ..Default::default()
                };

                plugin.set_mirror_route(&rollout, &mirror_route).await?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use clap::error::ErrorKind;
    use pretty_assertions::assert_eq;

    use crate::cmd::Command;

    use super::*;

    #[test]
    fn set_weight_from_file() {
        let cmd = Command::try_parse_from([
            "gloo-trafficrouter",
            "set-weight",
            "-f",
            "rollout.yaml",
            "-w",
            "30",
            "--additional-destination",
            "preview=10",
        ])
        .unwrap();

        assert_eq!(
            cmd.subcommand,
            SubCommand::SetWeight {
                rollout: RolloutArgs {
                    rollout_file: Some("rollout.yaml".into()),
                    rollout: None,
                    namespace: None,
                },
                weight: 30,
                additional_destinations: vec![WeightDestination {
                    service_name: "preview".into(),
                    pod_template_hash: "".into(),
                    weight: 10,
                }],
            }
        );
    }

    #[test]
    fn set_weight_from_cluster() {
        let cmd = Command::try_parse_from([
            "gloo-trafficrouter",
            "set-weight",
            "-r",
            "httpbin",
            "-n",
            "apps",
            "-w",
            "-5",
        ])
        .unwrap();

        assert_eq!(
            cmd.subcommand,
            SubCommand::SetWeight {
                rollout: RolloutArgs {
                    rollout_file: None,
                    rollout: Some("httpbin".into()),
                    namespace: Some("apps".into()),
                },
                weight: -5,
                additional_destinations: vec![],
            }
        );
    }

    #[test]
    fn rollout_source_is_required() {
        let cmd = Command::try_parse_from(["gloo-trafficrouter", "set-weight", "-w", "30"]);

        assert_eq!(cmd.unwrap_err().kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn rollout_file_and_name_conflict() {
        let cmd = Command::try_parse_from([
            "gloo-trafficrouter",
            "remove-managed-routes",
            "-f",
            "rollout.yaml",
            "-r",
            "httpbin",
        ]);

        assert_eq!(cmd.unwrap_err().kind(), ErrorKind::ArgumentConflict);
    }
}
