use anyhow::Result;
use tokio::runtime::Runtime;

use gloo_trafficrouter::{
    cmd::Command,
    config::Config,
    kube::KubeClientOptions,
    logger,
    logging::Logger,
    plugin::GlooPlatformPlugin,
};

fn run() -> Result<()> {
    let cmd = Command::init();

    let mut config = Config::load(cmd.config_load_option())?;

    cmd.override_config(&mut config);

    if cmd.logging {
        Logger::init(&config.logging)?;
    }

    logger!(debug, "config {:?}", config);

    let options: KubeClientOptions = config.kube.into();

    let mut plugin = GlooPlatformPlugin::new(options.clone(), config.update_strategy);

    let rt = Runtime::new()?;

    rt.block_on(cmd.subcommand.run(&mut plugin, &options))
}

fn main() {
    if let Err(e) = run() {
        logger!(error, "{:#}", e);

        eprintln!("{:#}", e);

        std::process::exit(1);
    }
}
