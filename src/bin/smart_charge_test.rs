// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Octopus Energy Kraken API smart charge test tool

use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Arg, Command};
use log::{debug, info};
use octopus_intelligent::APP_VERSION;
use octopus_intelligent::client::{IntelligentApi, OctopusEnergyApiClient};
use octopus_intelligent::configuration::{
    ENV_API_MSG_TRACING, Settings, check_api_url, get_configuration,
};
use octopus_intelligent::entity::SwitchCommand;
use octopus_intelligent::util::{bool_from_env, new_http_client};
use url::Url;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let (cfg, set) = parse_args_load_cfg()?;

    let http = new_http_client(
        Duration::from_secs(cfg.octopus.request_timeout as u64),
        cfg.octopus.api_url.scheme() == "https",
    )?;
    let client = OctopusEnergyApiClient::new(
        http,
        &cfg.octopus.api_url,
        cfg.octopus.get_api_key(),
        bool_from_env(ENV_API_MSG_TRACING),
    )?;
    let account_id = cfg.octopus.account_id.as_str();

    match client.get_intelligent_device(account_id).await? {
        Some(device) => println!("Intelligent device: {device:#?}"),
        None => bail!("No intelligent device registered for account {account_id}"),
    }

    if let Some(cmd) = set {
        info!("Setting smart charge: {cmd}");
        match cmd {
            SwitchCommand::On => client.turn_on_smart_charge(account_id).await?,
            SwitchCommand::Off => client.turn_off_smart_charge(account_id).await?,
            SwitchCommand::Toggle => {
                let settings = client.get_intelligent_settings(account_id).await?;
                if settings.smart_charge {
                    client.turn_off_smart_charge(account_id).await?
                } else {
                    client.turn_on_smart_charge(account_id).await?
                }
            }
        }
    }

    let settings = client.get_intelligent_settings(account_id).await?;
    println!("Intelligent settings: {settings:#?}");

    Ok(())
}

fn parse_args_load_cfg() -> anyhow::Result<(Settings, Option<SwitchCommand>)> {
    let args = Command::new("smart-charge-test")
        .version(APP_VERSION)
        .about("Octopus Energy Intelligent smart charge API test")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("Configuration file"),
        )
        .arg(
            Arg::new("url")
                .short('u')
                .help("Octopus Energy API base URL (overrides configuration)"),
        )
        .arg(
            Arg::new("api_key")
                .short('k')
                .help("API key (overrides configuration)"),
        )
        .arg(
            Arg::new("set")
                .short('s')
                .long("set")
                .help("Change smart charge: on, off or toggle"),
        )
        .get_matches();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();

    let cfg_file = args.get_one::<String>("config").map(|s| s.as_str());
    // account number is also accepted from the `OE_OCTOPUS__ACCOUNT_ID` environment variable
    let mut cfg = get_configuration(cfg_file)?;

    if let Some(url) = args.get_one::<String>("url") {
        let api_url = Url::parse(url).context("Invalid API url")?;
        check_api_url(&api_url)?;
        cfg.octopus.api_url = api_url;
    }
    if let Some(api_key) = args.get_one::<String>("api_key") {
        cfg.octopus.set_api_key(api_key);
    }
    debug!("Using API: {}", cfg.octopus.api_url);

    let set = match args.get_one::<String>("set") {
        Some(cmd) => Some(SwitchCommand::from_str(cmd).context("Invalid --set value")?),
        None => None,
    };

    Ok((cfg, set))
}
