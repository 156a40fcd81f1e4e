// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

#![forbid(non_ascii_idents)]
#![deny(unsafe_code)]

use std::io;
use std::net::TcpListener;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use actix::{Actor, Addr};
use actix_web::{App, HttpServer, middleware, web};
use clap::{Command, arg};
use log::{error, info, warn};

use octopus_intelligent::client::{IntelligentApi, IntelligentDevice, OctopusEnergyApiClient};
use octopus_intelligent::configuration::{
    DEF_CONFIG_FILE, ENV_API_MSG_TRACING, Settings, get_configuration,
};
use octopus_intelligent::coordinator::{IntelligentSettingsCoordinator, SubscribeSettings};
use octopus_intelligent::entity::{SmartChargeSwitch, smart_charge_unique_id};
use octopus_intelligent::errors::ServiceError;
use octopus_intelligent::server::{self, ApiToken, json_error_handler};
use octopus_intelligent::util::{bool_from_env, new_http_client};
use octopus_intelligent::{APP_VERSION, Controller, GenerateEntityId, RegisterEntity, built_info};

#[actix_web::main]
async fn main() -> io::Result<()> {
    let args = Command::new(built_info::PKG_NAME)
        .version(APP_VERSION)
        .about("Octopus Energy Intelligent smart charge integration")
        .arg(arg!(-c --config <FILE> "Configuration file").required(false))
        .get_matches();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg_file = match args.get_one::<String>("config") {
        None => {
            if Path::new(DEF_CONFIG_FILE).exists() {
                info!("Loading default configuration file: {DEF_CONFIG_FILE}");
                Some(DEF_CONFIG_FILE)
            } else {
                None
            }
        }
        Some(c) => Some(c.as_str()),
    };
    let cfg = get_configuration(cfg_file).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Invalid configuration: {e}"),
        )
    })?;

    if !cfg.integration.http.enabled {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "The http listener must be enabled",
        ));
    }
    let address = format!("{}:{}", cfg.integration.interface, cfg.integration.http.port);
    let listener = TcpListener::bind(&address)?;
    println!("{} {APP_VERSION} listening on: {address}", built_info::PKG_NAME);

    let client = new_api_client(&cfg).map_err(to_io_error)?;
    let controller = Controller::default().start();

    let account_id = cfg.octopus.account_id.clone();
    let device = client
        .get_intelligent_device(&account_id)
        .await
        .map_err(|e| {
            error!("[{account_id}] Error retrieving intelligent device: {e}");
            to_io_error(e)
        })?;

    // keep the coordinator alive for the lifetime of the server
    let _coordinator = match device {
        Some(device) => Some(
            start_smart_charge(&controller, client, &cfg, &device)
                .await
                .map_err(to_io_error)?,
        ),
        None => {
            warn!("[{account_id}] No intelligent device registered, smart charge not available");
            None
        }
    };

    let token = web::Data::new(ApiToken(cfg.integration.token.clone()));
    let controller = web::Data::new(controller);

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(
                web::JsonConfig::default()
                    .limit(4 * 1024) // limit size of the payload (global configuration)
                    .error_handler(json_error_handler),
            )
            .app_data(token.clone())
            .app_data(controller.clone())
            .configure(server::configure)
    })
    .workers(1)
    .listen(listener)?
    .run()
    .await
}

fn new_api_client(cfg: &Settings) -> Result<Rc<dyn IntelligentApi>, ServiceError> {
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
    Ok(Rc::new(client))
}

/// Create the smart charge switch of the configured account and connect it to a settings
/// coordinator.
async fn start_smart_charge(
    controller: &Addr<Controller>,
    client: Rc<dyn IntelligentApi>,
    cfg: &Settings,
    device: &IntelligentDevice,
) -> Result<Addr<IntelligentSettingsCoordinator>, ServiceError> {
    let account_id = cfg.octopus.account_id.as_str();
    let entity_id = controller
        .send(GenerateEntityId::new(
            "switch.{}".into(),
            smart_charge_unique_id(account_id),
        ))
        .await?;

    let switch = SmartChargeSwitch::new(
        entity_id.clone(),
        account_id,
        client.clone(),
        Some(device),
        controller.clone().recipient(),
    )
    .start();
    controller
        .send(RegisterEntity::new(entity_id, switch.clone().recipient()))
        .await??;

    let coordinator =
        IntelligentSettingsCoordinator::new(account_id, client, cfg.intelligent.refresh_interval)
            .start();
    coordinator
        .send(SubscribeSettings(switch.recipient()))
        .await?;

    Ok(coordinator)
}

fn to_io_error(e: ServiceError) -> io::Error {
    io::Error::other(e.to_string())
}
