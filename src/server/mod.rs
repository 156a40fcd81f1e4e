// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! REST API to query entity states and to control entities.

use std::str::FromStr;

use actix::Addr;
use actix_web::{HttpRequest, HttpResponse, get, put, web};
use log::debug;

use crate::controller::{CallEntityCommand, Controller, GetEntities, GetEntityState};
use crate::errors::ServiceError;
use web_model::CommandRequest;

pub use web_model::json_error_handler;

pub mod web_model;

/// Optional access token required in the `auth-token` request header.
#[derive(Clone, Default)]
pub struct ApiToken(pub Option<String>);

/// Register all REST API services.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(get_entities)
        .service(get_entity)
        .service(entity_command);
}

#[get("/api/entities")]
async fn get_entities(
    request: HttpRequest,
    token: web::Data<ApiToken>,
    controller: web::Data<Addr<Controller>>,
) -> Result<HttpResponse, ServiceError> {
    authenticate(&request, &token)?;

    let entities = controller.send(GetEntities).await?;
    Ok(HttpResponse::Ok().json(entities))
}

#[get("/api/entities/{entity_id}")]
async fn get_entity(
    request: HttpRequest,
    path: web::Path<String>,
    token: web::Data<ApiToken>,
    controller: web::Data<Addr<Controller>>,
) -> Result<HttpResponse, ServiceError> {
    authenticate(&request, &token)?;

    let state = controller
        .send(GetEntityState::new(path.into_inner()))
        .await??;
    Ok(HttpResponse::Ok().json(state))
}

/// Execute an entity command and return the new entity state.
#[put("/api/entities/{entity_id}/command")]
async fn entity_command(
    request: HttpRequest,
    path: web::Path<String>,
    body: web::Json<CommandRequest>,
    token: web::Data<ApiToken>,
    controller: web::Data<Addr<Controller>>,
) -> Result<HttpResponse, ServiceError> {
    authenticate(&request, &token)?;

    let entity_id = path.into_inner();
    let cmd = cmd_from_str(&body.cmd_id)?;
    debug!("[{entity_id}] REST command: {cmd}");

    controller
        .send(CallEntityCommand::new(entity_id.clone(), cmd))
        .await??;
    let state = controller.send(GetEntityState::new(entity_id)).await??;
    Ok(HttpResponse::Ok().json(state))
}

fn authenticate(request: &HttpRequest, token: &ApiToken) -> Result<(), ServiceError> {
    let Some(expected) = token.0.as_deref() else {
        return Ok(());
    };

    let auth_token = request
        .headers()
        .get("auth-token")
        .and_then(|v| v.to_str().ok());
    if auth_token == Some(expected) {
        Ok(())
    } else {
        Err(ServiceError::AuthenticationFailed)
    }
}

pub fn cmd_from_str<T: FromStr + strum::VariantNames>(cmd: &str) -> Result<T, ServiceError> {
    T::from_str(cmd).map_err(|_| {
        ServiceError::BadRequest(format!(
            "Invalid cmd_id: {cmd}. Valid commands: {}",
            T::VARIANTS.join(",")
        ))
    })
}
