// Copyright (c) 2023 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Actix message handler for entity commands.

use crate::controller::{CallEntityCommand, Controller};
use crate::entity::EntityCommand;
use crate::errors::ServiceError;
use actix::{Handler, ResponseFuture};
use log::info;

impl Handler<CallEntityCommand> for Controller {
    type Result = ResponseFuture<Result<(), ServiceError>>;

    /// Forward the command to the registered entity and return the entity's result.
    fn handle(&mut self, msg: CallEntityCommand, _ctx: &mut Self::Context) -> Self::Result {
        let Some(recipient) = self.entities.get(&msg.entity_id) else {
            let entity_id = msg.entity_id;
            return Box::pin(async move {
                Err(ServiceError::NotFound(format!("Unknown entity: {entity_id}")))
            });
        };

        info!("[{}] command: {}", msg.entity_id, msg.cmd);
        let request = recipient.send(EntityCommand(msg.cmd));
        Box::pin(async move { request.await? })
    }
}
