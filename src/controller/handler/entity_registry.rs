// Copyright (c) 2023 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Actix message handler for entity registration.

use crate::controller::{Controller, GenerateEntityId, RegisterEntity};
use crate::entity::generate_entity_id;
use crate::errors::ServiceError;
use actix::Handler;
use log::info;
use std::collections::HashSet;

impl Handler<GenerateEntityId> for Controller {
    type Result = String;

    fn handle(&mut self, msg: GenerateEntityId, _ctx: &mut Self::Context) -> Self::Result {
        let existing: HashSet<String> = self.entity_ids().cloned().collect();
        generate_entity_id(&msg.pattern, &msg.name, &existing)
    }
}

impl Handler<RegisterEntity> for Controller {
    type Result = Result<(), ServiceError>;

    fn handle(&mut self, msg: RegisterEntity, _ctx: &mut Self::Context) -> Self::Result {
        if self.entities.contains_key(&msg.entity_id) {
            return Err(ServiceError::BadRequest(format!(
                "Entity {} is already registered",
                msg.entity_id
            )));
        }

        info!("Registered entity: {}", msg.entity_id);
        self.entities.insert(msg.entity_id, msg.commands);
        Ok(())
    }
}
