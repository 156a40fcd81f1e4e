// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Actix actor message definitions used to communicate with the [`Controller`].
//!
//! Entities publish their state and register their command recipient with these messages, the
//! REST server uses them to query states and to send commands.

#[allow(unused_imports)] // used for doc links
use crate::controller::Controller;
use crate::entity::{EntityCommand, EntityState, SwitchCommand};
use crate::errors::ServiceError;
use actix::prelude::{Message, Recipient};
use derive_more::Constructor;

/// Generate a unique entity id which isn't used by any registered entity.
///
/// See [`crate::entity::generate_entity_id`].
#[derive(Debug, Constructor, Message)]
#[rtype(result = "String")]
pub struct GenerateEntityId {
    /// Entity id pattern, e.g. `switch.{}`
    pub pattern: String,
    pub name: String,
}

/// Register an entity to receive commands.
///
/// Returns [`ServiceError::BadRequest`] if the entity id is already registered.
#[derive(Constructor, Message)]
#[rtype(result = "Result<(), ServiceError>")]
pub struct RegisterEntity {
    pub entity_id: String,
    pub commands: Recipient<EntityCommand>,
}

/// Entity state update event.
#[derive(Debug, Message)]
#[rtype(result = "()")]
pub struct EntityStateChanged(pub EntityState);

/// Get the last published state of an entity.
#[derive(Debug, Constructor, Message)]
#[rtype(result = "Result<EntityState, ServiceError>")]
pub struct GetEntityState {
    pub entity_id: String,
}

/// Get the last published states of all entities, ordered by entity id.
#[derive(Debug, Message)]
#[rtype(result = "Vec<EntityState>")]
pub struct GetEntities;

/// Send a command to a registered entity and wait for the result.
#[derive(Debug, Constructor, Message)]
#[rtype(result = "Result<(), ServiceError>")]
pub struct CallEntityCommand {
    pub entity_id: String,
    pub cmd: SwitchCommand,
}
