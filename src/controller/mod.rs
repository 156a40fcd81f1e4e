// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Central controller holding the entity registry and the published entity states.

mod handler;
mod messages;

pub use messages::*;

use crate::entity::{EntityCommand, EntityState};
use actix::prelude::{Actor, Context, Recipient};
use log::debug;
use std::collections::HashMap;

#[derive(Default)]
pub struct Controller {
    /// Command recipients of registered entities
    entities: HashMap<String, Recipient<EntityCommand>>,
    /// Last published entity states
    states: HashMap<String, EntityState>,
}

impl Controller {
    /// All known entity ids: registered entities and entities which published a state.
    fn entity_ids(&self) -> impl Iterator<Item = &String> {
        self.entities
            .keys()
            .chain(self.states.keys().filter(|id| !self.entities.contains_key(*id)))
    }
}

impl Actor for Controller {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        debug!("Controller started");
    }
}
