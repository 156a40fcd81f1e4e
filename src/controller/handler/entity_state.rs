// Copyright (c) 2023 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Actix message handler for entity state events and queries.

use crate::controller::{Controller, EntityStateChanged, GetEntities, GetEntityState};
use crate::entity::EntityState;
use crate::errors::ServiceError;
use actix::{Handler, MessageResult};
use log::{debug, info};

impl Handler<EntityStateChanged> for Controller {
    type Result = ();

    fn handle(&mut self, msg: EntityStateChanged, _ctx: &mut Self::Context) -> Self::Result {
        let new_state = msg.0;
        match self.states.get(&new_state.entity_id) {
            Some(old) if old.state == new_state.state => {
                debug!("[{}] state: {}", new_state.entity_id, new_state.state);
            }
            _ => info!("[{}] state changed: {}", new_state.entity_id, new_state.state),
        }
        self.states.insert(new_state.entity_id.clone(), new_state);
    }
}

impl Handler<GetEntityState> for Controller {
    type Result = Result<EntityState, ServiceError>;

    fn handle(&mut self, msg: GetEntityState, _ctx: &mut Self::Context) -> Self::Result {
        self.states
            .get(&msg.entity_id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("Unknown entity: {}", msg.entity_id)))
    }
}

impl Handler<GetEntities> for Controller {
    type Result = MessageResult<GetEntities>;

    fn handle(&mut self, _msg: GetEntities, _ctx: &mut Self::Context) -> Self::Result {
        let mut entities: Vec<EntityState> = self.states.values().cloned().collect();
        entities.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));
        MessageResult(entities)
    }
}

#[cfg(test)]
mod tests {
    use crate::controller::{Controller, EntityStateChanged, GetEntities, GetEntityState};
    use crate::entity::EntityState;
    use crate::errors::ServiceError;
    use actix::Actor;
    use serde_json::Map;

    fn new_state(entity_id: &str, state: &str) -> EntityState {
        EntityState {
            entity_id: entity_id.into(),
            unique_id: entity_id.replace('.', "_"),
            name: entity_id.into(),
            icon: None,
            state: state.into(),
            attributes: Map::new(),
            device: None,
        }
    }

    #[actix::test]
    async fn latest_published_state_is_returned() {
        let controller = Controller::default().start();
        controller
            .send(EntityStateChanged(new_state("switch.a", "off")))
            .await
            .unwrap();
        controller
            .send(EntityStateChanged(new_state("switch.a", "on")))
            .await
            .unwrap();

        let state = controller
            .send(GetEntityState::new("switch.a".into()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!("on", state.state);
    }

    #[actix::test]
    async fn unknown_entity_is_not_found() {
        let controller = Controller::default().start();
        let result = controller
            .send(GetEntityState::new("switch.unknown".into()))
            .await
            .unwrap();
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }

    #[actix::test]
    async fn entities_are_sorted_by_entity_id() {
        let controller = Controller::default().start();
        for id in ["switch.b", "switch.c", "switch.a"] {
            controller
                .send(EntityStateChanged(new_state(id, "off")))
                .await
                .unwrap();
        }

        let entities = controller.send(GetEntities).await.unwrap();
        let ids: Vec<&str> = entities.iter().map(|e| e.entity_id.as_str()).collect();
        assert_eq!(vec!["switch.a", "switch.b", "switch.c"], ids);
    }
}
