// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Switch for turning Intelligent smart charge on and off.
//!
//! The switch state follows the polled settings of the [`IntelligentSettingsCoordinator`], unless
//! a successful local change happened after the last retrieval. In that case the locally set
//! state is kept until newer data has been polled.
//!
//! [`IntelligentSettingsCoordinator`]: crate::coordinator::IntelligentSettingsCoordinator

use std::rc::Rc;

use actix::{
    Actor, ActorFutureExt, Context, Handler, MessageResult, Recipient, ResponseActFuture,
    WrapFuture,
};
use chrono::{DateTime, SecondsFormat, Utc};
use log::{debug, info, warn};
use serde_json::{Map, Value};

use crate::client::{IntelligentApi, IntelligentDevice};
use crate::controller::EntityStateChanged;
use crate::coordinator::{IntelligentCoordinatorResult, SettingsRefreshed};
use crate::entity::{DOMAIN, DeviceInfo, EntityCommand, EntityState, GetState, SwitchCommand};
use crate::errors::ServiceError;

pub const SMART_CHARGE_ICON: &str = "mdi:ev-station";

pub struct SmartChargeSwitch {
    entity_id: String,
    account_id: String,
    client: Rc<dyn IntelligentApi>,
    device: Option<DeviceInfo>,
    /// Receiver of state updates
    state_writer: Recipient<EntityStateChanged>,
    /// Latest coordinator data
    coordinator_data: Option<IntelligentCoordinatorResult>,
    state: bool,
    /// Time of the last successful local change
    last_updated: Option<DateTime<Utc>>,
    attributes: Map<String, Value>,
}

impl SmartChargeSwitch {
    pub fn new(
        entity_id: impl Into<String>,
        account_id: impl Into<String>,
        client: Rc<dyn IntelligentApi>,
        device: Option<&IntelligentDevice>,
        state_writer: Recipient<EntityStateChanged>,
    ) -> Self {
        Self {
            entity_id: entity_id.into(),
            account_id: account_id.into(),
            client,
            device: device.map(DeviceInfo::from),
            state_writer,
            coordinator_data: None,
            state: false,
            last_updated: None,
            attributes: Map::new(),
        }
    }

    pub fn unique_id(&self) -> String {
        smart_charge_unique_id(&self.account_id)
    }

    pub fn name(&self) -> String {
        format!("Octopus Energy {} Intelligent Smart Charge", self.account_id)
    }

    pub fn extra_state_attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    /// Determines if smart charge is currently on.
    ///
    /// See [`SmartChargeSwitch::is_on_at`].
    pub fn is_on(&mut self) -> bool {
        self.is_on_at(Utc::now())
    }

    /// Determines if smart charge is on at evaluation time `now`.
    ///
    /// The cached state is returned without any changes if there is no coordinator data, or if
    /// the last local change is newer than the data retrieval. Otherwise the polled value is
    /// adopted and the `data_last_retrieved` and `last_evaluated` attributes are updated.
    pub fn is_on_at(&mut self, now: DateTime<Utc>) -> bool {
        let Some(data) = self.coordinator_data.as_ref() else {
            return self.state;
        };
        if self
            .last_updated
            .is_some_and(|updated| updated > data.last_retrieved)
        {
            return self.state;
        }

        self.attributes.insert(
            "data_last_retrieved".into(),
            Value::String(format_timestamp(data.last_retrieved)),
        );
        self.state = data.settings.smart_charge;
        self.attributes
            .insert("last_evaluated".into(), Value::String(format_timestamp(now)));

        self.state
    }

    /// Reflect a successful remote change locally.
    fn set_local_state(&mut self, on: bool, now: DateTime<Utc>) {
        self.state = on;
        self.last_updated = Some(now);
    }

    /// Evaluate the current state and publish it.
    fn write_state(&mut self) {
        let state = self.entity_state();
        if let Err(e) = self.state_writer.try_send(EntityStateChanged(state)) {
            warn!("[{}] Could not publish entity state: {e}", self.entity_id);
        }
    }

    fn entity_state(&mut self) -> EntityState {
        let on = self.is_on();
        EntityState {
            entity_id: self.entity_id.clone(),
            unique_id: self.unique_id(),
            name: self.name(),
            icon: Some(SMART_CHARGE_ICON.to_string()),
            state: if on { "on" } else { "off" }.to_string(),
            attributes: self.attributes.clone(),
            device: self.device.clone(),
        }
    }
}

/// Unique id of the smart charge switch of an account.
pub fn smart_charge_unique_id(account_id: &str) -> String {
    format!("{DOMAIN}_{account_id}_intelligent_smart_charge")
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

impl Actor for SmartChargeSwitch {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        debug!("[{}] Smart charge switch started", self.entity_id);
        self.write_state();
    }
}

impl Handler<SettingsRefreshed> for SmartChargeSwitch {
    type Result = ();

    fn handle(&mut self, msg: SettingsRefreshed, _ctx: &mut Self::Context) -> Self::Result {
        self.coordinator_data = Some(msg.0);
        self.write_state();
    }
}

impl Handler<EntityCommand> for SmartChargeSwitch {
    type Result = ResponseActFuture<Self, Result<(), ServiceError>>;

    /// Turn smart charge on or off with the Kraken API.
    ///
    /// The new state is set locally and published only after the API call succeeded. Errors are
    /// returned unchanged.
    fn handle(&mut self, msg: EntityCommand, _ctx: &mut Self::Context) -> Self::Result {
        let turn_on = match msg.0 {
            SwitchCommand::On => true,
            SwitchCommand::Off => false,
            SwitchCommand::Toggle => !self.is_on(),
        };
        info!(
            "[{}] Turning smart charge {}",
            self.entity_id,
            if turn_on { "on" } else { "off" }
        );

        let request = if turn_on {
            self.client.turn_on_smart_charge(&self.account_id)
        } else {
            self.client.turn_off_smart_charge(&self.account_id)
        };

        Box::pin(request.into_actor(self).map(move |result, act, _ctx| {
            if let Err(e) = &result {
                warn!("[{}] Changing smart charge failed: {e}", act.entity_id);
            }
            result?;
            act.set_local_state(turn_on, Utc::now());
            act.write_state();
            Ok(())
        }))
    }
}

impl Handler<GetState> for SmartChargeSwitch {
    type Result = MessageResult<GetState>;

    fn handle(&mut self, _msg: GetState, _ctx: &mut Self::Context) -> Self::Result {
        MessageResult(self.entity_state())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::IntelligentSettings;
    use crate::client::mock::MockIntelligentApi;
    use crate::controller::{Controller, GetEntityState};
    use actix::Addr;
    use chrono::TimeDelta;
    use rstest::rstest;

    const ACCOUNT: &str = "A-1234ABCD";
    const ENTITY_ID: &str = "switch.octopus_energy_a_1234abcd_intelligent_smart_charge";

    fn snapshot(
        last_retrieved: DateTime<Utc>,
        smart_charge: bool,
    ) -> IntelligentCoordinatorResult {
        IntelligentCoordinatorResult::new(
            last_retrieved,
            IntelligentSettings {
                smart_charge,
                ..Default::default()
            },
        )
    }

    fn new_switch(
        api: &Rc<MockIntelligentApi>,
        controller: &Addr<Controller>,
    ) -> SmartChargeSwitch {
        SmartChargeSwitch::new(
            ENTITY_ID,
            ACCOUNT,
            api.clone(),
            None,
            controller.clone().recipient(),
        )
    }

    #[actix::test]
    async fn identity_is_derived_from_account() {
        let api = Rc::new(MockIntelligentApi::default());
        let controller = Controller::default().start();
        let switch = new_switch(&api, &controller);

        assert_eq!(
            "octopus_energy_A-1234ABCD_intelligent_smart_charge",
            switch.unique_id()
        );
        assert_eq!(
            "Octopus Energy A-1234ABCD Intelligent Smart Charge",
            switch.name()
        );
    }

    #[actix::test]
    async fn without_coordinator_data_cached_state_is_returned() {
        let api = Rc::new(MockIntelligentApi::default());
        let controller = Controller::default().start();
        let mut switch = new_switch(&api, &controller);

        assert!(!switch.is_on());
        assert!(
            switch.extra_state_attributes().is_empty(),
            "No attributes without data"
        );
    }

    #[rstest]
    #[case(true)]
    #[case(false)]
    #[actix::test]
    async fn polled_value_is_adopted_without_local_change(#[case] smart_charge: bool) {
        let api = Rc::new(MockIntelligentApi::default());
        let controller = Controller::default().start();
        let mut switch = new_switch(&api, &controller);
        let retrieved = Utc::now() - TimeDelta::seconds(10);
        let now = Utc::now();
        switch.coordinator_data = Some(snapshot(retrieved, smart_charge));

        assert_eq!(smart_charge, switch.is_on_at(now));
        assert_eq!(
            Some(&Value::String(format_timestamp(retrieved))),
            switch.extra_state_attributes().get("data_last_retrieved")
        );
        assert_eq!(
            Some(&Value::String(format_timestamp(now))),
            switch.extra_state_attributes().get("last_evaluated")
        );
    }

    #[rstest]
    // local change newer than the poll: local state wins
    #[case(TimeDelta::seconds(5), true)]
    // poll newer than the local change: polled state wins
    #[case(TimeDelta::seconds(-5), false)]
    // equal timestamps trust the poll
    #[case(TimeDelta::zero(), false)]
    #[actix::test]
    async fn local_change_wins_until_newer_data_is_polled(
        #[case] local_change_offset: TimeDelta,
        #[case] expected: bool,
    ) {
        let api = Rc::new(MockIntelligentApi::default());
        let controller = Controller::default().start();
        let mut switch = new_switch(&api, &controller);
        let retrieved = Utc::now();
        switch.coordinator_data = Some(snapshot(retrieved, false));
        switch.set_local_state(true, retrieved + local_change_offset);

        assert_eq!(expected, switch.is_on_at(Utc::now()));
    }

    #[actix::test]
    async fn stale_data_does_not_touch_attributes() {
        let api = Rc::new(MockIntelligentApi::default());
        let controller = Controller::default().start();
        let mut switch = new_switch(&api, &controller);
        let retrieved = Utc::now() - TimeDelta::minutes(1);
        switch.coordinator_data = Some(snapshot(retrieved, false));
        switch.set_local_state(true, Utc::now());

        assert!(switch.is_on());
        assert!(switch.extra_state_attributes().is_empty());
    }

    #[rstest]
    #[case(SwitchCommand::On, false, true, "turn_on")]
    #[case(SwitchCommand::Off, true, false, "turn_off")]
    #[case(SwitchCommand::Toggle, false, true, "turn_on")]
    #[case(SwitchCommand::Toggle, true, false, "turn_off")]
    #[actix::test]
    async fn command_calls_api_and_sets_state_optimistically(
        #[case] cmd: SwitchCommand,
        #[case] polled: bool,
        #[case] expected: bool,
        #[case] operation: &str,
    ) {
        let api = Rc::new(MockIntelligentApi::default());
        let controller = Controller::default().start();
        let switch = new_switch(&api, &controller).start();
        let retrieved = Utc::now() - TimeDelta::seconds(1);
        switch
            .send(SettingsRefreshed(snapshot(retrieved, polled)))
            .await
            .unwrap();

        switch.send(EntityCommand(cmd)).await.unwrap().unwrap();

        assert_eq!(1, api.calls(operation));
        let state = switch.send(GetState).await.unwrap();
        assert_eq!(if expected { "on" } else { "off" }, state.state);

        // the locally set state was published
        let published = controller
            .send(GetEntityState::new(ENTITY_ID.to_string()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(state.state, published.state);
    }

    #[actix::test]
    async fn failed_command_propagates_error_and_keeps_state() {
        let api = Rc::new(MockIntelligentApi::default());
        *api.mutation_error.borrow_mut() =
            Some(ServiceError::ApiError("Unable to resume control".into()));
        let controller = Controller::default().start();
        let switch = new_switch(&api, &controller).start();

        let result = switch.send(EntityCommand(SwitchCommand::On)).await.unwrap();

        assert_eq!(
            Err(ServiceError::ApiError("Unable to resume control".into())),
            result
        );
        assert_eq!(1, api.calls("turn_on"));
        let state = switch.send(GetState).await.unwrap();
        assert_eq!("off", state.state);

        // no local change was recorded: a poll from before the failed command is trusted
        switch
            .send(SettingsRefreshed(snapshot(
                Utc::now() - TimeDelta::seconds(1),
                true,
            )))
            .await
            .unwrap();
        assert_eq!("on", switch.send(GetState).await.unwrap().state);
    }

    #[actix::test]
    async fn older_poll_does_not_revert_local_change() {
        let api = Rc::new(MockIntelligentApi::default());
        let controller = Controller::default().start();
        let switch = new_switch(&api, &controller).start();
        let before_change = Utc::now() - TimeDelta::seconds(1);

        switch.send(EntityCommand(SwitchCommand::On)).await.unwrap().unwrap();
        // a poll started before the change still reports the old value
        switch
            .send(SettingsRefreshed(snapshot(before_change, false)))
            .await
            .unwrap();
        assert_eq!("on", switch.send(GetState).await.unwrap().state);

        // a newer poll is trusted again
        switch
            .send(SettingsRefreshed(snapshot(
                Utc::now() + TimeDelta::seconds(1),
                false,
            )))
            .await
            .unwrap();
        assert_eq!("off", switch.send(GetState).await.unwrap().state);
    }
}
