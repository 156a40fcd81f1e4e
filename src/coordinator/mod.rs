// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Polling coordinator for the Intelligent settings of an account.
//!
//! The coordinator periodically fetches the settings and pushes every successfully retrieved
//! snapshot to its subscribers. A failed refresh keeps the previous snapshot.

use std::rc::Rc;
use std::time::Duration;

use actix::{
    Actor, ActorFutureExt, AsyncContext, Context, Handler, MessageResult, Recipient,
    ResponseActFuture, WrapFuture,
};
use chrono::{DateTime, Utc};
use derive_more::Constructor;
use log::{debug, info, warn};

use crate::client::{IntelligentApi, IntelligentSettings};
use crate::errors::ServiceError;

mod messages;

pub use messages::*;

/// Settings snapshot with the time it was retrieved.
#[derive(Debug, Clone, PartialEq, Constructor)]
pub struct IntelligentCoordinatorResult {
    pub last_retrieved: DateTime<Utc>,
    pub settings: IntelligentSettings,
}

pub struct IntelligentSettingsCoordinator {
    account_id: String,
    client: Rc<dyn IntelligentApi>,
    refresh_interval: Duration,
    data: Option<IntelligentCoordinatorResult>,
    subscribers: Vec<Recipient<SettingsRefreshed>>,
}

impl IntelligentSettingsCoordinator {
    pub fn new(
        account_id: impl Into<String>,
        client: Rc<dyn IntelligentApi>,
        refresh_interval: Duration,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            client,
            refresh_interval,
            data: None,
            subscribers: Vec::new(),
        }
    }

    fn set_data(&mut self, data: IntelligentCoordinatorResult) {
        debug!(
            "[{}] Intelligent settings retrieved: smart_charge={}",
            self.account_id, data.settings.smart_charge
        );
        self.subscribers.retain(|s| s.connected());
        for subscriber in &self.subscribers {
            subscriber.do_send(SettingsRefreshed(data.clone()));
        }
        self.data = Some(data);
    }
}

impl Actor for IntelligentSettingsCoordinator {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!(
            "[{}] Intelligent settings coordinator started, refresh interval: {:?}",
            self.account_id, self.refresh_interval
        );
        ctx.notify(RefreshSettings);
        ctx.run_interval(self.refresh_interval, |_, ctx| {
            ctx.notify(RefreshSettings);
        });
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        debug!("[{}] Intelligent settings coordinator stopped", self.account_id);
    }
}

impl Handler<RefreshSettings> for IntelligentSettingsCoordinator {
    type Result = ResponseActFuture<Self, Result<(), ServiceError>>;

    fn handle(&mut self, _msg: RefreshSettings, _ctx: &mut Self::Context) -> Self::Result {
        let request = self.client.get_intelligent_settings(&self.account_id);

        Box::pin(
            request
                .into_actor(self)
                .map(|result, act, _ctx| match result {
                    Ok(settings) => {
                        act.set_data(IntelligentCoordinatorResult::new(Utc::now(), settings));
                        Ok(())
                    }
                    Err(e) => {
                        warn!(
                            "[{}] Failed to retrieve intelligent settings, keeping previous data: \
                            {e}",
                            act.account_id
                        );
                        Err(e)
                    }
                }),
        )
    }
}

impl Handler<SubscribeSettings> for IntelligentSettingsCoordinator {
    type Result = ();

    fn handle(&mut self, msg: SubscribeSettings, _ctx: &mut Self::Context) -> Self::Result {
        if let Some(data) = self.data.as_ref() {
            msg.0.do_send(SettingsRefreshed(data.clone()));
        }
        self.subscribers.push(msg.0);
    }
}

impl Handler<GetSettingsData> for IntelligentSettingsCoordinator {
    type Result = MessageResult<GetSettingsData>;

    fn handle(&mut self, _msg: GetSettingsData, _ctx: &mut Self::Context) -> Self::Result {
        MessageResult(self.data.clone())
    }
}
