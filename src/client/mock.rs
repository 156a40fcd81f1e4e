// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Configurable [`IntelligentApi`] implementation for unit tests.

use std::cell::RefCell;

use futures::FutureExt;
use futures::future::{LocalBoxFuture, ready};

use crate::client::{IntelligentApi, IntelligentDevice, IntelligentSettings};
use crate::errors::ServiceError;

pub(crate) struct MockIntelligentApi {
    pub settings: RefCell<Result<IntelligentSettings, ServiceError>>,
    pub device: RefCell<Option<IntelligentDevice>>,
    /// Error returned by the turn on / off mutations, if set.
    pub mutation_error: RefCell<Option<ServiceError>>,
    /// Recorded calls in the form `{operation}:{account_id}`.
    pub calls: RefCell<Vec<String>>,
}

impl Default for MockIntelligentApi {
    fn default() -> Self {
        Self {
            settings: RefCell::new(Ok(IntelligentSettings::default())),
            device: Default::default(),
            mutation_error: Default::default(),
            calls: Default::default(),
        }
    }
}

impl MockIntelligentApi {
    pub fn with_smart_charge(smart_charge: bool) -> Self {
        let mock = Self::default();
        mock.set_smart_charge(smart_charge);
        mock
    }

    pub fn set_smart_charge(&self, smart_charge: bool) {
        *self.settings.borrow_mut() = Ok(IntelligentSettings {
            smart_charge,
            ..Default::default()
        });
    }

    pub fn calls(&self, operation: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.split(':').next() == Some(operation))
            .count()
    }

    fn record(&self, operation: &str, account_id: &str) {
        self.calls
            .borrow_mut()
            .push(format!("{operation}:{account_id}"));
    }

    fn mutation_result(&self) -> Result<(), ServiceError> {
        match self.mutation_error.borrow().as_ref() {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}

impl IntelligentApi for MockIntelligentApi {
    fn get_intelligent_settings(
        &self,
        account_id: &str,
    ) -> LocalBoxFuture<'static, Result<IntelligentSettings, ServiceError>> {
        self.record("settings", account_id);
        ready(self.settings.borrow().clone()).boxed_local()
    }

    fn get_intelligent_device(
        &self,
        account_id: &str,
    ) -> LocalBoxFuture<'static, Result<Option<IntelligentDevice>, ServiceError>> {
        self.record("device", account_id);
        ready(Ok(self.device.borrow().clone())).boxed_local()
    }

    fn turn_on_smart_charge(
        &self,
        account_id: &str,
    ) -> LocalBoxFuture<'static, Result<(), ServiceError>> {
        self.record("turn_on", account_id);
        ready(self.mutation_result()).boxed_local()
    }

    fn turn_off_smart_charge(
        &self,
        account_id: &str,
    ) -> LocalBoxFuture<'static, Result<(), ServiceError>> {
        self.record("turn_off", account_id);
        ready(self.mutation_result()).boxed_local()
    }
}
