// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Actix Actor message definitions for the [`IntelligentSettingsCoordinator`].

#[allow(unused_imports)] // used for doc links
use crate::coordinator::IntelligentSettingsCoordinator;
use crate::coordinator::IntelligentCoordinatorResult;
use crate::errors::ServiceError;
use actix::prelude::{Message, Recipient};

/// Fetch the intelligent settings now.
///
/// On failure the previously retrieved data is kept and the error is returned.
#[derive(Message)]
#[rtype(result = "Result<(), ServiceError>")]
pub struct RefreshSettings;

/// Register a recipient for settings updates.
///
/// The recipient immediately receives the current data if already available.
#[derive(Message)]
#[rtype(result = "()")]
pub struct SubscribeSettings(pub Recipient<SettingsRefreshed>);

/// Get the latest successfully retrieved settings.
#[derive(Message)]
#[rtype(result = "Option<IntelligentCoordinatorResult>")]
pub struct GetSettingsData;

/// Event sent to subscribers after a successful refresh.
#[derive(Debug, Clone, Message)]
#[rtype(result = "()")]
pub struct SettingsRefreshed(pub IntelligentCoordinatorResult);
