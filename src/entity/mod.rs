// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Entity model shared by the entities of this integration and the [`crate::Controller`].

use std::collections::HashSet;

use actix::Message;
use serde::Serialize;
use serde_json::{Map, Value};
use strum::{Display, EnumString, VariantNames};

use crate::errors::ServiceError;

mod device;
mod smart_charge;

pub use device::*;
pub use smart_charge::*;

/// Integration domain, used in unique ids and device identifiers.
pub const DOMAIN: &str = "octopus_energy";

/// Switch commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, VariantNames)]
#[strum(serialize_all = "snake_case")]
pub enum SwitchCommand {
    On,
    Off,
    Toggle,
}

/// Execute a command on an entity.
#[derive(Debug, Message)]
#[rtype(result = "Result<(), ServiceError>")]
pub struct EntityCommand(pub SwitchCommand);

/// Evaluate and return the current state of an entity.
#[derive(Debug, Message)]
#[rtype(result = "EntityState")]
pub struct GetState;

/// Published state of an entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityState {
    pub entity_id: String,
    pub unique_id: String,
    pub name: String,
    pub icon: Option<String>,
    /// `on` or `off` for switches
    pub state: String,
    pub attributes: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<DeviceInfo>,
}

/// Convert a name into an entity id object id.
///
/// The name is lowercased, every run of non-alphanumeric characters becomes a single `_`, and
/// leading or trailing `_` are removed.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('_') {
            slug.push('_');
        }
    }
    while slug.ends_with('_') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("unknown");
    }
    slug
}

/// Generate a unique entity id.
///
/// # Arguments
///
/// * `pattern`: entity id pattern containing a `{}` placeholder, e.g. `switch.{}`
/// * `name`: name or unique id of the entity, slugified into the placeholder
/// * `existing`: already used entity ids
///
/// returns: the generated id. If it is already taken, `_2`, `_3`, ... is appended.
pub fn generate_entity_id(pattern: &str, name: &str, existing: &HashSet<String>) -> String {
    let preferred = pattern.replacen("{}", &slugify(name), 1);
    if !existing.contains(&preferred) {
        return preferred;
    }

    (2..)
        .map(|n| format!("{preferred}_{n}"))
        .find(|id| !existing.contains(id))
        .unwrap_or(preferred)
}
