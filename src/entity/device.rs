// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Device metadata of Intelligent entities.

use serde::Serialize;

use crate::client::IntelligentDevice;
use crate::entity::DOMAIN;

/// Device registry information an entity is attached to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceInfo {
    /// `(domain, device id)` pairs
    pub identifiers: Vec<(String, String)>,
    pub name: String,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
}

impl From<&IntelligentDevice> for DeviceInfo {
    /// The charge point make and model are used if known, otherwise the vehicle's.
    fn from(device: &IntelligentDevice) -> Self {
        let (manufacturer, model) = if device.charge_point_make.is_some() {
            (
                device.charge_point_make.clone(),
                device.charge_point_model.clone(),
            )
        } else {
            (device.vehicle_make.clone(), device.vehicle_model.clone())
        };

        Self {
            identifiers: vec![(DOMAIN.to_string(), device.id.clone())],
            name: "Charger".to_string(),
            manufacturer,
            model,
        }
    }
}
