// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Kraken GraphQL data structure definitions for JSON serialization & deserialization, and the
//! domain types they are converted into.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ServiceError;

/// Intelligent (smart EV charging) settings of an account.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IntelligentSettings {
    /// Smart charge enabled: the supplier controls when the vehicle charges.
    pub smart_charge: bool,
    /// Target state of charge in percent on weekdays.
    pub charge_limit_weekday: Option<u8>,
    /// Target state of charge in percent on weekends.
    pub charge_limit_weekend: Option<u8>,
    pub ready_time_weekday: Option<NaiveTime>,
    pub ready_time_weekend: Option<NaiveTime>,
}

/// Registered Intelligent device: the charge point or vehicle controlled by the supplier.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IntelligentDevice {
    pub id: String,
    pub provider: Option<String>,
    pub status: Option<String>,
    pub vehicle_make: Option<String>,
    pub vehicle_model: Option<String>,
    pub charge_point_make: Option<String>,
    pub charge_point_model: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct GraphQlRequest<'a> {
    pub query: &'a str,
    pub variables: Value,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphQlError {
    pub message: String,
    #[serde(default)]
    pub extensions: Option<Value>,
}

impl GraphQlError {
    fn error_code(&self) -> Option<&str> {
        self.extensions
            .as_ref()
            .and_then(|e| e.get("errorCode"))
            .and_then(|v| v.as_str())
    }
}

impl<T> GraphQlResponse<T> {
    /// Returns the response data, or an [`ServiceError::ApiError`] if the response contains any
    /// errors or no data at all.
    pub fn into_result(self) -> Result<T, ServiceError> {
        if !self.errors.is_empty() {
            let msg = self
                .errors
                .iter()
                .map(|e| match e.error_code() {
                    Some(code) => format!("{} ({code})", e.message),
                    None => e.message.clone(),
                })
                .collect::<Vec<_>>()
                .join("; ");
            return Err(ServiceError::ApiError(msg));
        }
        self.data
            .ok_or_else(|| ServiceError::ApiError("Response without data".into()))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ObtainTokenData {
    pub obtain_kraken_token: TokenPayload,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenPayload {
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SettingsData {
    pub registered_krakenflex_device: Option<SuspendedState>,
    pub vehicle_charging_preferences: Option<ChargingPreferences>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SuspendedState {
    pub suspended: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ChargingPreferences {
    pub weekday_target_time: Option<String>,
    pub weekday_target_soc: Option<u8>,
    pub weekend_target_time: Option<String>,
    pub weekend_target_soc: Option<u8>,
}

impl TryFrom<SettingsData> for IntelligentSettings {
    type Error = ServiceError;

    fn try_from(data: SettingsData) -> Result<Self, Self::Error> {
        let device = data.registered_krakenflex_device.ok_or_else(|| {
            ServiceError::NotFound("No intelligent device registered for account".into())
        })?;
        let preferences = data.vehicle_charging_preferences.unwrap_or_default();

        Ok(IntelligentSettings {
            smart_charge: !device.suspended,
            charge_limit_weekday: preferences.weekday_target_soc,
            charge_limit_weekend: preferences.weekend_target_soc,
            ready_time_weekday: parse_target_time(preferences.weekday_target_time.as_deref())?,
            ready_time_weekend: parse_target_time(preferences.weekend_target_time.as_deref())?,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DeviceData {
    pub registered_krakenflex_device: Option<DeviceDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DeviceDto {
    pub krakenflex_device_id: String,
    pub provider: Option<String>,
    pub status: Option<String>,
    pub vehicle_make: Option<String>,
    pub vehicle_model: Option<String>,
    pub charge_point_make: Option<String>,
    pub charge_point_model: Option<String>,
}

impl From<DeviceDto> for IntelligentDevice {
    fn from(dto: DeviceDto) -> Self {
        Self {
            id: dto.krakenflex_device_id,
            provider: dto.provider,
            status: dto.status,
            vehicle_make: dto.vehicle_make,
            vehicle_model: dto.vehicle_model,
            charge_point_make: dto.charge_point_make,
            charge_point_model: dto.charge_point_model,
        }
    }
}

/// Parse a `HH:MM` or `HH:MM:SS` target time.
fn parse_target_time(value: Option<&str>) -> Result<Option<NaiveTime>, ServiceError> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map(Some)
        .map_err(|e| ServiceError::SerializationError(format!("Invalid target time {value}: {e}")))
}
