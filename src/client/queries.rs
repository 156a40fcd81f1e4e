// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Kraken GraphQL documents.

pub(crate) const OBTAIN_TOKEN: &str = r#"mutation ObtainKrakenToken($apiKey: String!) {
  obtainKrakenToken(input: { APIKey: $apiKey }) {
    token
  }
}"#;

pub(crate) const INTELLIGENT_SETTINGS: &str = r#"query IntelligentSettings($accountNumber: String!) {
  registeredKrakenflexDevice(accountNumber: $accountNumber) {
    suspended
  }
  vehicleChargingPreferences(accountNumber: $accountNumber) {
    weekdayTargetTime
    weekdayTargetSoc
    weekendTargetTime
    weekendTargetSoc
  }
}"#;

pub(crate) const INTELLIGENT_DEVICE: &str = r#"query IntelligentDevice($accountNumber: String!) {
  registeredKrakenflexDevice(accountNumber: $accountNumber) {
    krakenflexDeviceId
    provider
    status
    vehicleMake
    vehicleModel
    chargePointMake
    chargePointModel
  }
}"#;

pub(crate) const TURN_ON_SMART_CHARGE: &str = r#"mutation ResumeControl($accountNumber: String!) {
  resumeControl(input: { accountNumber: $accountNumber }) {
    krakenflexDevice {
      krakenflexDeviceId
    }
  }
}"#;

pub(crate) const TURN_OFF_SMART_CHARGE: &str = r#"mutation SuspendControl($accountNumber: String!) {
  suspendControl(input: { accountNumber: $accountNumber }) {
    krakenflexDevice {
      krakenflexDeviceId
    }
  }
}"#;
