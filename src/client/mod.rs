// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Octopus Energy Kraken GraphQL API client.
//!
//! Only the few requests required for Intelligent smart charge control are implemented.

use std::cell::RefCell;
use std::rc::Rc;

use awc::http::StatusCode;
use chrono::{DateTime, TimeDelta, Utc};
use futures::FutureExt;
use futures::future::LocalBoxFuture;
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use url::Url;

use crate::client::model::{
    DeviceData, GraphQlRequest, GraphQlResponse, ObtainTokenData, SettingsData,
};
use crate::errors::ServiceError;

#[cfg(test)]
pub(crate) mod mock;
mod model;
mod queries;

pub use model::{IntelligentDevice, IntelligentSettings};

/// Kraken tokens are valid for one hour, refresh a bit earlier.
const TOKEN_LIFETIME_MINUTES: i64 = 55;

/// Intelligent API operations used by the coordinator and the smart charge switch.
///
/// The returned futures are not `Send`: they are meant to be driven by an Actix actor on the
/// arbiter owning the client.
pub trait IntelligentApi {
    /// Retrieve the current intelligent settings of the given account.
    fn get_intelligent_settings(
        &self,
        account_id: &str,
    ) -> LocalBoxFuture<'static, Result<IntelligentSettings, ServiceError>>;

    /// Retrieve the registered intelligent device of the given account.
    ///
    /// Returns `None` if the account doesn't have an intelligent device.
    fn get_intelligent_device(
        &self,
        account_id: &str,
    ) -> LocalBoxFuture<'static, Result<Option<IntelligentDevice>, ServiceError>>;

    fn turn_on_smart_charge(&self, account_id: &str)
    -> LocalBoxFuture<'static, Result<(), ServiceError>>;

    fn turn_off_smart_charge(
        &self,
        account_id: &str,
    ) -> LocalBoxFuture<'static, Result<(), ServiceError>>;
}

#[derive(Clone)]
struct KrakenToken {
    value: String,
    obtained: DateTime<Utc>,
}

impl KrakenToken {
    fn is_valid(&self, now: DateTime<Utc>) -> bool {
        now - self.obtained < TimeDelta::minutes(TOKEN_LIFETIME_MINUTES)
    }
}

#[derive(Clone)]
pub struct OctopusEnergyApiClient {
    http: awc::Client,
    graphql_url: Url,
    api_key: Rc<str>,
    token: Rc<RefCell<Option<KrakenToken>>>,
    msg_tracing: bool,
}

impl OctopusEnergyApiClient {
    /// Create a new API client.
    ///
    /// # Arguments
    ///
    /// * `http`: shared HTTP client, see [`crate::util::new_http_client`]
    /// * `api_url`: base URL of the Octopus Energy API, e.g. `https://api.octopus.energy`
    /// * `api_key`: account API key used to obtain a Kraken token
    /// * `msg_tracing`: log request and response bodies
    pub fn new(
        http: awc::Client,
        api_url: &Url,
        api_key: impl AsRef<str>,
        msg_tracing: bool,
    ) -> Result<Self, ServiceError> {
        let graphql_url = api_url
            .join("v1/graphql/")
            .map_err(|e| ServiceError::BadRequest(format!("Invalid API url {api_url}: {e}")))?;
        let api_key = api_key.as_ref().trim();
        if api_key.is_empty() {
            return Err(ServiceError::BadRequest("API key must not be empty".into()));
        }

        Ok(Self {
            http,
            graphql_url,
            api_key: Rc::from(api_key),
            token: Default::default(),
            msg_tracing,
        })
    }

    /// Return a valid Kraken token, requesting a new one if the cached token expired.
    async fn token(&self) -> Result<String, ServiceError> {
        let now = Utc::now();
        if let Some(token) = self.token.borrow().as_ref().filter(|t| t.is_valid(now)) {
            return Ok(token.value.clone());
        }

        debug!("Requesting new Kraken token");
        let data: ObtainTokenData = self
            .post(queries::OBTAIN_TOKEN, json!({ "apiKey": &*self.api_key }), None)
            .await
            .map_err(|e| match e {
                ServiceError::ApiError(msg) => ServiceError::Unauthorized(msg),
                e => e,
            })?;
        let value = data.obtain_kraken_token.token;
        self.token.replace(Some(KrakenToken {
            value: value.clone(),
            obtained: now,
        }));
        info!("Obtained new Kraken token");

        Ok(value)
    }

    /// Send an authenticated GraphQL request.
    ///
    /// The cached token is discarded if the request fails with an API or authorization error.
    async fn query<T: DeserializeOwned>(
        &self,
        query: &'static str,
        variables: Value,
    ) -> Result<T, ServiceError> {
        let token = self.token().await?;
        let result = self.post(query, variables, Some(token)).await;
        if matches!(
            result,
            Err(ServiceError::ApiError(_)) | Err(ServiceError::Unauthorized(_))
        ) {
            self.token.replace(None);
        }
        result
    }

    async fn post<T: DeserializeOwned>(
        &self,
        query: &'static str,
        variables: Value,
        token: Option<String>,
    ) -> Result<T, ServiceError> {
        let request = GraphQlRequest { query, variables };
        if self.msg_tracing {
            debug!("[{}] <- {}", self.graphql_url, serde_json::to_string(&request)?);
        }

        let mut builder = self.http.post(self.graphql_url.as_str());
        if let Some(token) = token {
            builder = builder.insert_header(("Authorization", token));
        }
        let mut response = builder.send_json(&request).await?;

        let status = response.status();
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Err(ServiceError::Unauthorized(format!("HTTP status {status}")));
        }
        if !status.is_success() {
            return Err(ServiceError::ServiceUnavailable(format!(
                "HTTP status {status}"
            )));
        }

        let value: Value = response.json().await?;
        if self.msg_tracing {
            debug!("[{}] -> {value}", self.graphql_url);
        }
        let response: GraphQlResponse<T> = serde_json::from_value(value)?;
        response.into_result()
    }
}

impl IntelligentApi for OctopusEnergyApiClient {
    fn get_intelligent_settings(
        &self,
        account_id: &str,
    ) -> LocalBoxFuture<'static, Result<IntelligentSettings, ServiceError>> {
        let client = self.clone();
        let variables = json!({ "accountNumber": account_id });
        async move {
            let data: SettingsData = client.query(queries::INTELLIGENT_SETTINGS, variables).await?;
            IntelligentSettings::try_from(data)
        }
        .boxed_local()
    }

    fn get_intelligent_device(
        &self,
        account_id: &str,
    ) -> LocalBoxFuture<'static, Result<Option<IntelligentDevice>, ServiceError>> {
        let client = self.clone();
        let variables = json!({ "accountNumber": account_id });
        async move {
            let data: DeviceData = client.query(queries::INTELLIGENT_DEVICE, variables).await?;
            Ok(data.registered_krakenflex_device.map(Into::into))
        }
        .boxed_local()
    }

    fn turn_on_smart_charge(
        &self,
        account_id: &str,
    ) -> LocalBoxFuture<'static, Result<(), ServiceError>> {
        let client = self.clone();
        let variables = json!({ "accountNumber": account_id });
        async move {
            let _: Value = client.query(queries::TURN_ON_SMART_CHARGE, variables).await?;
            Ok(())
        }
        .boxed_local()
    }

    fn turn_off_smart_charge(
        &self,
        account_id: &str,
    ) -> LocalBoxFuture<'static, Result<(), ServiceError>> {
        let client = self.clone();
        let variables = json!({ "accountNumber": account_id });
        async move {
            let _: Value = client.query(queries::TURN_OFF_SMART_CHARGE, variables).await?;
            Ok(())
        }
        .boxed_local()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn new_client(api_url: &str) -> Result<OctopusEnergyApiClient, ServiceError> {
        let http = crate::util::new_http_client(Duration::from_secs(5), false)?;
        OctopusEnergyApiClient::new(http, &Url::parse(api_url).unwrap(), "sk_test", false)
    }

    #[actix::test]
    async fn graphql_url_is_derived_from_api_url() {
        let client = new_client("https://api.octopus.energy").unwrap();
        assert_eq!(
            "https://api.octopus.energy/v1/graphql/",
            client.graphql_url.as_str()
        );

        let client = new_client("http://localhost:8080/").unwrap();
        assert_eq!("http://localhost:8080/v1/graphql/", client.graphql_url.as_str());
    }

    #[actix::test]
    async fn empty_api_key_is_rejected() {
        let http = crate::util::new_http_client(Duration::from_secs(5), false).unwrap();
        let result = OctopusEnergyApiClient::new(
            http,
            &Url::parse("https://api.octopus.energy").unwrap(),
            "  ",
            false,
        );
        assert!(matches!(result, Err(ServiceError::BadRequest(_))));
    }

    #[test]
    fn token_expires_after_lifetime() {
        let obtained = Utc::now();
        let token = KrakenToken {
            value: "jwt".into(),
            obtained,
        };
        assert!(token.is_valid(obtained + TimeDelta::minutes(54)));
        assert!(!token.is_valid(obtained + TimeDelta::minutes(55)));
    }
}
