// Copyright (c) 2023 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

use crate::USER_AGENT;
use crate::errors::ServiceError;
use rustls::ClientConfig;
use rustls_platform_verifier::ConfigVerifierExt;
use std::sync::Arc;
use std::time::Duration;

/// Create a HTTP client for the Kraken API.
///
/// With `tls` enabled the platform certificate verifier is used. Creating a client is expensive,
/// it should be created once and cloned.
pub fn new_http_client(request_timeout: Duration, tls: bool) -> Result<awc::Client, ServiceError> {
    let builder = awc::ClientBuilder::new()
        .timeout(request_timeout)
        .add_default_header(("User-Agent", USER_AGENT));

    if !tls {
        return Ok(builder.finish());
    }

    let mut config = ClientConfig::with_platform_verifier().map_err(|e| {
        ServiceError::InternalServerError(format!("Error creating TLS configuration: {e}"))
    })?;
    // http2 isn't required for a few small GraphQL requests
    config.alpn_protocols = vec![b"http/1.1".to_vec()];

    let connector = awc::Connector::new().rustls_0_23(Arc::new(config));
    Ok(builder.connector(connector).finish())
}
