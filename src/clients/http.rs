use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::clients::service::{Service, ServiceError};

/// Builds the one HTTP client used for the whole invocation.
pub fn build_client(service: Service, timeout_secs: Option<u64>) -> Result<Client, ServiceError> {
    let mut builder = Client::builder();
    if let Some(timeout_secs) = timeout_secs {
        builder = builder.timeout(Duration::from_secs(timeout_secs));
    }
    builder
        .build()
        .map_err(|source| ServiceError::Request { service, source })
}

/// Sends a request once. Non-2xx statuses become [`ServiceError::Api`].
pub(crate) async fn send(service: Service, request: RequestBuilder) -> Result<Response, ServiceError> {
    let response = request
        .send()
        .await
        .map_err(|source| ServiceError::Request { service, source })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ServiceError::Api {
            service,
            status,
            body,
        });
    }

    log::debug!("{service} responded with {status}");
    Ok(response)
}

/// Reads a successful response body as arbitrary JSON.
pub(crate) async fn read_json(service: Service, response: Response) -> Result<Value, ServiceError> {
    read_body(service, response).await
}

/// Reads a successful response body into `T`.
///
/// Transport failures stay [`ServiceError::Request`]; a body that does not
/// decode is [`ServiceError::InvalidResponse`].
pub(crate) async fn read_body<T: DeserializeOwned>(
    service: Service,
    response: Response,
) -> Result<T, ServiceError> {
    let body = response
        .text()
        .await
        .map_err(|source| ServiceError::Request { service, source })?;
    decode_body(service, &body)
}

fn decode_body<T: DeserializeOwned>(service: Service, body: &str) -> Result<T, ServiceError> {
    serde_json::from_str(body).map_err(|err| ServiceError::InvalidResponse {
        service,
        detail: format!("body does not decode ({err})"),
    })
}
