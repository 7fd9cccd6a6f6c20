//! Public call surface.
//!
//! Free functions take the four-argument call shape with the verb given
//! as a string; `Client` is the typed, reusable handle. Both
//! settle through the same dispatcher, with the materializer stages
//! layered on for `buffer` and `json`.

use std::sync::Arc;

use crate::dispatch::Dispatcher;
use crate::error::ClientError;
use crate::interceptor::RequestInterceptor;
use crate::materialize::{buffer_stage, json_stage};
use crate::types::{ClientConfig, HttpMethod, Query, ResponseEnvelope};

/// A configured handle on the REST API.
pub struct Client {
    config: ClientConfig,
    dispatcher: Dispatcher,
}

impl Client {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            dispatcher: Dispatcher::new(),
        }
    }

    /// Attach a diagnostics collaborator. May be called repeatedly.
    pub fn with_interceptor(mut self, interceptor: Arc<dyn RequestInterceptor>) -> Self {
        self.dispatcher = self.dispatcher.with_interceptor(interceptor);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Raw dispatch: resolves with the live response stream.
    pub async fn request(
        &self,
        method: HttpMethod,
        path: &str,
        query: &Query,
    ) -> Result<ResponseEnvelope, ClientError> {
        self.dispatcher
            .dispatch(method, path, query, &self.config)
            .await
    }

    /// Like [`Client::request`], with the body drained into one buffer.
    pub async fn buffer(
        &self,
        method: HttpMethod,
        path: &str,
        query: &Query,
    ) -> Result<ResponseEnvelope, ClientError> {
        let envelope = self.request(method, path, query).await?;
        buffer_stage(envelope).await
    }

    /// Like [`Client::buffer`], with the body decoded as JSON (raw-text
    /// fallback).
    pub async fn json(
        &self,
        method: HttpMethod,
        path: &str,
        query: &Query,
    ) -> Result<ResponseEnvelope, ClientError> {
        let envelope = self.buffer(method, path, query).await?;
        Ok(json_stage(envelope))
    }
}

/// One-shot raw request. The verb is parsed case-insensitively.
pub async fn request(
    method: &str,
    path: &str,
    query: &Query,
    config: &ClientConfig,
) -> Result<ResponseEnvelope, ClientError> {
    let method: HttpMethod = method.parse()?;
    Client::new(config.clone()).request(method, path, query).await
}

/// One-shot request with the response body materialized as bytes.
pub async fn buffer(
    method: &str,
    path: &str,
    query: &Query,
    config: &ClientConfig,
) -> Result<ResponseEnvelope, ClientError> {
    let method: HttpMethod = method.parse()?;
    Client::new(config.clone()).buffer(method, path, query).await
}

/// One-shot request with the response body decoded as JSON.
pub async fn json(
    method: &str,
    path: &str,
    query: &Query,
    config: &ClientConfig,
) -> Result<ResponseEnvelope, ClientError> {
    let method: HttpMethod = method.parse()?;
    Client::new(config.clone()).json(method, path, query).await
}

/// Callback-style completion for [`request`].
///
/// The call runs on a spawned task and the callback fires once it
/// settles. Requires a running tokio runtime; the returned handle can be
/// awaited to observe completion.
pub fn request_with_callback<F>(
    method: String,
    path: String,
    query: Query,
    config: ClientConfig,
    callback: F,
) -> tokio::task::JoinHandle<()>
where
    F: FnOnce(Result<ResponseEnvelope, ClientError>) + Send + 'static,
{
    tokio::spawn(async move {
        callback(request(&method, &path, &query, &config).await);
    })
}

/// Callback-style completion for [`buffer`].
pub fn buffer_with_callback<F>(
    method: String,
    path: String,
    query: Query,
    config: ClientConfig,
    callback: F,
) -> tokio::task::JoinHandle<()>
where
    F: FnOnce(Result<ResponseEnvelope, ClientError>) + Send + 'static,
{
    tokio::spawn(async move {
        callback(buffer(&method, &path, &query, &config).await);
    })
}

/// Callback-style completion for [`json`].
pub fn json_with_callback<F>(
    method: String,
    path: String,
    query: Query,
    config: ClientConfig,
    callback: F,
) -> tokio::task::JoinHandle<()>
where
    F: FnOnce(Result<ResponseEnvelope, ClientError>) + Send + 'static,
{
    tokio::spawn(async move {
        callback(json(&method, &path, &query, &config).await);
    })
}
