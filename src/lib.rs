//! Async request helper for the Collective REST API.
//!
//! Adapts a `(method, path, query, config)` call shape into a full HTTP
//! request against the API's `/api/rest` mount point, and materializes
//! the response as a live stream, one byte buffer, or decoded JSON.
//!
//! ```rust,ignore
//! use collective::{Auth, ClientConfig, Query, json};
//! use serde_json::json as j;
//!
//! let config = ClientConfig::new("api.example.com").with_auth(Auth::Basic {
//!     username: "user".into(),
//!     password: "pass".into(),
//! });
//! let query = Query::fields(j!({ "uuid": "a5a70b88" }))?;
//! let res = json("GET", "/category/uuid/:uuid/subcategories", &query, &config).await?;
//! println!("{:?}", res.body.json());
//! ```
#![deny(unsafe_code)]

pub mod builder;
pub mod client;
pub mod dispatch;
pub mod error;
pub mod interceptor;
pub mod materialize;
pub mod types;

pub use client::{
    Client, buffer, buffer_with_callback, json, json_with_callback, request,
    request_with_callback,
};
pub use error::{ClientError, HttpFailure};
pub use interceptor::{RequestContext, RequestInterceptor, TracingInterceptor};
pub use types::{
    Auth, ClientConfig, HttpMethod, MultipartBody, Protocol, Query, ResponseBody, ResponseEnvelope,
};
