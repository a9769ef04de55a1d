mod error;
pub use error::ApiError;

mod handler;
pub use handler::ApiHandler;

mod adapter;
pub use adapter::ServiceApiAdapter;

#[cfg(feature = "http")]
mod auth;

#[cfg(feature = "http")]
pub use auth::BearerToken;

#[cfg(feature = "http")]
mod http;

#[cfg(feature = "http")]
pub use http::HttpApi;

#[cfg(feature = "http")]
pub use axum;
