//! HTTP inbound adapter exposing the SCIM endpoints.

pub mod auth;
pub mod discovery;
pub mod dto;
pub mod envelope;
pub mod error;
pub mod groups;
pub mod health;
pub mod routes;
pub mod schemas;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod users;

pub use error::ApiResult;
pub use routes::{configure, json_config, scim_scope};
pub use state::HttpState;
