//! SCIM 2.0 provisioning bridge.
//!
//! Identity providers push users and groups over SCIM; the bridge reconciles
//! them into a remote GraphQL identity graph.

pub mod config;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use domain::TraceId;
pub use middleware::Trace;
