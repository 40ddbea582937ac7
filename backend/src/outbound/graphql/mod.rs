//! GraphQL-over-HTTP adapter for the remote identity graph.

mod dto;
mod http_transport;

pub use http_transport::GraphqlHttpTransport;
