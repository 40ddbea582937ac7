//! Domain ports for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod graph_transport;
mod remote_call_executor;

#[cfg(test)]
pub use graph_transport::MockGraphTransport;
pub use graph_transport::GraphTransport;
#[cfg(test)]
pub use remote_call_executor::MockRemoteCallExecutor;
pub use remote_call_executor::{RemoteCallError, RemoteCallExecutor};
