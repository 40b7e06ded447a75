//! Server assembly
//!
//! Resources and free-standing routes are registered on a [`ServerBuilder`],
//! which validates them and seals into a [`ServerHost`]. The host resolves
//! route names to URLs, generates client code and becomes an axum `Router`
//! whose routes all run through the same dispatch pipeline.

pub mod builder;
pub mod dispatch;
pub mod host;
pub mod route_table;

pub use builder::ServerBuilder;
pub use dispatch::{Filter, PostProc};
pub use host::ServerHost;
pub use route_table::{RouteEntry, RouteTable};
