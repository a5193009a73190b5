//! Domain layer: the workflow, payment and mutation entities together with
//! the ports the application layer depends on.

pub mod auth;
pub mod mutation;
pub mod ports;
pub mod transaction;
pub mod wizard;
pub mod workflow;
