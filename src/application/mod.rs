//! Application layer: orchestration of the wizard lifecycle, the payment
//! branch, the post-gateway reconciliation and the optimistic mutations.
//! Owns boxed ports; all remote effects go through them.

pub mod checkout;
pub mod engine;
pub mod mutation;
pub mod resume;
