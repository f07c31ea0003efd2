//! Test doubles for the chain node and the signing subsystem.

pub mod contract_sim;
pub mod mocks;

pub use contract_sim::SimulatedContract;
pub use mocks::{MockConfig, MockContractRpc, MockSigner};
