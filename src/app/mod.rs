//! Application layer: the typed contract client and its factory.

pub mod contract;
pub mod factory;

pub use contract::{ContractQuery, ContractTx, SpectrePse};
pub use factory::{Constructor, ContractFactory};
