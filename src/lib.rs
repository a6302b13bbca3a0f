//! Typed client for the Tenderly REST API: project contracts and wallets,
//! contract verification, and transaction/bundle simulation.

pub mod client;
pub mod config;
pub mod errors;
pub mod filter;
pub mod models;
pub mod network;
pub mod provider;
pub mod repositories;
pub mod simulator;
pub mod transport;
pub mod utils;
pub mod verification;
pub mod wire;

pub use client::Client;
pub use config::{Configuration, ConfigurationOverride, Settings};
pub use errors::{ApiError, Result, SdkError};
pub use filter::{DisplayNameFilter, EntityFilter};
pub use models::{AccountData, Contract, UpdateRequest, Wallet};
pub use network::Network;
pub use provider::ApiVersion;
pub use repositories::{ApiCapabilities, ContractRepository, Operation, Resource, WalletRepository};
pub use simulator::{
    AddressOverride, SimulationOutput, SimulationParameters, Simulator, TransactionParameters,
};
pub use verification::{VerificationMode, VerificationRequest, VerificationResult};
