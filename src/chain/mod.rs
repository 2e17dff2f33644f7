//! Chain address resolution.
//!
//! Sign-in binds a session key to an on-chain address. How that address is
//! obtained depends on the chain, so it sits behind the [`ChainResolver`]
//! trait:
//!
//! ```text
//! ┌──────────────┐     ┌───────────────┐     ┌─────────────────┐
//! │ SignInInput  │────▶│ ChainResolver │────▶│ on-chain address│
//! └──────────────┘     │    (trait)    │     └─────────────────┘
//!                      └───────┬───────┘
//!                              │
//!                              ▼
//!                      ┌───────────────┐     ┌─────────────────┐
//!                      │ AptosResolver │────▶│ pepper service  │
//!                      │    (impl)     │     │   (HTTP POST)   │
//!                      └───────────────┘     └─────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use wallet_session::chain::{AptosNetwork, AptosResolver, ChainResolver};
//!
//! let resolver = AptosResolver::new(AptosNetwork::Devnet)?;
//! let address = resolver.resolve_address(&input).await?;
//! ```

pub mod aptos;
pub mod error;
pub mod resolver;
pub mod types;

pub use aptos::AptosResolver;
pub use error::ChainError;
pub use resolver::ChainResolver;
pub use types::AptosNetwork;
