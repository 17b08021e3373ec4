//! OAuth 2.0 authorization-code flow with PKCE.
//!
//! Provides state issuance, PKCE derivation, the provider abstraction and the
//! response-shape tolerant extraction used by the callback.

mod extract;
mod pkce;
mod provider;
mod state;
mod token;

pub mod providers;

pub use extract::{access_token, user_profile};
pub use pkce::{PkceChallenge, PkceVerifier};
pub use provider::{Provider, ProviderKind, UserProfile};
pub use state::{AuthState, IssuedState, MemoryStateStore, StateManager, StateStore};
pub use token::TokenExchange;
