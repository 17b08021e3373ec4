//! # relay-auth
//!
//! Building blocks for relaying a third-party OAuth 2.0 login back to a web client:
//! - PKCE verifier/challenge generation (RFC 7636, S256)
//! - Single-use CSRF state storage with expiry
//! - OAuth provider trait and the TikTok implementation
//! - Tolerant extraction of access tokens and profiles from provider envelopes
//! - HTTP client building with bounded timeouts
//! - Sealing of access tokens before they are persisted
//!
//! ## Usage
//!
//! ```rust,ignore
//! use relay_auth::{
//!     oauth::{StateManager, MemoryStateStore, Provider, providers::tiktok},
//!     http::ClientBuilder,
//! };
//! ```

pub mod error;
pub mod http;
pub mod oauth;
pub mod seal;

// Re-export commonly used types
pub use error::{Error, ErrorKind, UpstreamFailure};
