//! Orchestration for the OAuth relay.
//!
//! `web` depends on this crate only; provider, state and sealing details from
//! `relay-auth` are translated here so the HTTP layer never
//! reaches below `domain`.

pub use relay_auth::UpstreamFailure;

pub mod auth_relay;
pub mod error;
pub mod gateway;
pub mod profile_store;
pub mod record_store;
pub mod video_search;

#[cfg(test)]
pub(crate) mod test_support;
