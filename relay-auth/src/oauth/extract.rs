//! Ordered extraction strategies for provider response envelopes.
//!
//! Providers do not agree on where the interesting fields live. Each strategy
//! looks in one place and returns an optional value; strategies are tried in
//! order and the first non-empty result wins.

use serde_json::Value;

use super::provider::UserProfile;

type TokenStrategy = fn(&Value) -> Option<&str>;
type ProfileStrategy = fn(&Value) -> Option<&Value>;

const ACCESS_TOKEN_STRATEGIES: &[TokenStrategy] = &[top_level_token, data_token];

const PROFILE_STRATEGIES: &[ProfileStrategy] =
    &[data_user_profile, user_profile_object, data_profile, top_level_profile];

// {"access_token": "..."}
fn top_level_token(body: &Value) -> Option<&str> {
    body.get("access_token")?.as_str()
}

// {"data": {"access_token": "..."}}
fn data_token(body: &Value) -> Option<&str> {
    body.get("data")?.get("access_token")?.as_str()
}

// {"data": {"user": {...}}}
fn data_user_profile(body: &Value) -> Option<&Value> {
    body.get("data")?.get("user")
}

// {"user": {...}}
fn user_profile_object(body: &Value) -> Option<&Value> {
    body.get("user")
}

// {"data": {"open_id": ...}}
fn data_profile(body: &Value) -> Option<&Value> {
    body.get("data")
}

// {"open_id": ...}
fn top_level_profile(body: &Value) -> Option<&Value> {
    Some(body)
}

/// Find the access token in a token endpoint body.
pub fn access_token(body: &Value) -> Option<String> {
    ACCESS_TOKEN_STRATEGIES
        .iter()
        .filter_map(|strategy| strategy(body))
        .find(|token| !token.is_empty())
        .map(str::to_string)
}

/// Find the user profile in a profile endpoint body.
///
/// A candidate only counts if it is an object with a non-empty `open_id`.
pub fn user_profile(body: &Value) -> Option<UserProfile> {
    PROFILE_STRATEGIES
        .iter()
        .filter_map(|strategy| strategy(body))
        .filter(|candidate| candidate.is_object())
        .filter_map(|candidate| serde_json::from_value::<UserProfile>(candidate.clone()).ok())
        .find(|profile| !profile.open_id.is_empty())
}
