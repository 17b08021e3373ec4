pub(crate) mod health_check_controller;
pub(crate) mod oauth_controller;
pub(crate) mod record_store_controller;
pub(crate) mod search_controller;
