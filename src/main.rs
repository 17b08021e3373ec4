use std::sync::Arc;
use std::time::Duration;

use domain::auth_relay::AuthRelay;
use domain::gateway::supabase::SupabaseClient;
use domain::record_store::RecordStore;
use log::*;
use service::{config::Config, logging::Logger};
use web::AppState;

#[tokio::main]
async fn main() {
    let config = Config::new();
    Logger::init_logger(&config as &Config);

    info!(
        "Starting up OAuth relay [{}] with frontend {}",
        config.runtime_env(),
        config.frontend_url()
    );

    let missing = config.missing_provider_credentials();
    if !missing.is_empty() {
        if config.is_production() {
            error!("Missing required configuration: {}", missing.join(", "));
            std::process::exit(1);
        }
        warn!(
            "Missing {}; /auth/tiktok will answer with a configuration error",
            missing.join(", ")
        );
    }

    let record_store = match SupabaseClient::from_config(&config) {
        Ok(Some(client)) => {
            info!("Persisting profiles to Supabase table {}", config.supabase_profile_table());
            Some(Arc::new(client) as Arc<dyn RecordStore>)
        }
        Ok(None) => {
            info!("SUPABASE_URL or SUPABASE_KEY not set, profile persistence disabled");
            None
        }
        Err(e) => {
            error!("Failed to build the Supabase client: {e}");
            std::process::exit(1);
        }
    };

    let relay = match AuthRelay::from_config(&config, record_store.clone()) {
        Ok(relay) => Arc::new(relay),
        Err(e) => {
            error!("Failed to initialize the OAuth relay: {e}");
            std::process::exit(1);
        }
    };

    spawn_state_sweeper(Arc::clone(&relay), config.state_sweep_interval_secs);

    let app_state = AppState::new(config, relay, record_store);

    if let Err(e) = web::init_server(app_state).await {
        error!("Server stopped with an error: {e}");
        std::process::exit(1);
    }
}

/// Periodically purges expired OAuth states. Disabled when the interval is 0.
fn spawn_state_sweeper(relay: Arc<AuthRelay>, interval_secs: u64) {
    if interval_secs == 0 || relay.states().ttl().is_none() {
        return;
    }

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
        loop {
            interval.tick().await;
            match relay.sweep_expired_states().await {
                Ok(0) => {}
                Ok(purged) => debug!("Purged {purged} expired OAuth states"),
                Err(e) => warn!("Failed to purge expired OAuth states: {e}"),
            }
        }
    });
}
