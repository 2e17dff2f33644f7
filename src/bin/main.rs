use std::sync::Arc;

use log::info;
use tokio::net::TcpListener;
use wallet_session::auth::NoRequestVerifier;
use wallet_session::chain::AptosResolver;
use wallet_session::config::load_config;
use wallet_session::http::{router, AppState};
use wallet_session::repository::{KeyRepository, RedisKeyRepository};
use wallet_session::{IssuanceEngine, RevocationAuthority, TokenValidator};

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::init();

    // Load configuration
    let settings = load_config()?;
    let auth_config = settings.auth_config();

    let repository: Arc<dyn KeyRepository> =
        Arc::new(RedisKeyRepository::open(&settings.redis_url)?);
    let resolver = Arc::new(AptosResolver::new(settings.aptos_network)?);

    let state = Arc::new(AppState {
        engine: Arc::new(IssuanceEngine::new(
            repository.clone(),
            resolver,
            auth_config.clone(),
        )),
        validator: Arc::new(TokenValidator::new(repository.clone(), auth_config)),
        authority: Arc::new(RevocationAuthority::new(repository)),
        verifier: Arc::new(NoRequestVerifier),
        apple_redirect_uri: settings.apple_redirect_uri.clone(),
    });

    let app = router(state, settings.apple_callback_path.as_deref());

    let listener = TcpListener::bind(format!("0.0.0.0:{}", settings.port)).await?;
    info!(
        "Listening on 0.0.0.0:{} (issuer {}, aptos {}, multiple keys {})",
        settings.port, settings.jwt_issuer, settings.aptos_network, settings.allow_multiple_keys
    );
    axum::serve(listener, app).await?;

    Ok(())
}
