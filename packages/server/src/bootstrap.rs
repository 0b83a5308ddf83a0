//! Dependency wiring.
//!
//! Builds every layer in order (infrastructure → usecase → ui) and hands
//! back a ready-to-run [`Server`]. Used by the binary and by the
//! integration tests.

use std::sync::Arc;

use pingspace_shared::time::{Clock, SystemClock};

use crate::{
    config::ServerConfig,
    infrastructure::{
        directory::{InMemoryDirectory, SeedData, SeedError},
        identity::JwtIdentityService,
        rate_limiter::SlidingWindowRateLimiter,
        registry::InMemoryConnectionRegistry,
    },
    ui::Server,
    usecase::{
        BroadcastEngine, ConnectParticipantUseCase, DisconnectParticipantUseCase,
        GetRoomInfoUseCase, RoomAccessGate, SendMessageUseCase, TokenValidator,
    },
};

/// Load the directory named by `config.seed_path`, or an empty one
pub fn load_directory(
    config: &ServerConfig,
    clock: Arc<dyn Clock>,
) -> Result<InMemoryDirectory, SeedError> {
    match &config.seed_path {
        Some(path) => {
            let seed = SeedData::load(path)?;
            tracing::info!(
                path = %path.display(),
                servers = seed.servers.len(),
                rooms = seed.rooms.len(),
                "Directory seeded"
            );
            Ok(InMemoryDirectory::from_seed(seed, clock))
        }
        None => {
            tracing::warn!("No seed file given, starting with an empty directory");
            Ok(InMemoryDirectory::new(clock))
        }
    }
}

/// Wire the server around an existing directory and identity service
pub fn build_server(
    config: &ServerConfig,
    directory: Arc<InMemoryDirectory>,
    identity: Arc<JwtIdentityService>,
) -> Server {
    // 1. Infrastructure
    let registry = Arc::new(InMemoryConnectionRegistry::new());
    let rate_limiter = Arc::new(SlidingWindowRateLimiter::new(Arc::new(SystemClock)));

    // 2. UseCases
    let token_validator = TokenValidator::new(identity);
    let gate = RoomAccessGate::new(directory.clone());
    let broadcaster = Arc::new(BroadcastEngine::new(registry.clone()));

    let connect_participant_usecase = Arc::new(ConnectParticipantUseCase::new(
        token_validator.clone(),
        gate.clone(),
        registry.clone(),
        broadcaster.clone(),
    ));
    let disconnect_participant_usecase = Arc::new(DisconnectParticipantUseCase::new(
        registry.clone(),
        broadcaster.clone(),
    ));
    let send_message_usecase = Arc::new(SendMessageUseCase::new(
        rate_limiter,
        config.rate_limit,
        directory.clone(),
        broadcaster,
    ));
    let get_room_info_usecase = Arc::new(GetRoomInfoUseCase::new(
        token_validator,
        gate,
        registry,
        directory,
    ));

    // 3. Server
    Server::new(
        connect_participant_usecase,
        disconnect_participant_usecase,
        send_message_usecase,
        get_room_info_usecase,
    )
}
