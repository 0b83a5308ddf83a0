//! Handshake-time admission: Token Validator and Room Access Gate.
//!
//! Membership is checked once, when the connection is opened. A membership
//! revoked afterwards takes effect only when the client reconnects.

use std::sync::Arc;

use crate::domain::{IdentityService, MembershipService, RoomId, Username};

use super::error::ConnectError;

/// A caller that passed both handshake checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    pub username: Username,
    pub room_id: RoomId,
}

/// Verifies session tokens through the Identity Service
#[derive(Clone)]
pub struct TokenValidator {
    identity: Arc<dyn IdentityService>,
}

impl TokenValidator {
    pub fn new(identity: Arc<dyn IdentityService>) -> Self {
        Self { identity }
    }

    /// A missing token is treated exactly like an invalid one.
    pub fn validate(&self, token: Option<&str>) -> Result<Username, ConnectError> {
        let token = token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ConnectError::InvalidToken("token is missing".to_string()))?;
        Ok(self.identity.verify(token)?)
    }
}

/// Confirms the room exists and the caller belongs to its owning server
#[derive(Clone)]
pub struct RoomAccessGate {
    membership: Arc<dyn MembershipService>,
}

impl RoomAccessGate {
    pub fn new(membership: Arc<dyn MembershipService>) -> Self {
        Self { membership }
    }

    pub async fn authorize(
        &self,
        room_id: &str,
        username: &Username,
    ) -> Result<RoomId, ConnectError> {
        let room_id = RoomId::new(room_id.to_string())
            .map_err(|_| ConnectError::RoomNotFound(room_id.to_string()))?;

        let server_id = self.membership.owner_server_of(&room_id).await?;
        if !self.membership.is_member(username, &server_id).await? {
            tracing::info!(
                username = %username,
                room_id = %room_id,
                server_id = %server_id,
                "Rejected: not a member of the owning server"
            );
            return Err(ConnectError::NotAMember);
        }

        Ok(room_id)
    }
}
