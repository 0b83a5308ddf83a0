//! Domain layer: value objects, entities, the connection lifecycle and
//! the interfaces the core needs from its collaborators.

pub mod connection;
pub mod entity;
pub mod error;
pub mod rate_limit;
pub mod registry;
pub mod service;
pub mod value_object;

pub use connection::{
    ConnectionHandle, ConnectionState, OUTBOUND_QUEUE_CAPACITY, OutboundFrame, PusherChannel,
    PusherQueue, pusher_channel,
};
pub use entity::{ChatMessage, Room};
pub use error::{
    ConnectionStateError, IdentityError, MembershipError, PersistenceError, TransportError,
    ValueObjectError,
};
pub use rate_limit::{RateLimitPolicy, RateLimiter};
pub use registry::{ConnectionRegistry, Departure};
pub use service::{IdentityService, MembershipService, MessageRepository};
pub use value_object::{ConnectionId, MessageContent, MessageId, RoomId, ServerId, Username};
