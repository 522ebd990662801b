//! Application services orchestrating the domain over the ports.

mod presence;
mod rooms;

pub use presence::PresenceTracker;
pub use rooms::{RoomService, RoomServiceError};
