//! Authorization gate for inbound payload kinds.
//!
//! The decision table is closed: it is an exhaustive match over
//! [`PayloadKind`], so adding a kind without classifying it fails to
//! compile. Unknown kinds never reach this gate — they fail payload
//! parsing and are rejected before any decision is made.

use super::PayloadKind;

/// Decide whether a caller may send a payload of the given kind.
///
/// `Join`, `Leave` and `Message` are unrestricted; every other kind
/// requires the caller to be the room's host. The decision is pure and is
/// re-evaluated on every inbound payload, because host status can change
/// mid-session (host disconnect and rejoin, host transfer).
pub fn is_authorized(is_host: bool, kind: PayloadKind) -> bool {
    match kind {
        PayloadKind::Join | PayloadKind::Leave | PayloadKind::Message => true,
        PayloadKind::Kick | PayloadKind::End => is_host,
    }
}
