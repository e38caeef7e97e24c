//! Classification of received addressed frames.
//!
//! An addressed frame carries `payload[0] = destination` and
//! `payload[1] = source`. [`classify`] compares both against this node's id and
//! the reserved [`BROADCAST_ID`]. It never forwards anything itself; the
//! caller decides whether to consume, drop, or [`relay`](crate::driver::LinkDriver::relay).

use crate::consts::BROADCAST_ID;
use crate::frame::Frame;

/// Disposition of an addressed frame relative to this node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Route {
    /// Addressed to this node by another node.
    Mine,
    /// A broadcast this node sent, heard again.
    MyBroadcast,
    /// A unicast this node sent, looped back to it.
    Returned,
    /// A broadcast from another node.
    Broadcast,
    /// Traffic between two other nodes.
    OtherMsg,
}

impl Route {
    /// Whether the frame is meant for this node's application.
    pub const fn should_deliver(self) -> bool {
        matches!(self, Route::Mine | Route::Broadcast)
    }

    /// Whether a relaying node would pass the frame on.
    ///
    /// Frames that originated here are never relayed again.
    pub const fn should_relay(self) -> bool {
        matches!(self, Route::OtherMsg | Route::Broadcast)
    }
}

/// Classifies a destination/source pair for the node `my_id`.
pub const fn classify_ids(dst: u8, src: u8, my_id: u8) -> Route {
    if src == my_id {
        if dst == BROADCAST_ID {
            Route::MyBroadcast
        } else {
            Route::Returned
        }
    } else if dst == BROADCAST_ID {
        Route::Broadcast
    } else if dst == my_id {
        Route::Mine
    } else {
        Route::OtherMsg
    }
}

/// Classifies `frame` for the node `my_id` using its first two payload bytes.
///
/// The address bytes are read whether or not the DLC carries the addressed
/// flag; callers that mix addressed and plain traffic check
/// [`Dlc::is_addressed`](crate::frame::Dlc::is_addressed) first.
pub const fn classify(frame: &Frame, my_id: u8) -> Route {
    let payload = frame.payload();
    classify_ids(payload[0], payload[1], my_id)
}
