// src/error.rs

use crate::channel::ChannelState;
use crate::lifecycle::Lifecycle;
use thiserror::Error;

/// Errors surfaced to the thread that drives a bridge.
///
/// Initialization failures are also written into the channel's control
/// region, since the consumer thread never sees this return value.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Failed to open display")]
    OpenDisplay,
    #[error("Failed to create window")]
    CreateWindow,
    #[error("Channel is not running ({0:?})")]
    ChannelNotRunning(ChannelState),
    #[error("Window title contains an interior NUL byte")]
    InvalidTitle,
    #[error("Illegal lifecycle transition from {from:?} to {to:?}")]
    Lifecycle { from: Lifecycle, to: Lifecycle },
    #[error("Failed to spawn bridge thread: {0}")]
    ThreadSpawn(#[from] std::io::Error),
}
