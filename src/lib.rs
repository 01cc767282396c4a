// src/lib.rs

//! Bridges an X11 window to an engine running on another thread.
//!
//! The window-owning thread opens the display, creates the window and polls
//! native events, translating each into a [`channel::NormalizedEvent`] stored
//! in a shared [`channel::EventChannel`]. The engine reads the channel at its
//! own cadence: it sees the latest event only, plus a lifecycle word that
//! turns to `Quit` when the user closes the window or `Fatal` when the window
//! could not be created.

pub mod channel;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod platform;
pub mod runner;

pub use channel::{ChannelState, EventChannel, EventKind, MouseButtonId, NormalizedEvent, Snapshot};
pub use error::BridgeError;
pub use lifecycle::Lifecycle;
pub use platform::backends::X11Bridge;
pub use platform::{NativeEventKind, WindowBackend};
pub use runner::BridgeThread;
