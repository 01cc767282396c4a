// src/platform/platform_trait.rs
//
// Defines the `WindowBackend` trait every native windowing backend implements.

use crate::channel::EventChannel;
use crate::config::WindowConfig;
use crate::error::BridgeError;
use log::debug;
use std::sync::Arc;
use std::time::Duration;

/// Sleep between empty polls while waiting for the first redraw.
const SHOW_IDLE: Duration = Duration::from_millis(1);

/// The platform's own classification of a polled event (the X11 event type on
/// X11). [`NativeEventKind::NONE`] means nothing was pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeEventKind(pub i32);

impl NativeEventKind {
    pub const NONE: NativeEventKind = NativeEventKind(0);

    #[inline]
    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    #[inline]
    pub fn raw(self) -> i32 {
        self.0
    }
}

/// A native window bridge.
///
/// The value returned by `open` is the bridge handle: it owns the native
/// display connection and window, and shares the [`EventChannel`] with the
/// consumer. All methods must be called on the thread that called `open`.
pub trait WindowBackend: Sized {
    /// Native display connection handle.
    type Display;
    /// Native window identifier.
    type Window;

    /// Native kind of the event that marks the window as drawable.
    const REDRAW: NativeEventKind;

    /// Creates and maps the window. On failure the channel is left in
    /// `Fatal` with a diagnostic and no handle is returned.
    fn open(config: &WindowConfig, channel: Arc<EventChannel>) -> Result<Self, BridgeError>;

    /// Translates at most one pending event into the channel. Never blocks;
    /// returns [`NativeEventKind::NONE`] when nothing was pending.
    fn poll(&mut self) -> NativeEventKind;

    /// Controller input is not implemented by any backend yet.
    fn poll_controller(&mut self) -> NativeEventKind {
        NativeEventKind::NONE
    }

    /// Waits for the first redraw, then drains whatever is already queued.
    ///
    /// Events consumed here are still translated into the channel. Returns
    /// early if the channel leaves `Running` (e.g. a close request arrives
    /// before the window is ever exposed).
    fn show(&mut self) {
        self.show_until(SHOW_IDLE, || false);
    }

    /// [`WindowBackend::show`], also giving up once `stop` returns true.
    /// Empty polls sleep for `idle`.
    ///
    /// Returns true if the first redraw was observed.
    fn show_until<S>(&mut self, idle: Duration, stop: S) -> bool
    where
        S: Fn() -> bool,
    {
        let mut drained = 0usize;
        loop {
            if !self.channel().is_running() || stop() {
                debug!(
                    "Show abandoned before first redraw ({:?}); {} events drained.",
                    self.channel().state(),
                    drained
                );
                return false;
            }
            let kind = self.poll();
            if kind == Self::REDRAW {
                break;
            }
            if kind.is_none() {
                std::thread::sleep(idle);
            } else {
                drained += 1;
            }
        }
        while self.channel().is_running() && !self.poll().is_none() {
            drained += 1;
        }
        debug!("Window shown; {} startup events drained.", drained);
        true
    }

    /// Releases the window and the display connection.
    fn destroy(self);

    fn display(&self) -> Self::Display;

    fn window(&self) -> Self::Window;

    /// The channel this bridge writes to.
    fn channel(&self) -> &EventChannel;
}
