// src/platform/backends/x11/mod.rs

//! X11 implementation of [`WindowBackend`].
//!
//! `X11Bridge` is the opaque handle returned by `open`. It bundles the
//! submodules:
//! - `connection`: the display connection, closed on drop.
//! - `window`: window creation, title, input selection and the
//!   `WM_DELETE_WINDOW` close protocol.
//! - `event`: non-blocking retrieval of one event and its translation into
//!   the channel's event slot.
//!
//! Every call must happen on the thread that called `open`; the handle holds a
//! raw display pointer and is therefore neither `Send` nor `Sync`.

use crate::channel::EventChannel;
use crate::config::WindowConfig;
use crate::error::BridgeError;
use crate::platform::{NativeEventKind, WindowBackend};
use log::{error, info};
use std::sync::Arc;

use libc::c_long;
use x11::xlib;

pub mod connection;
pub mod event;
pub mod window;

use connection::Connection;
use window::Window;

/// Event classes the bridge subscribes to.
pub(crate) const EVENT_MASK: c_long = xlib::ExposureMask
    | xlib::KeyPressMask
    | xlib::KeyReleaseMask
    | xlib::ButtonPressMask
    | xlib::ButtonReleaseMask
    | xlib::PointerMotionMask;

/// Bridge handle for one X11 window.
#[derive(Debug)]
pub struct X11Bridge {
    // Field order matters: the window is destroyed in Drop before the
    // connection closes.
    window: Window,
    connection: Connection,
    channel: Arc<EventChannel>,
}

impl X11Bridge {
    fn fail(channel: &EventChannel, err: BridgeError) -> BridgeError {
        error!("X11 bridge failed to open: {}", err);
        channel.write_fatal(&err.to_string());
        err
    }

    /// Opens the display and creates, titles, subscribes and maps the window.
    ///
    /// On failure the reason is also written into `channel`, which moves to
    /// `Fatal`; no handle exists in that case. A channel that has already
    /// left `Running` is refused before the display is touched and keeps its
    /// state.
    pub fn open(config: &WindowConfig, channel: Arc<EventChannel>) -> Result<Self, BridgeError> {
        if !channel.is_running() {
            let err = BridgeError::ChannelNotRunning(channel.state());
            error!("X11 bridge refused to open: {}", err);
            return Err(err);
        }
        info!(
            "Opening X11 bridge '{}' ({}x{})",
            config.title, config.width, config.height
        );

        let connection = match Connection::open(config.display.as_deref()) {
            Ok(connection) => connection,
            Err(e) => return Err(Self::fail(&channel, e)),
        };
        let mut window = match Window::create(&connection, config) {
            Ok(window) => window,
            Err(e) => return Err(Self::fail(&channel, e)),
        };
        if let Err(e) = window.set_title(&connection, &config.title) {
            window.destroy(&connection);
            return Err(Self::fail(&channel, e));
        }
        window.select_input(&connection);
        window.register_close_protocol(&connection);
        window.map_and_flush(&connection);

        channel.publish_window(window.id() as u64);
        info!("X11 bridge running (window ID: {}).", window.id());

        Ok(Self {
            window,
            connection,
            channel,
        })
    }

    /// The close-protocol token registered for this window.
    pub fn close_token(&self) -> xlib::Atom {
        self.window.wm_delete_window()
    }
}

impl WindowBackend for X11Bridge {
    type Display = *mut xlib::Display;
    type Window = xlib::Window;

    const REDRAW: NativeEventKind = NativeEventKind(xlib::Expose);

    fn open(config: &WindowConfig, channel: Arc<EventChannel>) -> Result<Self, BridgeError> {
        X11Bridge::open(config, channel)
    }

    fn poll(&mut self) -> NativeEventKind {
        let Some(mut event) = event::next_event(self.connection.display(), self.window.id())
        else {
            return NativeEventKind::NONE;
        };
        // SAFETY: event was just filled in by Xlib.
        let filtered = unsafe { xlib::XFilterEvent(&mut event, 0) } != 0;
        event::translate_event(
            &mut event,
            filtered,
            self.window.wm_delete_window(),
            &self.channel,
            // SAFETY: key is a key event delivered by this display.
            |key| unsafe { xlib::XLookupKeysym(key, 0) },
        )
    }

    fn destroy(self) {
        info!("Destroying X11 bridge (window ID: {}).", self.window.id());
        drop(self);
    }

    fn display(&self) -> Self::Display {
        self.connection.display()
    }

    fn window(&self) -> Self::Window {
        self.window.id()
    }

    fn channel(&self) -> &EventChannel {
        &self.channel
    }
}

impl Drop for X11Bridge {
    fn drop(&mut self) {
        self.window.destroy(&self.connection);
        // `connection` closes the display when its own drop runs.
    }
}
