// src/platform/backends/x11/window.rs
#![allow(non_snake_case)] // Allow non-snake case for X11 types

use super::connection::Connection;
use super::EVENT_MASK;
use crate::config::WindowConfig;
use crate::error::BridgeError;
use log::{debug, info, warn};
use std::ffi::CString;

// X11 library imports
use libc::{c_int, c_uint};
use x11::xlib;

/// An X11 window plus the close-protocol token registered for it.
///
/// The window is destroyed by [`Window::destroy`], which the owner must call
/// while the `Connection` is still open.
#[derive(Debug)]
pub struct Window {
    id: xlib::Window,
    /// `WM_DELETE_WINDOW`; a `ClientMessage` carrying it is a close request.
    wm_delete_window: xlib::Atom,
}

impl Window {
    /// Creates a simple window with the configured size and position, black
    /// border and foreground, white background. Not yet mapped.
    pub fn create(connection: &Connection, config: &WindowConfig) -> Result<Self, BridgeError> {
        info!(
            "Creating X11 window: {}x{}px at ({}, {})",
            config.width, config.height, config.x, config.y
        );
        // SAFETY: connection holds a valid display; root window and pixel
        // values come from its default screen.
        let id = unsafe {
            xlib::XCreateSimpleWindow(
                connection.display(),
                connection.root_window(),
                config.x as c_int,
                config.y as c_int,
                config.width.max(1) as c_uint,
                config.height.max(1) as c_uint,
                config.border_width as c_uint,
                connection.black_pixel(),
                connection.white_pixel(),
            )
        };
        if id == 0 {
            return Err(BridgeError::CreateWindow);
        }
        debug!("X window created (ID: {})", id);

        Ok(Self {
            id,
            wm_delete_window: 0,
        })
    }

    #[inline]
    pub fn id(&self) -> xlib::Window {
        self.id
    }

    #[inline]
    pub fn wm_delete_window(&self) -> xlib::Atom {
        self.wm_delete_window
    }

    /// Sets the window title, the icon name and `_NET_WM_NAME` (UTF-8).
    pub fn set_title(&self, connection: &Connection, title: &str) -> Result<(), BridgeError> {
        let title_c_str = CString::new(title).map_err(|_| BridgeError::InvalidTitle)?;
        let display = connection.display();
        // SAFETY: valid display and window; title_c_str outlives the calls.
        unsafe {
            xlib::XStoreName(display, self.id, title_c_str.as_ptr());
            xlib::XSetIconName(display, self.id, title_c_str.as_ptr());
        }

        let net_wm_name = connection.intern_atom("_NET_WM_NAME");
        let utf8_string = connection.intern_atom("UTF8_STRING");
        if net_wm_name != 0 && utf8_string != 0 {
            // SAFETY: as above; format 8 matches the byte buffer.
            unsafe {
                xlib::XChangeProperty(
                    display,
                    self.id,
                    net_wm_name,
                    utf8_string,
                    8,
                    xlib::PropModeReplace,
                    title_c_str.as_ptr() as *const u8,
                    title_c_str.as_bytes().len() as c_int,
                );
            }
        }
        debug!("Window title set to: {}", title);
        Ok(())
    }

    /// Subscribes to the event classes the translator understands.
    pub fn select_input(&self, connection: &Connection) {
        // SAFETY: valid display and window.
        unsafe {
            xlib::XSelectInput(connection.display(), self.id, EVENT_MASK);
        }
    }

    /// Registers for `WM_DELETE_WINDOW` through `WM_PROTOCOLS` and remembers
    /// the atom as this window's close-protocol token.
    pub fn register_close_protocol(&mut self, connection: &Connection) {
        self.wm_delete_window = connection.intern_atom("WM_DELETE_WINDOW");
        if self.wm_delete_window == 0 {
            warn!("Failed to intern WM_DELETE_WINDOW. Close requests will not be detected.");
            return;
        }
        let mut protocols = [self.wm_delete_window];
        // SAFETY: valid display and window; protocols outlives the call.
        let status = unsafe {
            xlib::XSetWMProtocols(connection.display(), self.id, protocols.as_mut_ptr(), 1)
        };
        if status == 0 {
            warn!("XSetWMProtocols failed. Close requests will not be detected.");
        } else {
            debug!("WM_PROTOCOLS (WM_DELETE_WINDOW) registered.");
        }
    }

    /// Maps the window and flushes so the request reaches the server.
    pub fn map_and_flush(&self, connection: &Connection) {
        info!("Mapping window ID: {} and flushing display.", self.id);
        // SAFETY: valid display and window.
        unsafe {
            xlib::XMapWindow(connection.display(), self.id);
        }
        connection.flush();
    }

    /// Destroys the window. Calling it again is a no-op.
    pub fn destroy(&mut self, connection: &Connection) {
        if self.id == 0 {
            return;
        }
        info!("Destroying X11 window ID: {}", self.id);
        // SAFETY: valid display; id is a live window created on it.
        unsafe {
            xlib::XDestroyWindow(connection.display(), self.id);
        }
        connection.flush();
        self.id = 0;
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        if self.id != 0 {
            warn!(
                "Window ID {} dropped without destroy(); the server releases it when the display closes.",
                self.id
            );
        }
    }
}
