// src/platform/backends/x11/connection.rs
#![allow(non_snake_case)] // Allow non-snake case for X11 types

use crate::error::BridgeError;
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use std::ffi::CString;
use std::ptr;

// X11 library imports
use libc::{c_int, c_ulong};
use x11::xlib;

/// Result of the one-time `XInitThreads` call. Several bridges may live on
/// different threads of the same process, each with its own display.
static XLIB_THREADS_READY: Lazy<bool> = Lazy::new(|| {
    // SAFETY: XInitThreads must run before any other Xlib call; forcing this
    // Lazy is the first thing `Connection::open` does.
    let ready = unsafe { xlib::XInitThreads() } != 0;
    if !ready {
        warn!("XInitThreads failed; Xlib is not thread-safe in this process.");
    }
    ready
});

/// Owns a raw `*mut xlib::Display` and closes it on drop.
#[derive(Debug)]
struct ManagedDisplay {
    ptr: *mut xlib::Display,
}

impl ManagedDisplay {
    /// Opens `name`, or `$DISPLAY` when `name` is `None`.
    fn open(name: Option<&str>) -> Result<Self, BridgeError> {
        let name = name
            .map(|n| CString::new(n).map_err(|_| BridgeError::OpenDisplay))
            .transpose()?;
        let name_ptr = name.as_ref().map_or(ptr::null(), |n| n.as_ptr());

        // SAFETY: name_ptr is null or a NUL-terminated string outliving the call.
        let display_ptr = unsafe { xlib::XOpenDisplay(name_ptr) };
        if display_ptr.is_null() {
            return Err(BridgeError::OpenDisplay);
        }
        debug!("X display opened: {:p}", display_ptr);
        Ok(Self { ptr: display_ptr })
    }
}

impl Drop for ManagedDisplay {
    fn drop(&mut self) {
        if self.ptr.is_null() {
            return;
        }
        info!("Closing X11 display connection: {:p}", self.ptr);
        // SAFETY: ptr came from XOpenDisplay and is closed exactly once.
        let status = unsafe { xlib::XCloseDisplay(self.ptr) };
        if status != 0 {
            warn!(
                "XCloseDisplay returned non-zero status: {}. Display may not have closed cleanly.",
                status
            );
        }
    }
}

/// Connection to the X server plus the default screen it was opened on.
///
/// The display is closed when the `Connection` is dropped. Anything created on
/// it (windows, atoms) must be released before that.
#[derive(Debug)]
pub struct Connection {
    managed_display: ManagedDisplay,
    screen: c_int,
}

impl Connection {
    /// Connects to the X server named by `display_name`, or by `$DISPLAY`.
    pub fn open(display_name: Option<&str>) -> Result<Self, BridgeError> {
        Lazy::force(&XLIB_THREADS_READY);
        info!(
            "Establishing X11 server connection ({}).",
            display_name.unwrap_or("$DISPLAY")
        );

        let managed_display = ManagedDisplay::open(display_name)?;
        // SAFETY: the display pointer is valid for the lifetime of managed_display.
        let screen = unsafe { xlib::XDefaultScreen(managed_display.ptr) };
        debug!("Default screen number: {}", screen);

        Ok(Connection {
            managed_display,
            screen,
        })
    }

    /// The raw display pointer. Valid until this `Connection` is dropped.
    #[inline]
    pub fn display(&self) -> *mut xlib::Display {
        self.managed_display.ptr
    }

    #[inline]
    pub fn screen(&self) -> c_int {
        self.screen
    }

    pub fn root_window(&self) -> xlib::Window {
        // SAFETY: valid display, default screen.
        unsafe { xlib::XRootWindow(self.display(), self.screen) }
    }

    pub fn black_pixel(&self) -> c_ulong {
        // SAFETY: valid display, default screen.
        unsafe { xlib::XBlackPixel(self.display(), self.screen) }
    }

    pub fn white_pixel(&self) -> c_ulong {
        // SAFETY: valid display, default screen.
        unsafe { xlib::XWhitePixel(self.display(), self.screen) }
    }

    /// Interns `name` (without trailing NUL), creating the atom if needed.
    pub fn intern_atom(&self, name: &str) -> xlib::Atom {
        match CString::new(name) {
            // SAFETY: valid display and NUL-terminated name.
            Ok(c_name) => unsafe {
                xlib::XInternAtom(self.display(), c_name.as_ptr(), xlib::False)
            },
            Err(_) => 0,
        }
    }

    pub fn flush(&self) {
        // SAFETY: valid display.
        unsafe {
            xlib::XFlush(self.display());
        }
    }
}
