// src/platform/backends/x11/event.rs
#![allow(non_snake_case)] // Allow non-snake case for X11 types

//! Translation of one X11 event into the channel's event slot.
//!
//! | X11 event | slot |
//! |---|---|
//! | `Expose` | `Expose`, no payload |
//! | `KeyPress` / `KeyRelease` | `KeyDown` / `KeyUp` + keysym |
//! | `ButtonPress` / `ButtonRelease` | `MouseDown` / `MouseUp` + button, x, y |
//! | `MotionNotify` | `MouseMove` + x, y, button `None` |
//! | `ClientMessage` carrying the close token | `Close`, and `Quit` unless filtered |
//!
//! Anything else is returned to the caller without touching the slot.

use super::EVENT_MASK;
use crate::channel::{EventChannel, EventKind, MouseButtonId, NormalizedEvent};
use crate::platform::NativeEventKind;
use log::{info, trace};
use std::mem;

// X11 library imports
use libc::c_uint;
use x11::xlib;

/// Takes one pending event for `window` without blocking.
///
/// `ClientMessage` has no event-mask bit, so it is checked separately after
/// the masked events.
pub fn next_event(display: *mut xlib::Display, window: xlib::Window) -> Option<xlib::XEvent> {
    let mut event: xlib::XEvent = unsafe { mem::zeroed() };
    // SAFETY: display is valid for the caller's connection and event is a
    // writable XEvent.
    let found = unsafe {
        xlib::XCheckMaskEvent(display, EVENT_MASK, &mut event) != 0
            || xlib::XCheckTypedWindowEvent(display, window, xlib::ClientMessage, &mut event) != 0
    };
    found.then_some(event)
}

/// X11 core buttons 1..5 in protocol order.
pub fn map_button(button: c_uint) -> Option<MouseButtonId> {
    match button {
        xlib::Button1 => Some(MouseButtonId::Left),
        xlib::Button2 => Some(MouseButtonId::Middle),
        xlib::Button3 => Some(MouseButtonId::Right),
        xlib::Button4 => Some(MouseButtonId::Extra1),
        xlib::Button5 => Some(MouseButtonId::Extra2),
        _ => None,
    }
}

/// Writes the normalized form of `event` into `channel` and returns the
/// native event type.
///
/// `filtered` is the result of `XFilterEvent`; it only suppresses the quit
/// transition for close requests. `lookup_keysym` resolves key events (the
/// X11 backend passes `XLookupKeysym` with index 0).
pub fn translate_event<F>(
    event: &mut xlib::XEvent,
    filtered: bool,
    close_token: xlib::Atom,
    channel: &EventChannel,
    lookup_keysym: F,
) -> NativeEventKind
where
    F: FnOnce(&mut xlib::XKeyEvent) -> xlib::KeySym,
{
    // SAFETY: type_ is the shared discriminant of every XEvent variant.
    let event_type = unsafe { event.type_ };

    match event_type {
        xlib::Expose => {
            trace!("XEvent: Expose");
            channel.write_event(&NormalizedEvent::expose());
        }
        xlib::KeyPress | xlib::KeyRelease => {
            let kind = if event_type == xlib::KeyPress {
                EventKind::KeyDown
            } else {
                EventKind::KeyUp
            };
            // SAFETY: the discriminant says this is a key event.
            let keysym = lookup_keysym(unsafe { &mut event.key });
            trace!("XEvent: {:?} keysym 0x{:X}", kind, keysym);
            channel.write_event(&NormalizedEvent::key(kind, keysym as u64));
        }
        xlib::ButtonPress | xlib::ButtonRelease => {
            let kind = if event_type == xlib::ButtonPress {
                EventKind::MouseDown
            } else {
                EventKind::MouseUp
            };
            // SAFETY: the discriminant says this is a button event.
            let button_event = unsafe { event.button };
            // Unknown buttons keep whatever id the slot already holds; only
            // the coordinates are refreshed.
            let button = map_button(button_event.button)
                .unwrap_or_else(|| channel.latest().event.button);
            trace!(
                "XEvent: {:?} button {} -> {:?} at ({}, {})",
                kind,
                button_event.button,
                button,
                button_event.x,
                button_event.y
            );
            channel.write_event(&NormalizedEvent::mouse(
                kind,
                button,
                button_event.x,
                button_event.y,
            ));
        }
        xlib::MotionNotify => {
            // SAFETY: the discriminant says this is a motion event.
            let motion = unsafe { event.motion };
            trace!("XEvent: MotionNotify at ({}, {})", motion.x, motion.y);
            channel.write_event(&NormalizedEvent::mouse(
                EventKind::MouseMove,
                MouseButtonId::None,
                motion.x,
                motion.y,
            ));
        }
        xlib::ClientMessage => {
            // SAFETY: the discriminant says this is a client message.
            let protocol = unsafe { event.client_message.data.as_longs()[0] } as xlib::Atom;
            if close_token != 0 && protocol == close_token {
                channel.write_event(&NormalizedEvent::close());
                if filtered {
                    trace!("XEvent: close request consumed by input method filter");
                } else if channel.request_quit() {
                    info!("Window close requested; channel state set to Quit.");
                }
            } else {
                trace!("XEvent: ignoring ClientMessage with protocol {}", protocol);
            }
        }
        other => {
            trace!("XEvent: unhandled type {}", other);
        }
    }

    NativeEventKind(event_type)
}
