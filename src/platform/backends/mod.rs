// src/platform/backends/mod.rs

//! Backend implementations of [`crate::platform::WindowBackend`].
//!
//! Only X11 is implemented; other platforms plug in here behind the same trait.

#[cfg(test)]
pub mod mock;
pub mod x11;

pub use self::x11::X11Bridge;
