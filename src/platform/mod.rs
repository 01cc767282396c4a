// src/platform/mod.rs
//
// Native windowing backends and the contract they share.

pub mod backends;
pub mod platform_trait;

pub use platform_trait::{NativeEventKind, WindowBackend};
