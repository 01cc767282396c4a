// src/channel.rs

//! The shared event channel between the window-owning thread and the consumer.
//!
//! The channel is a fixed-layout (`#[repr(C)]`) block with two regions:
//!
//! - a **control region**: the lifecycle [`ChannelState`] word, the declared
//!   message size, a bounded fatal diagnostic and the published window id.
//! - an **event slot**: one [`NormalizedEvent`], overwritten on every
//!   translated poll. There is no queue; a consumer that reads less often than
//!   events arrive only sees the latest one.
//!
//! Every field is an atomic, so the channel is `Sync` without a lock. The slot
//! is guarded by a sequence counter (odd while a write is in progress), which
//! also lets the consumer tell a fresh event from one it has already seen.
//!
//! # Memory ordering
//!
//! - State transitions are `Running -> Quit` or `Running -> Fatal` via
//!   `compare_exchange(AcqRel)`; a non-`Running` state never goes back.
//! - The fatal message is stored before the `Fatal` state is published, so a
//!   reader that observes `Fatal` with `Acquire` sees the whole message.
//! - Slot writes bump `seq` to odd, store the fields, then publish the even
//!   `seq` with `Release`. Readers retry until they see the same even `seq`
//!   before and after reading the fields.

use log::{debug, trace, warn};
use std::sync::atomic::{fence, AtomicI32, AtomicU32, AtomicU64, AtomicU8, Ordering};

/// Upper bound on the fatal diagnostic, in bytes.
pub const FATAL_MESSAGE_CAPACITY: usize = 256;

/// Lifecycle word stored in the control region.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Running = 0,
    Quit = 1,
    Fatal = 2,
}

impl ChannelState {
    fn from_raw(raw: u32) -> Self {
        match raw {
            0 => ChannelState::Running,
            1 => ChannelState::Quit,
            _ => ChannelState::Fatal,
        }
    }
}

/// Normalized event kind. The numeric values are part of the binary contract
/// with the consumer.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventKind {
    #[default]
    None = 0,
    Expose = 1,
    KeyDown = 2,
    KeyUp = 3,
    MouseDown = 4,
    MouseUp = 5,
    MouseMove = 6,
    Close = 7,
}

impl EventKind {
    pub fn from_raw(raw: i32) -> Option<Self> {
        Some(match raw {
            0 => EventKind::None,
            1 => EventKind::Expose,
            2 => EventKind::KeyDown,
            3 => EventKind::KeyUp,
            4 => EventKind::MouseDown,
            5 => EventKind::MouseUp,
            6 => EventKind::MouseMove,
            7 => EventKind::Close,
            _ => return None,
        })
    }
}

/// Mouse button identifier. `None` (-1) is the "no button" sentinel used by
/// pointer motion.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MouseButtonId {
    #[default]
    None = -1,
    Left = 0,
    Middle = 1,
    Right = 2,
    Extra1 = 3,
    Extra2 = 4,
}

impl MouseButtonId {
    /// Out-of-range values read back as the sentinel.
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            0 => MouseButtonId::Left,
            1 => MouseButtonId::Middle,
            2 => MouseButtonId::Right,
            3 => MouseButtonId::Extra1,
            4 => MouseButtonId::Extra2,
            _ => MouseButtonId::None,
        }
    }
}

/// A platform-independent event as stored in the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NormalizedEvent {
    pub kind: EventKind,
    /// Key symbol for `KeyDown`/`KeyUp`.
    pub key: u64,
    pub button: MouseButtonId,
    pub x: i32,
    pub y: i32,
}

impl NormalizedEvent {
    pub fn expose() -> Self {
        Self {
            kind: EventKind::Expose,
            ..Self::default()
        }
    }

    pub fn key(kind: EventKind, key: u64) -> Self {
        Self {
            kind,
            key,
            ..Self::default()
        }
    }

    pub fn mouse(kind: EventKind, button: MouseButtonId, x: i32, y: i32) -> Self {
        Self {
            kind,
            button,
            x,
            y,
            ..Self::default()
        }
    }

    pub fn close() -> Self {
        Self {
            kind: EventKind::Close,
            ..Self::default()
        }
    }
}

/// A consistent read of the event slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    /// Even sequence number of the write that produced `event`. Zero means the
    /// slot has never been written.
    pub seq: u64,
    pub event: NormalizedEvent,
}

#[repr(C)]
#[derive(Debug)]
struct EventSlot {
    seq: AtomicU64,
    kind: AtomicI32,
    key: AtomicU64,
    button: AtomicI32,
    x: AtomicI32,
    y: AtomicI32,
}

impl Default for EventSlot {
    fn default() -> Self {
        // Raw 0 is `Left`; an unwritten slot must read as "no button".
        Self {
            seq: AtomicU64::new(0),
            kind: AtomicI32::new(EventKind::None as i32),
            key: AtomicU64::new(0),
            button: AtomicI32::new(MouseButtonId::None as i32),
            x: AtomicI32::new(0),
            y: AtomicI32::new(0),
        }
    }
}

/// The shared region. Allocate one per bridge (or reuse one between bridge
/// lifetimes, see [`EventChannel::reset`]) and hand it over as an `Arc`.
#[repr(C)]
#[derive(Debug)]
pub struct EventChannel {
    state: AtomicU32,
    size: u32,
    message_len: AtomicU32,
    message: [AtomicU8; FATAL_MESSAGE_CAPACITY],
    window: AtomicU64,
    event: EventSlot,
}

impl Default for EventChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl EventChannel {
    /// A channel whose control region can hold the full diagnostic capacity.
    pub fn new() -> Self {
        Self::with_size(FATAL_MESSAGE_CAPACITY)
    }

    /// A channel whose control region declares `size` bytes for the fatal
    /// diagnostic. Clamped to `1..=FATAL_MESSAGE_CAPACITY`.
    pub fn with_size(size: usize) -> Self {
        Self {
            state: AtomicU32::new(ChannelState::Running as u32),
            size: size.clamp(1, FATAL_MESSAGE_CAPACITY) as u32,
            message_len: AtomicU32::new(0),
            message: std::array::from_fn(|_| AtomicU8::new(0)),
            window: AtomicU64::new(0),
            event: EventSlot::default(),
        }
    }

    /// Declared message size of the control region.
    pub fn size(&self) -> usize {
        self.size as usize
    }

    // --- Control region ---

    pub fn state(&self) -> ChannelState {
        ChannelState::from_raw(self.state.load(Ordering::Acquire))
    }

    pub fn is_running(&self) -> bool {
        self.state() == ChannelState::Running
    }

    fn transition(&self, to: ChannelState) -> bool {
        self.state
            .compare_exchange(
                ChannelState::Running as u32,
                to as u32,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Moves the channel to `Quit`. Returns false if it had already left
    /// `Running`, in which case the state is unchanged.
    pub fn request_quit(&self) -> bool {
        let changed = self.transition(ChannelState::Quit);
        if changed {
            debug!("Channel state -> Quit");
        }
        changed
    }

    /// Stores `message` (truncated to the declared size on a UTF-8 boundary)
    /// and moves the channel to `Fatal`.
    ///
    /// Returns false if the channel had already left `Running`.
    pub fn write_fatal(&self, message: &str) -> bool {
        if !self.is_running() {
            warn!(
                "Ignoring fatal message '{}': channel already in {:?}",
                message,
                self.state()
            );
            return false;
        }
        let mut len = message.len().min(self.size());
        while !message.is_char_boundary(len) {
            len -= 1;
        }
        for (cell, byte) in self.message.iter().zip(&message.as_bytes()[..len]) {
            cell.store(*byte, Ordering::Relaxed);
        }
        self.message_len.store(len as u32, Ordering::Relaxed);
        let changed = self.transition(ChannelState::Fatal);
        if changed {
            debug!("Channel state -> Fatal ({})", &message[..len]);
        }
        changed
    }

    /// The fatal diagnostic, if the channel is in `Fatal`.
    pub fn fatal_message(&self) -> Option<String> {
        if self.state() != ChannelState::Fatal {
            return None;
        }
        let len = self.message_len.load(Ordering::Relaxed) as usize;
        let bytes: Vec<u8> = self.message[..len]
            .iter()
            .map(|b| b.load(Ordering::Relaxed))
            .collect();
        Some(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Publishes the native window id once the bridge is open.
    pub fn publish_window(&self, window: u64) {
        self.window.store(window, Ordering::Release);
    }

    pub fn published_window(&self) -> Option<u64> {
        match self.window.load(Ordering::Acquire) {
            0 => None,
            id => Some(id),
        }
    }

    // --- Event slot ---

    /// Overwrites the slot. Only the window-owning thread calls this.
    pub fn write_event(&self, event: &NormalizedEvent) {
        let slot = &self.event;
        let seq = slot.seq.load(Ordering::Relaxed);
        slot.seq.store(seq.wrapping_add(1), Ordering::Relaxed);
        fence(Ordering::Release);

        slot.kind.store(event.kind as i32, Ordering::Relaxed);
        slot.key.store(event.key, Ordering::Relaxed);
        slot.button.store(event.button as i32, Ordering::Relaxed);
        slot.x.store(event.x, Ordering::Relaxed);
        slot.y.store(event.y, Ordering::Relaxed);

        slot.seq.store(seq.wrapping_add(2), Ordering::Release);
        trace!("Slot write #{}: {:?}", seq.wrapping_add(2), event);
    }

    /// Reads the slot, retrying while a write is in progress.
    pub fn latest(&self) -> Snapshot {
        let slot = &self.event;
        loop {
            let before = slot.seq.load(Ordering::Acquire);
            if before & 1 == 1 {
                std::hint::spin_loop();
                continue;
            }

            let kind = slot.kind.load(Ordering::Relaxed);
            let key = slot.key.load(Ordering::Relaxed);
            let button = slot.button.load(Ordering::Relaxed);
            let x = slot.x.load(Ordering::Relaxed);
            let y = slot.y.load(Ordering::Relaxed);

            fence(Ordering::Acquire);
            if slot.seq.load(Ordering::Relaxed) != before {
                continue;
            }

            return Snapshot {
                seq: before,
                event: NormalizedEvent {
                    kind: EventKind::from_raw(kind).unwrap_or_default(),
                    key,
                    button: MouseButtonId::from_raw(button),
                    x,
                    y,
                },
            };
        }
    }

    /// The latest snapshot, only if it is newer than `seen`.
    pub fn latest_since(&self, seen: u64) -> Option<Snapshot> {
        let snapshot = self.latest();
        (snapshot.seq != seen).then_some(snapshot)
    }

    /// Returns the channel to its freshly allocated state.
    ///
    /// Requires exclusive access, so no bridge can be attached; with an
    /// `Arc<EventChannel>` use `Arc::get_mut`.
    pub fn reset(&mut self) {
        *self.state.get_mut() = ChannelState::Running as u32;
        *self.message_len.get_mut() = 0;
        for byte in self.message.iter_mut() {
            *byte.get_mut() = 0;
        }
        *self.window.get_mut() = 0;
        self.event = EventSlot::default();
    }
}
