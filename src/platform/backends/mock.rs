// src/platform/backends/mock.rs

use crate::channel::{EventChannel, EventKind, NormalizedEvent};
use crate::config::WindowConfig;
use crate::error::BridgeError;
use crate::platform::{NativeEventKind, WindowBackend};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Display name that makes `MockBackend::open` fail like an unreachable server.
pub const UNREACHABLE_DISPLAY: &str = "mock:unreachable";

/// Window id the mock publishes into the channel.
pub const MOCK_WINDOW_ID: u64 = 0x4a0_0001;

/// Events waiting to be "delivered" by the mock, shared with the test.
pub type EventQueue = Arc<Mutex<VecDeque<NormalizedEvent>>>;

/// Observations the test can make after the backend is gone.
#[derive(Debug, Default)]
pub struct MockStats {
    pub destroyed: AtomicBool,
    pub polls: AtomicUsize,
    pub controller_polls: AtomicUsize,
}

/// Scripted backend. Native kinds are the normalized kind values, so
/// `REDRAW` is `EventKind::Expose`.
pub struct MockBackend {
    channel: Arc<EventChannel>,
    queue: EventQueue,
    stats: Arc<MockStats>,
}

impl MockBackend {
    pub fn with_queue(
        config: &WindowConfig,
        channel: Arc<EventChannel>,
        queue: EventQueue,
        stats: Arc<MockStats>,
    ) -> Result<Self, BridgeError> {
        if config.display.as_deref() == Some(UNREACHABLE_DISPLAY) {
            let err = BridgeError::OpenDisplay;
            channel.write_fatal(&err.to_string());
            return Err(err);
        }
        channel.publish_window(MOCK_WINDOW_ID);
        Ok(Self {
            channel,
            queue,
            stats,
        })
    }

    pub fn queue(events: impl IntoIterator<Item = NormalizedEvent>) -> EventQueue {
        Arc::new(Mutex::new(events.into_iter().collect()))
    }
}

impl WindowBackend for MockBackend {
    type Display = ();
    type Window = u64;

    const REDRAW: NativeEventKind = NativeEventKind(EventKind::Expose as i32);

    fn open(config: &WindowConfig, channel: Arc<EventChannel>) -> Result<Self, BridgeError> {
        Self::with_queue(
            config,
            channel,
            Self::queue([]),
            Arc::new(MockStats::default()),
        )
    }

    fn poll(&mut self) -> NativeEventKind {
        self.stats.polls.fetch_add(1, Ordering::Relaxed);
        let Some(event) = self.queue.lock().unwrap().pop_front() else {
            return NativeEventKind::NONE;
        };
        self.channel.write_event(&event);
        if event.kind == EventKind::Close {
            self.channel.request_quit();
        }
        NativeEventKind(event.kind as i32)
    }

    fn poll_controller(&mut self) -> NativeEventKind {
        self.stats.controller_polls.fetch_add(1, Ordering::Relaxed);
        NativeEventKind::NONE
    }

    fn destroy(self) {
        self.stats.destroyed.store(true, Ordering::Release);
    }

    fn display(&self) -> Self::Display {}

    fn window(&self) -> Self::Window {
        MOCK_WINDOW_ID
    }

    fn channel(&self) -> &EventChannel {
        &self.channel
    }
}
