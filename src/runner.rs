// src/runner.rs

//! Runs a bridge on its own thread.
//!
//! The native handle is created, polled and destroyed on the spawned thread;
//! the caller keeps only the shared [`EventChannel`] and a [`BridgeThread`] to
//! stop and join it.

use crate::channel::EventChannel;
use crate::config::Config;
use crate::error::BridgeError;
use crate::lifecycle::Lifecycle;
use crate::platform::backends::X11Bridge;
use crate::platform::WindowBackend;
use log::{error, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

const THREAD_NAME: &str = "x11-event-bridge";

/// Handle to a running bridge thread.
#[derive(Debug)]
pub struct BridgeThread {
    handle: JoinHandle<Lifecycle>,
    stop: Arc<AtomicBool>,
    channel: Arc<EventChannel>,
}

impl BridgeThread {
    /// Spawns a thread that opens a bridge with `open`, shows it and polls it
    /// until the channel leaves `Running` or [`BridgeThread::shutdown`] is
    /// called. Polls that find nothing sleep for `poll_interval`.
    pub fn spawn<B, F>(
        channel: Arc<EventChannel>,
        poll_interval: Duration,
        open: F,
    ) -> Result<Self, BridgeError>
    where
        B: WindowBackend,
        F: FnOnce(Arc<EventChannel>) -> Result<B, BridgeError> + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let handle = {
            let channel = Arc::clone(&channel);
            let stop = Arc::clone(&stop);
            thread::Builder::new()
                .name(THREAD_NAME.to_string())
                .spawn(move || run_bridge(channel, &stop, poll_interval, open))?
        };
        Ok(Self {
            handle,
            stop,
            channel,
        })
    }

    /// Spawns an X11 bridge using the window and bridge settings of `config`.
    pub fn spawn_x11(config: &Config, channel: Arc<EventChannel>) -> Result<Self, BridgeError> {
        let window_config = config.window.clone();
        Self::spawn(channel, config.bridge.poll_interval(), move |channel| {
            X11Bridge::open(&window_config, channel)
        })
    }

    pub fn channel(&self) -> &Arc<EventChannel> {
        &self.channel
    }

    /// Asks the bridge thread to destroy its window and exit after the
    /// current poll.
    pub fn shutdown(&self) {
        self.stop.store(true, Ordering::Release);
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the thread and returns the lifecycle state it ended in.
    pub fn join(self) -> Lifecycle {
        match self.handle.join() {
            Ok(lifecycle) => lifecycle,
            Err(_) => {
                error!("Bridge thread panicked.");
                self.channel.write_fatal("Bridge thread panicked");
                Lifecycle::Fatal
            }
        }
    }
}

fn step(lifecycle: &mut Lifecycle, to: Lifecycle) {
    if let Err(e) = lifecycle.advance(to) {
        error!("{}", e);
    }
}

fn run_bridge<B, F>(
    channel: Arc<EventChannel>,
    stop: &AtomicBool,
    poll_interval: Duration,
    open: F,
) -> Lifecycle
where
    B: WindowBackend,
    F: FnOnce(Arc<EventChannel>) -> Result<B, BridgeError>,
{
    let mut lifecycle = Lifecycle::Uninitialized;
    step(&mut lifecycle, Lifecycle::Opening);

    let mut bridge = match open(Arc::clone(&channel)) {
        Ok(bridge) => bridge,
        Err(e) => {
            error!("Bridge failed to open: {}", e);
            // Backends report their own failure; cover factories that don't.
            if channel.is_running() {
                channel.write_fatal(&e.to_string());
            }
            step(&mut lifecycle, Lifecycle::Fatal);
            return lifecycle;
        }
    };
    step(&mut lifecycle, Lifecycle::Running);

    if bridge.show_until(poll_interval, || stop.load(Ordering::Acquire)) {
        info!("Bridge window shown; entering poll loop.");
    }

    while channel.is_running() {
        if stop.load(Ordering::Acquire) {
            info!("Bridge shutdown requested.");
            break;
        }
        let kind = bridge.poll();
        bridge.poll_controller();
        if kind.is_none() {
            thread::sleep(poll_interval);
        }
    }
    if !channel.is_running() {
        info!("Channel left Running ({:?}).", channel.state());
    }

    step(&mut lifecycle, Lifecycle::Closing);
    bridge.destroy();
    step(&mut lifecycle, Lifecycle::Destroyed);
    if !matches!(lifecycle, Lifecycle::Destroyed) {
        warn!("Bridge thread ended in {:?}.", lifecycle);
    }
    lifecycle
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{ChannelState, EventKind, MouseButtonId, NormalizedEvent};
    use crate::config::WindowConfig;
    use crate::platform::backends::mock::{
        EventQueue, MockBackend, MockStats, MOCK_WINDOW_ID, UNREACHABLE_DISPLAY,
    };
    use std::time::Instant;

    const TICK: Duration = Duration::from_millis(1);

    fn wait_for(what: &str, mut condition: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !condition() {
            assert!(Instant::now() < deadline, "timed out waiting for {}", what);
            thread::sleep(TICK);
        }
    }

    fn spawn_mock(
        channel: &Arc<EventChannel>,
        queue: &EventQueue,
        stats: &Arc<MockStats>,
        config: WindowConfig,
    ) -> BridgeThread {
        let queue = Arc::clone(queue);
        let stats = Arc::clone(stats);
        BridgeThread::spawn(Arc::clone(channel), TICK, move |channel| {
            MockBackend::with_queue(&config, channel, queue, stats)
        })
        .expect("spawn bridge thread")
    }

    #[test_log::test]
    fn test_bridge_thread_delivers_events_until_quit() {
        let channel = Arc::new(EventChannel::new());
        let queue = MockBackend::queue([NormalizedEvent::expose()]);
        let stats = Arc::new(MockStats::default());
        let bridge = spawn_mock(&channel, &queue, &stats, WindowConfig::default());

        wait_for("window publish", || channel.published_window().is_some());
        assert_eq!(channel.published_window(), Some(MOCK_WINDOW_ID));
        wait_for("initial expose", || {
            channel.latest().event.kind == EventKind::Expose
        });

        queue
            .lock()
            .unwrap()
            .push_back(NormalizedEvent::key(EventKind::KeyDown, 0x61));
        wait_for("key down", || channel.latest().event.kind == EventKind::KeyDown);
        assert_eq!(channel.latest().event.key, 0x61);

        queue.lock().unwrap().push_back(NormalizedEvent::mouse(
            EventKind::MouseDown,
            MouseButtonId::Left,
            10,
            20,
        ));
        wait_for("mouse down", || {
            channel.latest().event.kind == EventKind::MouseDown
        });
        let slot = channel.latest().event;
        assert_eq!((slot.button, slot.x, slot.y), (MouseButtonId::Left, 10, 20));

        queue.lock().unwrap().push_back(NormalizedEvent::close());
        assert_eq!(bridge.join(), Lifecycle::Destroyed);
        assert_eq!(channel.state(), ChannelState::Quit);
        assert!(stats.destroyed.load(Ordering::Acquire));
        assert!(stats.controller_polls.load(Ordering::Relaxed) > 0);
    }

    #[test_log::test]
    fn test_failed_open_is_fatal_without_destroy() {
        let channel = Arc::new(EventChannel::new());
        let queue = MockBackend::queue([]);
        let stats = Arc::new(MockStats::default());
        let config = WindowConfig {
            display: Some(UNREACHABLE_DISPLAY.to_string()),
            ..WindowConfig::default()
        };
        let bridge = spawn_mock(&channel, &queue, &stats, config);

        assert_eq!(bridge.join(), Lifecycle::Fatal);
        assert_eq!(channel.state(), ChannelState::Fatal);
        assert_eq!(
            channel.fatal_message().as_deref(),
            Some("Failed to open display")
        );
        assert_eq!(channel.published_window(), None);
        assert!(!stats.destroyed.load(Ordering::Acquire));
        assert_eq!(stats.polls.load(Ordering::Relaxed), 0);
    }

    #[test_log::test]
    fn test_factory_error_without_channel_report_is_made_fatal() {
        let channel = Arc::new(EventChannel::new());
        let bridge = BridgeThread::spawn(Arc::clone(&channel), TICK, |_channel| {
            Err::<MockBackend, _>(BridgeError::CreateWindow)
        })
        .unwrap();

        assert_eq!(bridge.join(), Lifecycle::Fatal);
        assert_eq!(
            channel.fatal_message().as_deref(),
            Some("Failed to create window")
        );
    }

    #[test_log::test]
    fn test_shutdown_destroys_running_bridge() {
        let channel = Arc::new(EventChannel::new());
        let queue = MockBackend::queue([NormalizedEvent::expose()]);
        let stats = Arc::new(MockStats::default());
        let bridge = spawn_mock(&channel, &queue, &stats, WindowConfig::default());

        wait_for("initial expose", || channel.latest().seq > 0);
        bridge.shutdown();
        wait_for("thread exit", || bridge.is_finished());

        assert_eq!(bridge.join(), Lifecycle::Destroyed);
        assert!(stats.destroyed.load(Ordering::Acquire));
        assert_eq!(channel.state(), ChannelState::Running);
    }

    #[test_log::test]
    fn test_close_before_first_redraw_still_destroys() {
        let channel = Arc::new(EventChannel::new());
        let queue = MockBackend::queue([NormalizedEvent::close()]);
        let stats = Arc::new(MockStats::default());
        let bridge = spawn_mock(&channel, &queue, &stats, WindowConfig::default());

        wait_for("quit", || channel.state() == ChannelState::Quit);
        bridge.shutdown();
        wait_for("thread exit", || bridge.is_finished());

        assert_eq!(bridge.join(), Lifecycle::Destroyed);
        assert!(stats.destroyed.load(Ordering::Acquire));
    }

    #[test_log::test]
    fn test_shutdown_while_waiting_for_first_redraw() {
        let channel = Arc::new(EventChannel::new());
        let queue = MockBackend::queue([]);
        let stats = Arc::new(MockStats::default());
        let bridge = spawn_mock(&channel, &queue, &stats, WindowConfig::default());

        wait_for("first poll", || stats.polls.load(Ordering::Relaxed) > 0);
        bridge.shutdown();
        wait_for("thread exit", || bridge.is_finished());

        assert_eq!(bridge.join(), Lifecycle::Destroyed);
        assert!(stats.destroyed.load(Ordering::Acquire));
        assert_eq!(channel.state(), ChannelState::Running);
    }

    #[test_log::test]
    fn test_channel_reusable_across_bridge_lifetimes() {
        let mut channel = Arc::new(EventChannel::new());
        for _ in 0..3 {
            let queue = MockBackend::queue([NormalizedEvent::expose(), NormalizedEvent::close()]);
            let stats = Arc::new(MockStats::default());
            let bridge = spawn_mock(&channel, &queue, &stats, WindowConfig::default());
            assert_eq!(bridge.join(), Lifecycle::Destroyed);
            assert_eq!(channel.state(), ChannelState::Quit);
            assert!(stats.destroyed.load(Ordering::Acquire));

            Arc::get_mut(&mut channel)
                .expect("bridge thread released the channel")
                .reset();
        }
    }
}
