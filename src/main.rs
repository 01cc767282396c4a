// src/main.rs

// Demo consumer: runs an X11 bridge on its own thread and logs every event
// that reaches the channel until the window is closed.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use log::{error, info};
use x11_event_bridge::{
    config::CONFIG, BridgeThread, ChannelState, EventChannel, EventKind,
};

/// How often the consumer reads the channel, roughly one frame at 60 Hz.
const CONSUMER_FRAME: Duration = Duration::from_millis(16);

fn main() -> anyhow::Result<()> {
    // Initialize the logger. Default filter is "info" if RUST_LOG is not set.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    info!("Starting x11-event-bridge demo...");
    let config = &*CONFIG;
    info!("Configuration: {:?}", config);

    let channel = Arc::new(EventChannel::with_size(config.bridge.message_size));
    let bridge = BridgeThread::spawn_x11(config, Arc::clone(&channel))
        .context("Failed to start bridge thread")?;

    let mut seen = 0;
    let mut window_reported = false;
    loop {
        match channel.state() {
            ChannelState::Running => {}
            ChannelState::Quit => {
                info!("Window closed by user.");
                break;
            }
            ChannelState::Fatal => {
                let message = channel.fatal_message().unwrap_or_default();
                error!("Bridge failed: {}", message);
                bridge.join();
                bail!("bridge failed: {}", message);
            }
        }

        if !window_reported {
            if let Some(window) = channel.published_window() {
                info!("Bridge window published: 0x{:x}", window);
                window_reported = true;
            }
        }

        if let Some(snapshot) = channel.latest_since(seen) {
            seen = snapshot.seq;
            let event = snapshot.event;
            match event.kind {
                EventKind::KeyDown | EventKind::KeyUp => {
                    info!("#{} {:?} keysym 0x{:x}", snapshot.seq, event.kind, event.key)
                }
                EventKind::MouseDown | EventKind::MouseUp | EventKind::MouseMove => info!(
                    "#{} {:?} {:?} at ({}, {})",
                    snapshot.seq, event.kind, event.button, event.x, event.y
                ),
                kind => info!("#{} {:?}", snapshot.seq, kind),
            }
        }

        std::thread::sleep(CONSUMER_FRAME);
    }

    let lifecycle = bridge.join();
    info!("Bridge thread finished in {:?}. Exiting.", lifecycle);
    Ok(())
}
