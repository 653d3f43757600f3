//! A timer whose effect owns an interval.
//!
//! The host loop sleeps on a `Notify` that the runtime's waker signals, so
//! the runtime only flushes when a tick has queued an update.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tracing_subscriber::EnvFilter;
use trellis_core::{Cleanup, Frame, Hooks, Host, RenderResult, Runtime, View};

struct Console;

impl Host for Console {
    fn commit(&mut self, frame: &Frame) {
        println!("{frame}");
    }
}

fn timer(hooks: &mut Hooks<'_>) -> RenderResult {
    let (seconds, set_seconds) = hooks.use_state(0u64)?;

    hooks.use_effect(seconds, move || {
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            interval.tick().await;
            loop {
                interval.tick().await;
                set_seconds.set(seconds + 1);
            }
        });
        Cleanup::new(move || task.abort())
    })?;

    Ok(View::text(format!("Seconds: {seconds}")))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let wake = Arc::new(Notify::new());
    let mut runtime = Runtime::new(timer);
    runtime.set_host(Console);

    let notify = Arc::clone(&wake);
    runtime.set_waker(move || notify.notify_one());

    let mut frame = runtime.run_until_idle()?;
    while !frame.contains("Seconds: 5") {
        wake.notified().await;
        frame = runtime.run_until_idle()?;
    }

    runtime.shutdown()?;
    Ok(())
}
