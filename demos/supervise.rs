//! # Example: Supervise a transcoder
//!
//! Runs a program under the watchdog, counts demuxed frames with a custom
//! subscriber and logs every event through `LogWriter`.
//!
//! The first argument is a JSON option bag, the rest is the argument vector:
//!
//! ## Run
//! ```bash
//! cargo run --example supervise --features logging -- \
//!     '{"name": "cam 1", "retry": 3, "stdout": "mjpeg"}' \
//!     -loglevel quiet -rtsp_transport tcp -i rtsp://cam1/stream \
//!     -f image2pipe -c mjpeg -q:v 8 pipe:1
//! ```
//! Without a real camera, `sh` makes a quick stand-in:
//! ```bash
//! cargo run --example supervise --features logging -- \
//!     '{"program": "sh", "retry": 2, "wait": 5, "stdout": "mjpeg"}' \
//!     -c "printf 'frame\377\331'; sleep 1; exit 1" sh
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use pipevisor::{Channel, Event, EventKind, LogWriter, Profile, Subscribe, Supervisor};

#[derive(Default)]
struct FrameCounter {
    frames: AtomicU64,
    bytes: AtomicU64,
}

impl FrameCounter {
    fn print_stats(&self) {
        println!();
        println!("Frames:");
        println!(" ├─► Count: {}", self.frames.load(Ordering::Relaxed));
        println!(" └─► Bytes: {}", self.bytes.load(Ordering::Relaxed));
    }
}

#[async_trait::async_trait]
impl Subscribe for FrameCounter {
    async fn on_event(&self, ev: &Event) {
        if let EventKind::Data {
            channel: Channel::Primary,
            payload,
        } = &ev.kind
        {
            self.frames.fetch_add(1, Ordering::Relaxed);
            self.bytes.fetch_add(payload.len() as u64, Ordering::Relaxed);
        }
    }

    fn name(&self) -> &'static str {
        "FrameCounter"
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let mut args = std::env::args().skip(1);
    let options: serde_json::Value = match args.next() {
        Some(raw) => serde_json::from_str(&raw)?,
        None => serde_json::json!({}),
    };
    let argv: Vec<String> = args.collect();

    let config = pipevisor::Config::from_options(&options, Profile::Standard);
    let counter = Arc::new(FrameCounter::default());

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new()), counter.clone()];
    let sup = Supervisor::builder(argv, config)
        .with_subscribers(subs)
        .build()?;

    let mut events = sup.subscribe();
    sup.start().await?;
    println!("supervising {} ({})", sup.name(), sup.params());

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            ev = events.recv() => match ev {
                Ok(ev) => {
                    if ev.as_lifecycle().is_some_and(|rec| rec.is_terminal()) {
                        break;
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(_) => break,
            },
        }
    }

    sup.stop().await;
    counter.print_stats();
    Ok(())
}
