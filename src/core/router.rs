//! # ChannelRouter: per-spawn channel wiring.
//!
//! Attaching a router to a fresh process starts one reader task per readable
//! channel and one writer task for the input channel. Reader tasks only move
//! chunks; demuxing happens in [`ChannelRouter::route`], called by the actor in
//! arrival order.
//!
//! ## Architecture
//! ```text
//! pipe:0 ─► reader ─┐
//! pipe:1 ─► reader ─┼─► [chunk queue] ─► next_chunk() ─► route(channel, chunk)
//! pipe:2 ─► reader ─┘                                     ├─ Passthrough → chunk
//!                                                         └─ FrameDemuxer::feed
//! write_input ─► [input queue] ─► writer ─► pipe:0
//! ```
//!
//! ## Rules
//! - Chunks of one channel keep their order (one reader, one FIFO queue)
//! - `detach()` is synchronous: the chunk queue is dropped on the spot, so nothing
//!   read from a detached process can reach `route()` afterwards
//! - Demux buffers are cleared on detach and never shared across channels
//! - Output read before the process exited is drained (bounded by a grace period)
//!   before the exit is classified

use std::time::Duration;

use bytes::Bytes;
use futures::StreamExt;
use tokio::io::{AsyncRead, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tokio_util::io::ReaderStream;
use tokio_util::sync::CancellationToken;

use super::process::{ChannelStreams, ChannelWriter};
use crate::channel::Channel;
use crate::demux::{ChannelMode, FrameDemuxer};

const READ_CHUNK_SIZE: usize = 64 * 1024;
const CHUNK_QUEUE_CAPACITY: usize = 64;

/// Per-channel republishing strategy.
#[derive(Debug)]
enum Pipeline {
    Passthrough,
    Demux(FrameDemuxer),
}

impl Pipeline {
    fn new(mode: ChannelMode) -> Self {
        match mode {
            ChannelMode::Passthrough => Pipeline::Passthrough,
            ChannelMode::Demux(marker) => Pipeline::Demux(FrameDemuxer::new(marker)),
        }
    }

    fn route(&mut self, chunk: Bytes) -> Option<Bytes> {
        match self {
            Pipeline::Passthrough => Some(chunk),
            Pipeline::Demux(demux) => demux.feed(chunk),
        }
    }

    fn clear(&mut self) {
        if let Pipeline::Demux(demux) = self {
            demux.clear();
        }
    }
}

/// Wires the channels of one process instance.
pub(crate) struct ChannelRouter {
    pipelines: [Pipeline; 3],
    chunks: Option<mpsc::Receiver<(Channel, Bytes)>>,
    input: Option<mpsc::Sender<Bytes>>,
    token: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl ChannelRouter {
    /// A router with nothing attached.
    pub fn idle(modes: [ChannelMode; 3]) -> Self {
        Self {
            pipelines: modes.map(Pipeline::new),
            chunks: None,
            input: None,
            token: CancellationToken::new(),
            tasks: Vec::new(),
        }
    }

    /// Starts reading (and writing) the channels of a freshly spawned process.
    pub fn attach(modes: [ChannelMode; 3], streams: ChannelStreams, input_capacity: usize) -> Self {
        let mut router = Self::idle(modes);
        let (chunk_tx, chunk_rx) = mpsc::channel(CHUNK_QUEUE_CAPACITY);
        let (input_tx, input_rx) = mpsc::channel(input_capacity.max(1));

        let ChannelStreams {
            input_reader,
            input_writer,
            primary,
            secondary,
        } = streams;

        if let Some(reader) = input_reader {
            router.spawn_reader(Channel::Input, reader, chunk_tx.clone());
        }
        router.spawn_reader(Channel::Primary, primary, chunk_tx.clone());
        router.spawn_reader(Channel::Secondary, secondary, chunk_tx);

        let token = router.token.clone();
        router
            .tasks
            .push(tokio::spawn(write_input(input_writer, input_rx, token)));

        router.chunks = Some(chunk_rx);
        router.input = Some(input_tx);
        router
    }

    fn spawn_reader<R>(&mut self, channel: Channel, reader: R, tx: mpsc::Sender<(Channel, Bytes)>)
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let token = self.token.clone();
        self.tasks
            .push(tokio::spawn(read_channel(channel, reader, tx, token)));
    }

    /// Next chunk from any channel. Never completes while detached or drained.
    pub async fn next_chunk(&mut self) -> (Channel, Bytes) {
        if let Some(rx) = self.chunks.as_mut() {
            if let Some(item) = rx.recv().await {
                return item;
            }
            // Every reader reached EOF.
            self.chunks = None;
        }
        std::future::pending().await
    }

    /// Runs one chunk through its channel's pipeline.
    pub fn route(&mut self, channel: Channel, chunk: Bytes) -> Option<Bytes> {
        self.pipelines[channel.index()].route(chunk)
    }

    /// Sender feeding the input channel, while attached.
    pub fn input(&self) -> Option<mpsc::Sender<Bytes>> {
        self.input.clone()
    }

    /// Routes what the readers still deliver after the process exited, until
    /// every reader reached EOF or `grace` elapsed. Payloads keep arrival order.
    pub async fn drain(&mut self, grace: Duration) -> Vec<(Channel, Bytes)> {
        let mut out = Vec::new();
        let Some(rx) = self.chunks.as_mut() else {
            return out;
        };
        let deadline = Instant::now() + grace;
        while let Ok(Some((channel, chunk))) = time::timeout_at(deadline, rx.recv()).await {
            if let Some(payload) = self.pipelines[channel.index()].route(chunk) {
                out.push((channel, payload));
            }
        }
        out
    }

    /// Tears all listeners down and clears the demux buffers. Idempotent.
    pub fn detach(&mut self) {
        self.chunks = None;
        self.input = None;
        self.token.cancel();
        for task in self.tasks.drain(..) {
            task.abort();
        }
        for pipeline in &mut self.pipelines {
            pipeline.clear();
        }
    }
}

impl Drop for ChannelRouter {
    fn drop(&mut self) {
        self.detach();
    }
}

async fn read_channel<R>(
    channel: Channel,
    reader: R,
    tx: mpsc::Sender<(Channel, Bytes)>,
    token: CancellationToken,
) where
    R: AsyncRead + Unpin,
{
    let mut stream = ReaderStream::with_capacity(reader, READ_CHUNK_SIZE);
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            item = stream.next() => match item {
                Some(Ok(chunk)) => {
                    if tx.send((channel, chunk)).await.is_err() {
                        break;
                    }
                }
                Some(Err(err)) => {
                    tracing::debug!(%channel, error = %err, "channel read failed");
                    break;
                }
                None => break,
            },
        }
    }
}

async fn write_input(
    mut writer: ChannelWriter,
    mut rx: mpsc::Receiver<Bytes>,
    token: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            data = rx.recv() => match data {
                Some(data) => {
                    if let Err(err) = writer.write_all(&data).await {
                        tracing::debug!(error = %err, "input write failed");
                        break;
                    }
                }
                None => break,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn streams(
        primary: tokio::io::DuplexStream,
        secondary: tokio::io::DuplexStream,
        input: tokio::io::DuplexStream,
    ) -> ChannelStreams {
        ChannelStreams {
            input_reader: None,
            input_writer: Box::pin(input),
            primary: Box::pin(primary),
            secondary: Box::pin(secondary),
        }
    }

    #[test]
    fn test_route_per_mode() {
        let mut router = ChannelRouter::idle([
            ChannelMode::Passthrough,
            ChannelMode::Demux([0xFF, 0xD9]),
            ChannelMode::Passthrough,
        ]);
        assert!(router.input().is_none());

        let raw = Bytes::from_static(b"raw");
        assert_eq!(router.route(Channel::Input, raw.clone()), Some(raw));
        assert_eq!(router.route(Channel::Primary, Bytes::from_static(b"AB")), None);
        let frame = router
            .route(Channel::Primary, Bytes::from_static(b"\xFF\xD9"))
            .expect("frame");
        assert_eq!(&frame[..], b"AB\xFF\xD9");
    }

    #[test]
    fn test_detach_clears_buffers() {
        let mut router = ChannelRouter::idle([ChannelMode::Demux([0xFF, 0xD9]); 3]);
        assert_eq!(router.route(Channel::Secondary, Bytes::from_static(b"partial")), None);
        router.detach();
        let frame = router
            .route(Channel::Secondary, Bytes::from_static(b"x\xFF\xD9"))
            .expect("frame");
        assert_eq!(&frame[..], b"x\xFF\xD9");
    }

    #[tokio::test]
    async fn test_attached_router_reads_and_writes() {
        let (primary, mut primary_peer) = tokio::io::duplex(1024);
        let (secondary, _secondary_peer) = tokio::io::duplex(1024);
        let (input, mut input_peer) = tokio::io::duplex(1024);

        let mut router =
            ChannelRouter::attach([ChannelMode::Passthrough; 3], streams(primary, secondary, input), 4);
        assert!(router.input().is_some());

        primary_peer.write_all(b"hello").await.unwrap();
        let (channel, chunk) = router.next_chunk().await;
        assert_eq!(channel, Channel::Primary);
        assert_eq!(&chunk[..], b"hello");

        router.input().unwrap().send(Bytes::from_static(b"in")).await.unwrap();
        let mut buf = [0u8; 2];
        tokio::io::AsyncReadExt::read_exact(&mut input_peer, &mut buf)
            .await
            .unwrap();
        assert_eq!(&buf, b"in");

        router.detach();
        assert!(router.input().is_none());
    }

    #[tokio::test]
    async fn test_drain_delivers_output_written_before_exit() {
        let (primary, mut primary_peer) = tokio::io::duplex(1024);
        let (secondary, mut secondary_peer) = tokio::io::duplex(1024);
        let (input, _input_peer) = tokio::io::duplex(1024);

        let mut router = ChannelRouter::attach(
            [
                ChannelMode::Passthrough,
                ChannelMode::Demux([0xFF, 0xD9]),
                ChannelMode::Passthrough,
            ],
            streams(primary, secondary, input),
            4,
        );

        primary_peer.write_all(b"last\xFF\xD9").await.unwrap();
        secondary_peer.write_all(b"fatal: bad input").await.unwrap();
        drop(primary_peer);
        drop(secondary_peer);

        let drained = router.drain(Duration::from_secs(5)).await;
        assert_eq!(drained.len(), 2);
        assert!(drained
            .iter()
            .any(|(ch, p)| *ch == Channel::Primary && &p[..] == b"last\xFF\xD9"));
        assert!(drained
            .iter()
            .any(|(ch, p)| *ch == Channel::Secondary && &p[..] == b"fatal: bad input"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drain_is_bounded_by_grace() {
        let (primary, _primary_peer) = tokio::io::duplex(1024);
        let (secondary, _secondary_peer) = tokio::io::duplex(1024);
        let (input, _input_peer) = tokio::io::duplex(1024);

        let mut router =
            ChannelRouter::attach([ChannelMode::Passthrough; 3], streams(primary, secondary, input), 4);

        // Peers stay open, so no reader reaches EOF.
        let drained = router.drain(Duration::from_millis(200)).await;
        assert!(drained.is_empty());

        let mut idle = ChannelRouter::idle([ChannelMode::Passthrough; 3]);
        assert!(idle.drain(Duration::from_secs(1)).await.is_empty());
    }
}
