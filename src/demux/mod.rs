//! Frame demultiplexing for image-pipe channels.
//!
//! A transcoder writing `image2pipe` output produces one continuous byte stream
//! per channel. This module reconstructs discrete still images from it by
//! looking for the codec's 2-byte end-of-image marker at the tail of each chunk.
//!
//! ## Contents
//! - [`Codec`] codec names and their trailing markers
//! - [`ChannelMode`] per-channel routing choice (passthrough or demux)
//! - [`FrameDemuxer`] per-channel accumulator
//!
//! ## Quick wiring
//! ```text
//! Config { channels: [ChannelMode; 3] }
//!      └─► core::router::ChannelRouter builds, per spawn:
//!           - ChannelMode::Passthrough  → chunks republished unchanged
//!           - ChannelMode::Demux(marker) → FrameDemuxer::feed(chunk)
//! ```

mod codec;
mod demuxer;

pub use codec::{ChannelMode, Codec, Marker};
pub use demuxer::FrameDemuxer;
