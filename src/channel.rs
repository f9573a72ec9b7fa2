//! Channel identities.
//!
//! Exactly three byte channels connect the supervisor with the external process,
//! numbered the way the transcoder addresses them (`pipe:0`, `pipe:1`, `pipe:2`).
//! Which channel carries what is decided by the caller's argument vector.

use std::fmt;

/// One of the three process channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Channel {
    /// `pipe:0` (stdin). The caller writes to it; on unix the process may write back.
    Input = 0,
    /// `pipe:1` (stdout).
    Primary = 1,
    /// `pipe:2` (stderr).
    Secondary = 2,
}

impl Channel {
    /// All channels, in descriptor order.
    pub const ALL: [Channel; 3] = [Channel::Input, Channel::Primary, Channel::Secondary];

    /// Index into per-channel arrays (equals the descriptor number).
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Short stable label for logs.
    pub fn as_label(self) -> &'static str {
        match self {
            Channel::Input => "stdin",
            Channel::Primary => "stdout",
            Channel::Secondary => "stderr",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}
