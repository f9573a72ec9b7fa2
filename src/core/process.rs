//! # External process handle and exit classification.
//!
//! [`ProcessHandle`] owns one spawned process and, until the router takes them,
//! its three channel endpoints.
//!
//! ## Channel wiring
//! ```text
//!            unix                               other targets
//! pipe:0  ◄─► socket pair (read + write)        pipe (write only)
//! pipe:1  ──► pipe (read)                       pipe (read)
//! pipe:2  ──► pipe (read)                       pipe (read)
//! ```
//! Transcoders can be told to write images to `pipe:0`; a socket pair lets the
//! supervisor both feed the process and read that output back.
//!
//! ## Exit messages
//! | exit                 | message                                              |
//! |----------------------|------------------------------------------------------|
//! | code 0               | lost connection to its source and timed out          |
//! | code 1               | unable to connect: bad parameters or network trouble |
//! | code 255             | intentionally quit                                   |
//! | anything else        | terminated by signal `<signal>`                      |

use std::io;
use std::pin::Pin;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::process::{Child, Command};

pub(crate) type ChannelReader = Pin<Box<dyn AsyncRead + Send>>;
pub(crate) type ChannelWriter = Pin<Box<dyn AsyncWrite + Send>>;

/// Endpoints of the three process channels.
pub(crate) struct ChannelStreams {
    /// Readable side of `pipe:0`, when the platform allows it.
    pub input_reader: Option<ChannelReader>,
    /// Writable side of `pipe:0`.
    pub input_writer: ChannelWriter,
    /// `pipe:1`.
    pub primary: ChannelReader,
    /// `pipe:2`.
    pub secondary: ChannelReader,
}

/// One live external process.
pub(crate) struct ProcessHandle {
    child: Child,
    pid: Option<u32>,
    streams: Option<ChannelStreams>,
}

impl ProcessHandle {
    /// Launches `program` with `params`, all three channels captured.
    ///
    /// An error here means the program could not be started at all.
    pub fn spawn(program: &str, params: &[String]) -> io::Result<Self> {
        let mut cmd = Command::new(program);
        cmd.args(params)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        #[cfg(unix)]
        let (input_reader, input_writer) = {
            use std::os::fd::OwnedFd;

            let (ours, theirs) = std::os::unix::net::UnixStream::pair()?;
            cmd.stdin(Stdio::from(OwnedFd::from(theirs)));
            ours.set_nonblocking(true)?;
            let (read, write) = tokio::net::UnixStream::from_std(ours)?.into_split();
            (
                Some(Box::pin(read) as ChannelReader),
                Box::pin(write) as ChannelWriter,
            )
        };
        #[cfg(not(unix))]
        cmd.stdin(Stdio::piped());

        // `cmd` still holds the child's end of pipe:0; it is closed when `cmd` drops.
        let mut child = cmd.spawn()?;

        #[cfg(not(unix))]
        let (input_reader, input_writer) = {
            let stdin = child
                .stdin
                .take()
                .ok_or_else(|| io::Error::other("stdin not captured"))?;
            (None, Box::pin(stdin) as ChannelWriter)
        };

        let primary = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::other("stdout not captured"))?;
        let secondary = child
            .stderr
            .take()
            .ok_or_else(|| io::Error::other("stderr not captured"))?;

        Ok(Self {
            pid: child.id(),
            child,
            streams: Some(ChannelStreams {
                input_reader,
                input_writer,
                primary: Box::pin(primary),
                secondary: Box::pin(secondary),
            }),
        })
    }

    /// OS process id, while known.
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Hands the channel endpoints over (once).
    pub fn take_streams(&mut self) -> Option<ChannelStreams> {
        self.streams.take()
    }

    /// Waits for the process to exit. Cancel-safe.
    pub async fn wait(&mut self) -> io::Result<ExitStatus> {
        self.child.wait().await
    }

    /// Sends a forceful kill and reaps the process in the background.
    pub fn kill(mut self) {
        if let Err(err) = self.child.start_kill() {
            tracing::debug!(pid = ?self.pid, error = %err, "kill failed (already exited?)");
        }
        tokio::spawn(async move {
            let _ = self.child.wait().await;
        });
    }
}

/// How a process ended.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExitReport {
    /// Exit code, if the process exited on its own.
    pub code: Option<i32>,
    /// Terminating signal name, if killed.
    pub signal: Option<Arc<str>>,
}

impl ExitReport {
    /// Extracts code and signal from an exit status.
    pub fn from_status(status: &ExitStatus) -> Self {
        Self {
            code: status.code(),
            signal: signal_of(status),
        }
    }

    /// Human-readable description; informational only.
    ///
    /// ```
    /// use pipevisor::ExitReport;
    ///
    /// let report = ExitReport { code: Some(1), signal: None };
    /// assert!(report.message("ffmpeg").contains("bad parameters"));
    /// ```
    pub fn message(&self, program: &str) -> String {
        match self.code {
            Some(0) => format!("{program} lost connection to its source and timed out."),
            Some(1) => format!(
                "{program} was unable to connect to its source due to bad parameters or network trouble."
            ),
            Some(255) => format!("{program} was intentionally quit."),
            _ => format!(
                "{program} was terminated by signal {}.",
                self.signal.as_deref().unwrap_or("unknown")
            ),
        }
    }
}

#[cfg(unix)]
fn signal_of(status: &ExitStatus) -> Option<Arc<str>> {
    use std::os::unix::process::ExitStatusExt;

    status.signal().map(|sig| {
        let name = nix::sys::signal::Signal::try_from(sig)
            .map(|s| s.as_str().to_string())
            .unwrap_or_else(|_| format!("signal {sig}"));
        Arc::from(name)
    })
}

#[cfg(not(unix))]
fn signal_of(_status: &ExitStatus) -> Option<Arc<str>> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_by_code() {
        let msg = |code| ExitReport { code: Some(code), signal: None }.message("ffmpeg");
        assert_eq!(msg(0), "ffmpeg lost connection to its source and timed out.");
        assert!(msg(1).contains("bad parameters or network trouble"));
        assert_eq!(msg(255), "ffmpeg was intentionally quit.");
        assert_eq!(msg(3), "ffmpeg was terminated by signal unknown.");
    }

    #[test]
    fn test_message_with_signal() {
        let report = ExitReport {
            code: None,
            signal: Some(Arc::from("SIGKILL")),
        };
        assert_eq!(report.message("ffmpeg"), "ffmpeg was terminated by signal SIGKILL.");
    }

    #[cfg(unix)]
    #[test]
    fn test_report_from_raw_status() {
        use std::os::unix::process::ExitStatusExt;

        let exited = ExitReport::from_status(&ExitStatus::from_raw(1 << 8));
        assert_eq!(exited.code, Some(1));
        assert!(exited.signal.is_none());

        let killed = ExitReport::from_status(&ExitStatus::from_raw(9));
        assert_eq!(killed.code, None);
        assert_eq!(killed.signal.as_deref(), Some("SIGKILL"));
    }

    #[tokio::test]
    async fn test_spawn_missing_program_fails() {
        let params = vec!["-i".to_string(), "x".to_string(), "y".to_string()];
        let err = ProcessHandle::spawn("pipevisor-no-such-program", &params)
            .err()
            .expect("spawn must fail");
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
