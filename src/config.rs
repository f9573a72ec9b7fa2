//! # Supervisor configuration.
//!
//! Provides [`Config`], the validated settings of one supervisor, and
//! [`Options`], the raw option bag it can be parsed from.
//!
//! Config is built in two ways:
//! 1. **Typed**: `Config::default().retry(5).wait_secs(10.0).codec(Channel::Primary, "mjpeg")`
//! 2. **Option bag**: `Config::from_options(&json, Profile::Standard)`
//!
//! ## Validation policy
//! Numeric settings are **clamped, never rejected**:
//! - missing / non-numeric / NaN → the range default
//! - below the range → the low bound
//! - above the range → the high bound
//!
//! Unknown codec names degrade to passthrough.
//!
//! ## Ranges
//! | setting | range                  | default                 |
//! |---------|------------------------|-------------------------|
//! | retry   | 0–100                  | 0 (no watchdog)         |
//! | wait    | per [`Profile`]        | per [`Profile`]         |
//! | reset   | per [`Profile`]        | per [`Profile`]         |

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::channel::Channel;
use crate::demux::ChannelMode;

/// Program invoked when none is configured.
pub const DEFAULT_PROGRAM: &str = "ffmpeg";

/// Placeholder identity used when no name is given.
pub const DEFAULT_NAME: &str = "name";

/// Accepted range for `retry`.
pub const RETRY_RANGE: RangePolicy = RangePolicy::new(0.0, 100.0, 0.0);

/// Inclusive numeric range with a fallback default.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangePolicy {
    pub low: f64,
    pub high: f64,
    pub default: f64,
}

impl RangePolicy {
    pub const fn new(low: f64, high: f64, default: f64) -> Self {
        Self { low, high, default }
    }

    /// Clamps `value` into the range; `None` and NaN yield the default.
    ///
    /// ```
    /// use pipevisor::RangePolicy;
    ///
    /// let range = RangePolicy::new(10.0, 300.0, 30.0);
    /// assert_eq!(range.clamp(Some(3.0)), 10.0);
    /// assert_eq!(range.clamp(Some(900.0)), 300.0);
    /// assert_eq!(range.clamp(Some(f64::NAN)), 30.0);
    /// assert_eq!(range.clamp(None), 30.0);
    /// ```
    pub fn clamp(&self, value: Option<f64>) -> f64 {
        match value {
            None => self.default,
            Some(v) if v.is_nan() => self.default,
            Some(v) if v < self.low => self.low,
            Some(v) if v > self.high => self.high,
            Some(v) => v,
        }
    }
}

/// Timing profile: the accepted ranges and defaults for `wait` and `reset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Profile {
    /// wait 5–300s (default 30s), reset 10–300s (default 30s).
    #[default]
    Standard,
    /// wait 1–300s (default 5s), reset 10–300s (default 30s).
    Responsive,
}

impl Profile {
    /// Range for the delay before a respawn, in seconds.
    pub fn wait(self) -> RangePolicy {
        match self {
            Profile::Standard => RangePolicy::new(5.0, 300.0, 30.0),
            Profile::Responsive => RangePolicy::new(1.0, 300.0, 5.0),
        }
    }

    /// Range for the health window, in seconds.
    pub fn reset(self) -> RangePolicy {
        match self {
            Profile::Standard | Profile::Responsive => RangePolicy::new(10.0, 300.0, 30.0),
        }
    }
}

/// Validated supervisor settings.
///
/// Every setter clamps its own value; a `Config` therefore always holds
/// in-range values.
///
/// ## Field semantics
/// - `name`: display identity, sanitized and suffixed at supervisor construction
/// - `program`: executable to invoke (default `ffmpeg`)
/// - `retry`: max respawns before the watchdog gives up (`0` = report exits, never respawn)
/// - `wait`: delay before each respawn
/// - `reset`: health window; an exit more than `wait + reset` after the previous one
///   clears the attempt counter
/// - `channels`: per-channel routing (passthrough or marker demux)
/// - `notifier_capacity`: ring buffer size of the event broadcast (min 1)
/// - `input_capacity`: queued writes for the input channel (min 1)
#[derive(Debug, Clone)]
pub struct Config {
    name: Option<String>,
    program: String,
    profile: Profile,
    retry: u32,
    wait: Duration,
    reset: Duration,
    channels: [ChannelMode; 3],
    notifier_capacity: usize,
    input_capacity: usize,
}

impl Default for Config {
    /// Standard profile, no retries, all channels passthrough.
    fn default() -> Self {
        Self::new(Profile::Standard)
    }
}

impl Config {
    /// Creates a config holding the defaults of `profile`.
    pub fn new(profile: Profile) -> Self {
        Self {
            name: None,
            program: DEFAULT_PROGRAM.to_string(),
            profile,
            retry: RETRY_RANGE.default as u32,
            wait: Duration::from_secs_f64(profile.wait().default),
            reset: Duration::from_secs_f64(profile.reset().default),
            channels: [ChannelMode::Passthrough; 3],
            notifier_capacity: 1024,
            input_capacity: 64,
        }
    }

    /// Parses a loosely typed option bag.
    ///
    /// Recognized keys: `name`, `program`, `retry`, `wait`, `reset`, `stdin`,
    /// `stdout`, `stderr`. Anything unrecognized or malformed falls back to the
    /// profile default.
    ///
    /// ```
    /// use std::time::Duration;
    /// use pipevisor::{Channel, ChannelMode, Config, Profile};
    ///
    /// let opts = serde_json::json!({
    ///     "name": "cam 1",
    ///     "retry": 5,
    ///     "wait": "abc",
    ///     "reset": 1000,
    ///     "stdout": "mjpeg",
    /// });
    /// let cfg = Config::from_options(&opts, Profile::Standard);
    /// assert_eq!(cfg.retry_limit(), 5);
    /// assert_eq!(cfg.wait(), Duration::from_secs(30));
    /// assert_eq!(cfg.reset(), Duration::from_secs(300));
    /// assert_eq!(cfg.channel(Channel::Primary), ChannelMode::Demux([0xFF, 0xD9]));
    /// ```
    pub fn from_options(options: &Value, profile: Profile) -> Self {
        let opts: Options = serde_json::from_value(options.clone()).unwrap_or_default();
        opts.into_config(profile)
    }

    /// Sets the display name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the executable to invoke.
    pub fn program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Sets the retry limit, clamped to 0–100.
    pub fn retry(mut self, retry: u32) -> Self {
        self.retry = clamp_retry(Some(f64::from(retry)));
        self
    }

    /// Sets the respawn delay in seconds, clamped to the profile range.
    pub fn wait_secs(mut self, secs: f64) -> Self {
        self.wait = Duration::from_secs_f64(self.profile.wait().clamp(Some(secs)));
        self
    }

    /// Sets the health window in seconds, clamped to the profile range.
    pub fn reset_secs(mut self, secs: f64) -> Self {
        self.reset = Duration::from_secs_f64(self.profile.reset().clamp(Some(secs)));
        self
    }

    /// Sets the routing mode of one channel.
    pub fn channel_mode(mut self, channel: Channel, mode: ChannelMode) -> Self {
        self.channels[channel.index()] = mode;
        self
    }

    /// Routes one channel by codec name (unknown names → passthrough).
    pub fn codec(self, channel: Channel, codec: &str) -> Self {
        self.channel_mode(channel, ChannelMode::from_codec_name(codec))
    }

    /// Sets the event broadcast capacity (min 1).
    pub fn notifier_capacity(mut self, capacity: usize) -> Self {
        self.notifier_capacity = capacity.max(1);
        self
    }

    /// Sets the input write queue capacity (min 1).
    pub fn input_capacity(mut self, capacity: usize) -> Self {
        self.input_capacity = capacity.max(1);
        self
    }

    /// Configured (unsanitized) name, if any.
    pub fn raw_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Executable invoked on each spawn.
    pub fn program_name(&self) -> &str {
        &self.program
    }

    /// Timing profile in effect.
    pub fn profile(&self) -> Profile {
        self.profile
    }

    /// Max respawn attempts.
    pub fn retry_limit(&self) -> u32 {
        self.retry
    }

    /// Delay before a respawn.
    pub fn wait(&self) -> Duration {
        self.wait
    }

    /// Health window added to `wait` for the attempt-counter reset.
    pub fn reset(&self) -> Duration {
        self.reset
    }

    /// Routing mode of `channel`.
    pub fn channel(&self, channel: Channel) -> ChannelMode {
        self.channels[channel.index()]
    }

    /// Routing modes, indexed by [`Channel::index`].
    pub fn channels(&self) -> [ChannelMode; 3] {
        self.channels
    }

    /// Event broadcast capacity.
    pub fn notifier_capacity_clamped(&self) -> usize {
        self.notifier_capacity.max(1)
    }

    /// Input write queue capacity.
    pub fn input_capacity_clamped(&self) -> usize {
        self.input_capacity.max(1)
    }
}

/// Raw option bag, as found in a caller's JSON/TOML/YAML settings.
///
/// Values are kept untyped so that malformed entries degrade to defaults
/// instead of failing the whole document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    pub name: Option<Value>,
    pub program: Option<Value>,
    pub retry: Option<Value>,
    pub wait: Option<Value>,
    pub reset: Option<Value>,
    pub stdin: Option<Value>,
    pub stdout: Option<Value>,
    pub stderr: Option<Value>,
}

impl Options {
    /// Resolves the bag against `profile`.
    pub fn into_config(self, profile: Profile) -> Config {
        let mut cfg = Config::new(profile);

        if let Some(Value::String(name)) = self.name {
            cfg.name = Some(name);
        }
        if let Some(Value::String(program)) = self.program {
            if !program.trim().is_empty() {
                cfg.program = program;
            }
        }
        cfg.retry = clamp_retry(self.retry.as_ref().and_then(numeric));
        cfg.wait = Duration::from_secs_f64(
            profile.wait().clamp(self.wait.as_ref().and_then(numeric)),
        );
        cfg.reset = Duration::from_secs_f64(
            profile.reset().clamp(self.reset.as_ref().and_then(numeric)),
        );

        for (channel, value) in [
            (Channel::Input, self.stdin),
            (Channel::Primary, self.stdout),
            (Channel::Secondary, self.stderr),
        ] {
            cfg.channels[channel.index()] = value.as_ref().map(channel_mode).unwrap_or_default();
        }
        cfg
    }
}

/// Fractional limits behave like the next whole attempt.
fn clamp_retry(value: Option<f64>) -> u32 {
    RETRY_RANGE.clamp(value).ceil() as u32
}

/// Reads a JSON number or a numeric string.
fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn channel_mode(value: &Value) -> ChannelMode {
    match value {
        Value::String(codec) => ChannelMode::from_codec_name(codec),
        Value::Bool(flag) => ChannelMode::from_flag(*flag),
        _ => ChannelMode::Passthrough,
    }
}

/// Builds a unique display name: whitespace stripped, then `-<base36 epoch ms>`.
///
/// Empty names use [`DEFAULT_NAME`].
pub(crate) fn unique_name(raw: Option<&str>, epoch_ms: u64) -> String {
    let stripped: String = raw
        .unwrap_or_default()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    let base = if stripped.is_empty() {
        DEFAULT_NAME.to_string()
    } else {
        stripped
    };
    format!("{base}-{}", to_base36(epoch_ms))
}

/// Milliseconds since the unix epoch (0 if the clock is before it).
pub(crate) fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Uppercase base-36 rendering.
fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::with_capacity(13);
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_follow_profile() {
        let std = Config::default();
        assert_eq!(std.retry_limit(), 0);
        assert_eq!(std.wait(), Duration::from_secs(30));
        assert_eq!(std.reset(), Duration::from_secs(30));
        assert_eq!(std.program_name(), "ffmpeg");

        let fast = Config::new(Profile::Responsive);
        assert_eq!(fast.wait(), Duration::from_secs(5));
    }

    #[test]
    fn test_setters_clamp() {
        let cfg = Config::default().retry(500).wait_secs(1.0).reset_secs(9_999.0);
        assert_eq!(cfg.retry_limit(), 100);
        assert_eq!(cfg.wait(), Duration::from_secs(5));
        assert_eq!(cfg.reset(), Duration::from_secs(300));

        let cfg = Config::new(Profile::Responsive).wait_secs(f64::NAN);
        assert_eq!(cfg.wait(), Duration::from_secs(5));
    }

    #[test]
    fn test_options_non_numeric_falls_back() {
        let cfg = Config::from_options(
            &json!({ "retry": "lots", "wait": null, "reset": [1, 2] }),
            Profile::Standard,
        );
        assert_eq!(cfg.retry_limit(), 0);
        assert_eq!(cfg.wait(), Duration::from_secs(30));
        assert_eq!(cfg.reset(), Duration::from_secs(30));
    }

    #[test]
    fn test_options_numeric_strings_and_bounds() {
        let cfg = Config::from_options(
            &json!({ "retry": "3", "wait": -4, "reset": "12.5" }),
            Profile::Responsive,
        );
        assert_eq!(cfg.retry_limit(), 3);
        assert_eq!(cfg.wait(), Duration::from_secs(1));
        assert_eq!(cfg.reset(), Duration::from_millis(12_500));
    }

    #[test]
    fn test_options_channels() {
        let cfg = Config::from_options(
            &json!({ "stdin": true, "stdout": "png", "stderr": "vp9" }),
            Profile::Standard,
        );
        assert_eq!(cfg.channel(Channel::Input), ChannelMode::Demux([0xFF, 0xD9]));
        assert_eq!(cfg.channel(Channel::Primary), ChannelMode::Demux([0x60, 0x82]));
        assert_eq!(cfg.channel(Channel::Secondary), ChannelMode::Passthrough);
    }

    #[test]
    fn test_options_not_an_object() {
        let cfg = Config::from_options(&json!("garbage"), Profile::Standard);
        assert_eq!(cfg.retry_limit(), 0);
        assert!(cfg.raw_name().is_none());
    }

    #[test]
    fn test_unique_name_strips_whitespace() {
        let name = unique_name(Some("my cam"), 1_700_000_000_000);
        let (base, suffix) = name.split_once('-').expect("suffix");
        assert_eq!(base, "mycam");
        assert!(!suffix.is_empty());
        assert!(suffix.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
        assert!(!name.chars().any(char::is_whitespace));
    }

    #[test]
    fn test_unique_name_default() {
        assert!(unique_name(None, 35).starts_with("name-"));
        assert_eq!(unique_name(Some(" \t "), 35), "name-Z");
    }

    #[test]
    fn test_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "Z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(1_700_000_000_000), "LOYW3V28");
    }

    #[test]
    fn test_base36_order_follows_time() {
        // Same digit count → lexical order matches numeric order.
        let a = to_base36(1_700_000_000_000);
        let b = to_base36(1_700_000_000_001);
        assert!(a < b);
    }
}
