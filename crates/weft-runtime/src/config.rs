#![forbid(unsafe_code)]

//! Runtime configuration.

use std::time::Duration;

use tracing::warn;

use crate::queue::DEFAULT_CAPACITY;

/// Environment variable overriding the tick interval, in milliseconds.
pub const ENV_TICK_MS: &str = "WEFT_TICK_MS";
/// Environment variable overriding the queue capacity.
pub const ENV_QUEUE_CAPACITY: &str = "WEFT_QUEUE_CAPACITY";

/// Settings for [`Program`](crate::Program).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramConfig {
    /// Interval between tick messages. Zero disables ticks.
    pub tick_rate: Duration,
    /// Inbound queue capacity. At least 1.
    pub queue_capacity: usize,
    /// How long the input producer blocks per poll. Bounds shutdown latency.
    pub poll_timeout: Duration,
    /// Track focusable widgets and route keys to the focused one.
    pub auto_register_focus: bool,
    /// Enable mouse reporting.
    pub mouse_capture: bool,
    /// Use the alternate screen.
    pub alternate_screen: bool,
    /// Enable bracketed paste.
    pub bracketed_paste: bool,
}

impl Default for ProgramConfig {
    fn default() -> Self {
        Self {
            tick_rate: Duration::from_secs(1) / 30,
            queue_capacity: DEFAULT_CAPACITY,
            poll_timeout: Duration::from_millis(50),
            auto_register_focus: true,
            mouse_capture: false,
            alternate_screen: true,
            bracketed_paste: true,
        }
    }
}

impl ProgramConfig {
    /// Defaults with `WEFT_TICK_MS` / `WEFT_QUEUE_CAPACITY` applied.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value.
    ///
    /// Values that do not parse are logged and ignored.
    #[must_use]
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(raw) = lookup(ENV_TICK_MS) {
            match raw.trim().parse::<u64>() {
                Ok(ms) => self.tick_rate = Duration::from_millis(ms),
                Err(err) => warn!(var = ENV_TICK_MS, value = %raw, %err, "ignoring override"),
            }
        }
        if let Some(raw) = lookup(ENV_QUEUE_CAPACITY) {
            match raw.trim().parse::<usize>() {
                Ok(capacity) => self = self.with_queue_capacity(capacity),
                Err(err) => {
                    warn!(var = ENV_QUEUE_CAPACITY, value = %raw, %err, "ignoring override");
                }
            }
        }
        self
    }

    #[must_use]
    pub fn with_tick_rate(mut self, tick_rate: Duration) -> Self {
        self.tick_rate = tick_rate;
        self
    }

    /// Set the queue capacity. Zero is raised to 1.
    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    #[must_use]
    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_auto_register_focus(mut self, enabled: bool) -> Self {
        self.auto_register_focus = enabled;
        self
    }

    #[must_use]
    pub fn with_mouse_capture(mut self, enabled: bool) -> Self {
        self.mouse_capture = enabled;
        self
    }

    #[must_use]
    pub fn with_alternate_screen(mut self, enabled: bool) -> Self {
        self.alternate_screen = enabled;
        self
    }

    #[must_use]
    pub fn with_bracketed_paste(mut self, enabled: bool) -> Self {
        self.bracketed_paste = enabled;
        self
    }

    /// Returns true if tick messages are generated.
    pub fn ticks_enabled(&self) -> bool {
        !self.tick_rate.is_zero()
    }

    /// Terminal modes for the crossterm backend.
    #[cfg(feature = "crossterm")]
    pub fn terminal_options(&self) -> weft_backend::TerminalOptions {
        weft_backend::TerminalOptions::minimal()
            .with_alternate_screen(self.alternate_screen)
            .with_mouse_capture(self.mouse_capture)
            .with_bracketed_paste(self.bracketed_paste)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = ProgramConfig::default();
        assert_eq!(config.tick_rate, Duration::from_nanos(33_333_333));
        assert_eq!(config.queue_capacity, 128);
        assert_eq!(config.poll_timeout, Duration::from_millis(50));
        assert!(config.auto_register_focus);
        assert!(!config.mouse_capture);
        assert!(config.alternate_screen);
        assert!(config.ticks_enabled());
    }

    #[test]
    fn overrides_apply() {
        let config = ProgramConfig::default().with_overrides(lookup(&[
            (ENV_TICK_MS, "10"),
            (ENV_QUEUE_CAPACITY, " 4 "),
        ]));
        assert_eq!(config.tick_rate, Duration::from_millis(10));
        assert_eq!(config.queue_capacity, 4);
    }

    #[test]
    fn bad_overrides_are_ignored() {
        let config = ProgramConfig::default().with_overrides(lookup(&[
            (ENV_TICK_MS, "fast"),
            (ENV_QUEUE_CAPACITY, "-3"),
        ]));
        assert_eq!(config, ProgramConfig::default());
    }

    #[test]
    fn zero_tick_disables_ticks() {
        let config = ProgramConfig::default().with_overrides(lookup(&[(ENV_TICK_MS, "0")]));
        assert!(!config.ticks_enabled());
    }

    #[test]
    fn capacity_floor_is_one() {
        assert_eq!(ProgramConfig::default().with_queue_capacity(0).queue_capacity, 1);
        let config = ProgramConfig::default().with_overrides(lookup(&[(ENV_QUEUE_CAPACITY, "0")]));
        assert_eq!(config.queue_capacity, 1);
    }

    #[cfg(feature = "crossterm")]
    #[test]
    fn terminal_options_follow_config() {
        let opts = ProgramConfig::default()
            .with_mouse_capture(true)
            .with_alternate_screen(false)
            .terminal_options();
        assert!(opts.mouse_capture);
        assert!(!opts.alternate_screen);
        assert!(opts.bracketed_paste);
    }
}
