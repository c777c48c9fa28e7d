//! Output channels and the primary/fallback transport manager
//!
//! Exactly one channel carries telemetry at any time. A supervisory check,
//! run on its own cadence, fails over to the fallback channel the moment the
//! primary link reports down and fails back once a reconnect succeeds.

use std::io;
use std::time::Duration;

use tracing::{debug, info, trace, warn};

use crate::config::{BackoffConfig, ReconnectConfig};
use crate::types::LinkState;

/// A best-effort byte sink
pub trait Channel {
    /// Deliver one framed message. Failures are reported but never retried.
    fn send(&mut self, bytes: &[u8]) -> io::Result<()>;
}

/// A channel that depends on a link which can come and go
pub trait PrimaryChannel: Channel {
    /// Whether the link is currently up
    fn is_connected(&self) -> bool;

    /// Try to bring the link up, waiting at most `timeout`
    fn connect(&mut self, timeout: Duration) -> bool;
}

impl<C: Channel + ?Sized> Channel for Box<C> {
    fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        (**self).send(bytes)
    }
}

impl<C: PrimaryChannel + ?Sized> PrimaryChannel for Box<C> {
    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn connect(&mut self, timeout: Duration) -> bool {
        (**self).connect(timeout)
    }
}

/// Owns both channels and decides which one is live
pub struct TransportManager<P, F> {
    primary: P,
    fallback: F,
    state: LinkState,
    ever_connected: bool,
    policy: ReconnectConfig,
    reconnect_timeout: Duration,
    /// Earliest time the next reconnect attempt may run
    next_attempt: Duration,
    /// Delay to impose after the next failed attempt
    backoff_delay: Option<Duration>,
    dropped: u32,
}

impl<P: PrimaryChannel, F: Channel> TransportManager<P, F> {
    /// Make the initial connection attempt and pick the starting channel
    pub fn start(
        mut primary: P,
        fallback: F,
        connect_timeout: Duration,
        reconnect_timeout: Duration,
        policy: ReconnectConfig,
    ) -> Self {
        let connected = primary.connect(connect_timeout);
        let state = if connected {
            info!("primary link up");
            LinkState::Primary
        } else {
            warn!(timeout_ms = connect_timeout.as_millis() as u64, "primary link failed, using fallback");
            LinkState::Fallback
        };

        Self {
            primary,
            fallback,
            state,
            ever_connected: connected,
            policy,
            reconnect_timeout,
            next_attempt: Duration::ZERO,
            backoff_delay: policy.backoff.map(initial_delay),
            dropped: 0,
        }
    }

    /// Run the supervisory check; returns the new state on a transition
    ///
    /// `now` is only consulted for reconnect backoff. Time passing never
    /// changes the state by itself.
    pub fn supervise(&mut self, now: Duration) -> Option<LinkState> {
        match self.state {
            LinkState::Primary => {
                if self.primary.is_connected() {
                    return None;
                }
                warn!("primary link lost, failing over");
                Some(self.switch_to(LinkState::Fallback))
            }
            LinkState::Fallback => {
                if !self.ever_connected && !self.policy.retry_never_connected {
                    return None;
                }
                if self.primary.is_connected() {
                    return Some(self.switch_to(LinkState::Primary));
                }
                if now < self.next_attempt {
                    return None;
                }

                debug!("attempting primary reconnect");
                if self.primary.connect(self.reconnect_timeout) {
                    self.ever_connected = true;
                    self.backoff_delay = self.policy.backoff.map(initial_delay);
                    self.next_attempt = Duration::ZERO;
                    Some(self.switch_to(LinkState::Primary))
                } else {
                    self.schedule_retry(now);
                    None
                }
            }
        }
    }

    /// Send one line over the live channel, newline-terminated
    pub fn send(&mut self, line: &str) {
        let framed = frame(line);
        let result = match self.state {
            LinkState::Primary => self.primary.send(&framed),
            LinkState::Fallback => self.fallback.send(&framed),
        };
        if let Err(error) = result {
            self.dropped = self.dropped.wrapping_add(1);
            trace!(%error, state = %self.state, "telemetry line dropped");
        }
    }

    /// Send one line over the fallback channel whatever the link state
    ///
    /// Used for console diagnostics.
    pub fn send_local(&mut self, line: &str) {
        if let Err(error) = self.fallback.send(&frame(line)) {
            self.dropped = self.dropped.wrapping_add(1);
            trace!(%error, "local line dropped");
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Whether the primary link has come up at least once
    pub fn ever_connected(&self) -> bool {
        self.ever_connected
    }

    /// Lines that failed to send since startup
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    pub fn primary(&self) -> &P {
        &self.primary
    }

    pub fn fallback(&self) -> &F {
        &self.fallback
    }

    fn switch_to(&mut self, state: LinkState) -> LinkState {
        info!(from = %self.state, to = %state, "transport changed");
        self.state = state;
        state
    }

    fn schedule_retry(&mut self, now: Duration) {
        let (Some(delay), Some(backoff)) = (self.backoff_delay, self.policy.backoff) else {
            return;
        };
        self.next_attempt = now + delay;
        let max = Duration::from_millis(backoff.max_ms);
        self.backoff_delay = Some((delay * 2).min(max));
        debug!(retry_in_ms = delay.as_millis() as u64, "primary reconnect failed");
    }
}

fn initial_delay(backoff: BackoffConfig) -> Duration {
    Duration::from_millis(backoff.initial_ms)
}

fn frame(line: &str) -> Vec<u8> {
    let mut framed = Vec::with_capacity(line.len() + 1);
    framed.extend_from_slice(line.as_bytes());
    framed.push(b'\n');
    framed
}
