//! OS signal handling.
//!
//! # Responsibilities
//! - Name the signals that may trigger shutdown
//! - Install handlers for a configured set
//! - Resolve to whichever configured signal arrives first
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Handlers are installed before the termination trigger is armed, so a
//!   signal delivered in between is not lost
//! - Off unix only SIGINT (Ctrl+C) can be observed

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A process signal that can trigger shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Signal {
    #[serde(rename = "SIGTERM")]
    Terminate,
    #[serde(rename = "SIGQUIT")]
    Quit,
    #[serde(rename = "SIGINT")]
    Interrupt,
    #[serde(rename = "SIGHUP")]
    Hangup,
    #[serde(rename = "SIGUSR1")]
    User1,
    #[serde(rename = "SIGUSR2")]
    User2,
}

impl Signal {
    /// Signals that stop the app unless configured otherwise.
    pub const DEFAULT: [Signal; 3] = [Signal::Terminate, Signal::Quit, Signal::Interrupt];

    pub fn name(&self) -> &'static str {
        match self {
            Signal::Terminate => "SIGTERM",
            Signal::Quit => "SIGQUIT",
            Signal::Interrupt => "SIGINT",
            Signal::Hangup => "SIGHUP",
            Signal::User1 => "SIGUSR1",
            Signal::User2 => "SIGUSR2",
        }
    }

    #[cfg(unix)]
    fn kind(&self) -> tokio::signal::unix::SignalKind {
        use tokio::signal::unix::SignalKind;
        match self {
            Signal::Terminate => SignalKind::terminate(),
            Signal::Quit => SignalKind::quit(),
            Signal::Interrupt => SignalKind::interrupt(),
            Signal::Hangup => SignalKind::hangup(),
            Signal::User1 => SignalKind::user_defined1(),
            Signal::User2 => SignalKind::user_defined2(),
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Signal {
    type Err = String;

    /// Accepts `SIGTERM`, `TERM` or `term`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let short = upper.strip_prefix("SIG").unwrap_or(&upper);
        match short {
            "TERM" => Ok(Signal::Terminate),
            "QUIT" => Ok(Signal::Quit),
            "INT" => Ok(Signal::Interrupt),
            "HUP" => Ok(Signal::Hangup),
            "USR1" => Ok(Signal::User1),
            "USR2" => Ok(Signal::User2),
            _ => Err(format!("unknown signal: {}", s)),
        }
    }
}

/// Installed handlers for a set of signals.
pub struct SignalListener {
    #[cfg(unix)]
    streams: Vec<(Signal, tokio::signal::unix::Signal)>,
    #[cfg(not(unix))]
    ctrl_c: bool,
}

impl SignalListener {
    /// Install handlers for every signal in `signals`.
    ///
    /// Must be called from within a Tokio runtime.
    #[cfg(unix)]
    pub fn install(signals: &[Signal]) -> std::io::Result<Self> {
        let mut streams: Vec<(Signal, tokio::signal::unix::Signal)> = Vec::with_capacity(signals.len());
        for signal in signals {
            if streams.iter().any(|(s, _)| s == signal) {
                continue;
            }
            let stream = tokio::signal::unix::signal(signal.kind())?;
            streams.push((*signal, stream));
        }
        tracing::debug!(signals = ?signals, "Signal handlers installed");
        Ok(Self { streams })
    }

    #[cfg(not(unix))]
    pub fn install(signals: &[Signal]) -> std::io::Result<Self> {
        for signal in signals.iter().filter(|s| **s != Signal::Interrupt) {
            tracing::warn!(signal = %signal, "Signal not supported on this platform, ignoring");
        }
        Ok(Self {
            ctrl_c: signals.contains(&Signal::Interrupt),
        })
    }

    /// Wait for the first configured signal. Never resolves for an empty set.
    #[cfg(unix)]
    pub async fn recv(&mut self) -> Signal {
        if self.streams.is_empty() {
            return std::future::pending().await;
        }
        let waits = self.streams.iter_mut().map(|(signal, stream)| {
            let signal = *signal;
            Box::pin(async move {
                stream.recv().await;
                signal
            })
        });
        let (signal, _, _) = futures_util::future::select_all(waits).await;
        signal
    }

    #[cfg(not(unix))]
    pub async fn recv(&mut self) -> Signal {
        if !self.ctrl_c {
            return std::future::pending().await;
        }
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Error handling Ctrl+C signal");
            return std::future::pending().await;
        }
        Signal::Interrupt
    }
}
