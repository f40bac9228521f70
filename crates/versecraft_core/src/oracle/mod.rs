//! External text-judgment oracle.
//!
//! # Responsibility
//! - Define the `OracleClient` seam consulted for structural judgments.
//! - Turn raw oracle replies into `OracleJudgment` values.
//!
//! # Invariants
//! - Oracle failures never escape the adapter; they become `Inconclusive`.
//! - No caching and no retries: one request per judgment.
//! - Implementations must bound their own latency (request timeout).

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod adapter;
pub mod http;
pub mod prompt;

pub use adapter::OracleAdapter;
pub use http::HttpOracleClient;
pub use prompt::{classify_reply, PromptContext};

/// Transport-level oracle failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    /// The request exceeded its deadline.
    Timeout,
    /// Connection or protocol failure.
    Transport(String),
    /// Non-success HTTP status.
    HttpStatus(u16),
    /// Reply body did not have the expected shape.
    MalformedReply(String),
    /// Client construction failed (bad endpoint, TLS setup).
    Setup(String),
}

impl OracleError {
    /// Stable code for log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Timeout => "oracle_timeout",
            Self::Transport(_) => "oracle_transport",
            Self::HttpStatus(_) => "oracle_http_status",
            Self::MalformedReply(_) => "oracle_malformed_reply",
            Self::Setup(_) => "oracle_setup",
        }
    }
}

impl Display for OracleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout => write!(f, "oracle request timed out"),
            Self::Transport(message) => write!(f, "oracle transport failure: {message}"),
            Self::HttpStatus(status) => write!(f, "oracle returned http status {status}"),
            Self::MalformedReply(message) => write!(f, "malformed oracle reply: {message}"),
            Self::Setup(message) => write!(f, "oracle client setup failed: {message}"),
        }
    }
}

impl Error for OracleError {}

/// Collaborator that answers judgment requests with free text.
pub trait OracleClient: Send + Sync {
    /// Sends one judgment request and returns the raw reply text.
    fn request_judgment(&self, context: &PromptContext) -> Result<String, OracleError>;
}

/// Why the oracle produced no usable verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InconclusiveReason {
    /// Timeout or transport failure.
    Unavailable(OracleError),
    /// Reply mentioned both or neither of `Pass`/`Fail`.
    Ambiguous,
}

/// Classified oracle judgment for one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleJudgment {
    Pass,
    /// Oracle rejected the line; `explanation` is the reply verbatim.
    Fail { explanation: String },
    Inconclusive(InconclusiveReason),
}

impl OracleJudgment {
    pub fn outcome_label(&self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Fail { .. } => "fail",
            Self::Inconclusive(InconclusiveReason::Unavailable(_)) => "unavailable",
            Self::Inconclusive(InconclusiveReason::Ambiguous) => "ambiguous",
        }
    }
}
