//! Remote compilation: scheduling, wire format and transport.
//!
//! ```text
//! edit ──► CompileScheduler ──Dispatch──► RemoteCompiler ──► (generation, CompileResult)
//!              ▲                                                     │
//!              └──────────────── on_response (stale? drop) ◄─────────┘
//! ```
//!
//! - `scheduler` - debounce and generation state machine, no I/O
//! - `remote` - the compiler collaborator and its HTTP implementation
//! - `wire` - JSON request/response bodies of the compile service

pub mod remote;
pub mod scheduler;
pub mod wire;

use std::fmt;

use crate::page::{Format, PageId};

pub use remote::{HttpCompiler, RemoteCompiler, RemoteError};
pub use scheduler::{Command, CompileScheduler, TimerToken};

/// A compile attempt, tagged with the generation it was issued under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileRequest {
    pub page_id: PageId,
    pub format: Format,
    pub content: String,
    pub generation: u64,
}

/// Outcome of a compile attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileResult {
    /// Decoded PDF bytes
    Success { artifact: Vec<u8> },
    /// Compiler error, non-success status or transport failure
    Failure { message: String },
}

impl CompileResult {
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
        }
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Compile phase of a page session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    /// Debounce timer armed
    Pending,
    /// Request outstanding
    InFlight,
    Succeeded,
    Failed,
}

impl Phase {
    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Pending => "pending",
            Self::InFlight => "compiling",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
