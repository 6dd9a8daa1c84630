//! Debounced, generation-tagged compile scheduling.
//!
//! The scheduler never sleeps and never talks to the network. Every operation
//! returns the [`Command`]s the caller has to carry out (arm or cancel the
//! debounce timer, dispatch a request), which keeps the state machine
//! deterministic under test.
//!
//! ```text
//! Idle ──edit──► Pending ──timer──► InFlight ──response──► Succeeded/Failed ──► Idle
//!                  ▲  │edit (re-arm)     │edit: follow-up        │follow-up + auto
//!                  │  └──────────────────┘                       ▼
//!                  └──────────────────────────────────────── Pending
//! ```
//!
//! Ordering across the network is handled by `latest_generation`: a response
//! is applied only when it carries the generation of the most recent request.
//! Format switches and teardown bump the generation too, orphaning whatever is
//! still outstanding.

use std::time::Duration;

use super::{CompileRequest, Phase};
use crate::page::{Format, PageId};

/// Identifies one arming of the debounce timer; a fire with an old token is ignored.
pub type TimerToken = u64;

/// Side effect requested by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// (Re)arm the debounce timer. Replaces any armed timer.
    ArmTimer { token: TimerToken, delay: Duration },
    /// Disarm the debounce timer.
    CancelTimer,
    /// Send the request to the remote compiler.
    Dispatch(CompileRequest),
}

/// Per-page compile session state.
#[derive(Debug)]
pub struct CompileScheduler {
    phase: Phase,
    latest_generation: u64,
    auto_compile: bool,
    debounce: Duration,
    /// Token of the armed timer, if any
    armed: Option<TimerToken>,
    last_token: TimerToken,
    /// Edits arrived while a request was in flight
    follow_up: bool,
    /// Message of the last applied failure, until the next success or request
    failure: Option<String>,
}

impl CompileScheduler {
    pub fn new(debounce: Duration, auto_compile: bool) -> Self {
        Self {
            phase: Phase::Idle,
            latest_generation: 0,
            auto_compile,
            debounce,
            armed: None,
            last_token: 0,
            follow_up: false,
            failure: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn latest_generation(&self) -> u64 {
        self.latest_generation
    }

    pub fn auto_compile(&self) -> bool {
        self.auto_compile
    }

    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    pub fn armed(&self) -> Option<TimerToken> {
        self.armed
    }

    /// Content changed.
    pub fn on_edit(&mut self) -> Vec<Command> {
        if !self.auto_compile {
            return vec![];
        }
        if self.phase == Phase::InFlight {
            self.follow_up = true;
            return vec![];
        }
        self.phase = Phase::Pending;
        vec![self.arm()]
    }

    /// Debounce timer fired.
    pub fn on_timer(&mut self, token: TimerToken, page: &PageId, format: Format, content: &str) -> Vec<Command> {
        if self.armed != Some(token) || self.phase != Phase::Pending {
            crate::debug!("compile"; "ignoring stale timer {}", token);
            return vec![];
        }
        self.armed = None;
        vec![self.dispatch(page, format, content)]
    }

    /// Manual compile: from any phase, bypassing the debounce.
    pub fn compile_now(&mut self, page: &PageId, format: Format, content: &str) -> Vec<Command> {
        let mut commands = Vec::with_capacity(2);
        if self.armed.take().is_some() {
            commands.push(Command::CancelTimer);
        }
        commands.push(self.dispatch(page, format, content));
        commands
    }

    /// Check a response against the latest generation.
    ///
    /// Returns `false` for stale responses, which must then be dropped without
    /// any effect. Otherwise the phase moves to `Succeeded` or `Failed`; call
    /// [`settle`](Self::settle) once the outcome has been applied.
    pub fn on_response(&mut self, generation: u64, failure: Option<&str>) -> bool {
        if generation != self.latest_generation || self.phase != Phase::InFlight {
            crate::debug!(
                "compile";
                "discarding stale response (generation {}, latest {})",
                generation,
                self.latest_generation
            );
            return false;
        }

        match failure {
            None => {
                self.phase = Phase::Succeeded;
                self.failure = None;
            }
            Some(message) => self.fail(message),
        }
        true
    }

    /// Mark the applied outcome as failed (also used when a successful
    /// response cannot be turned into an artifact).
    pub fn fail(&mut self, message: &str) {
        self.phase = Phase::Failed;
        self.failure = Some(message.to_string());
    }

    /// Leave a terminal phase: back to `Idle`, or `Pending` when edits piled up.
    pub fn settle(&mut self) -> Vec<Command> {
        if !matches!(self.phase, Phase::Succeeded | Phase::Failed) {
            return vec![];
        }
        if std::mem::take(&mut self.follow_up) && self.auto_compile {
            self.phase = Phase::Pending;
            return vec![self.arm()];
        }
        self.phase = Phase::Idle;
        vec![]
    }

    /// Orphan everything in flight: format switch or session teardown.
    pub fn reset(&mut self) -> Vec<Command> {
        self.latest_generation += 1;
        self.phase = Phase::Idle;
        self.follow_up = false;
        self.failure = None;
        match self.armed.take() {
            Some(_) => vec![Command::CancelTimer],
            None => vec![],
        }
    }

    /// Only affects future edits; an armed timer stays armed.
    pub fn set_auto_compile(&mut self, enabled: bool) {
        self.auto_compile = enabled;
    }

    fn arm(&mut self) -> Command {
        self.last_token += 1;
        self.armed = Some(self.last_token);
        Command::ArmTimer {
            token: self.last_token,
            delay: self.debounce,
        }
    }

    fn dispatch(&mut self, page: &PageId, format: Format, content: &str) -> Command {
        self.latest_generation += 1;
        self.phase = Phase::InFlight;
        self.follow_up = false;
        self.failure = None;
        Command::Dispatch(CompileRequest {
            page_id: page.clone(),
            format,
            content: content.to_string(),
            generation: self.latest_generation,
        })
    }
}
