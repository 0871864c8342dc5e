/*
 * Responsibility
 * - Per-challenge state: Idle -> CodeRequested -> Verifying -> Confirmed | Expired | Cancelled
 * - 30 second validity window, single-use confirmation
 * - Log of completed sensitive actions
 */
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::time::Instant;

use crate::error::StepUpError;

use super::catalog::{self, SensitiveAction};
use super::countdown::Countdown;
use super::verifier::OtpVerifier;

pub const CHALLENGE_WINDOW: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepUpState {
    Idle,
    CodeRequested,
    Verifying,
    Confirmed,
    Expired,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionDecision {
    /// No verification needed (or already confirmed); go ahead.
    Permitted(&'static SensitiveAction),
    /// A code was requested; call `verify` before executing the action.
    ChallengeRequired(&'static SensitiveAction),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedAction {
    pub action_id: &'static str,
    pub stepped_up: bool,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug)]
struct StepUpChallenge {
    action: &'static SensitiveAction,
    issued_at: Instant,
    consumed: bool,
}

impl StepUpChallenge {
    fn new(action: &'static SensitiveAction) -> Self {
        Self {
            action,
            issued_at: Instant::now(),
            consumed: false,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.issued_at) >= CHALLENGE_WINDOW
    }
}

#[derive(Debug)]
pub struct StepUpAuthenticator {
    verifier: Box<dyn OtpVerifier>,
    state: StepUpState,
    challenge: Option<StepUpChallenge>,
    countdown: Option<Countdown>,
    completed: Vec<CompletedAction>,
}

impl StepUpAuthenticator {
    pub fn new(verifier: Box<dyn OtpVerifier>) -> Self {
        Self {
            verifier,
            state: StepUpState::Idle,
            challenge: None,
            countdown: None,
            completed: Vec::new(),
        }
    }

    /// Current state. An open challenge past its window reads as `Expired`.
    pub fn state(&self) -> StepUpState {
        match (&self.state, &self.challenge) {
            (StepUpState::CodeRequested | StepUpState::Verifying, Some(c))
                if c.is_expired(Instant::now()) =>
            {
                StepUpState::Expired
            }
            (state, _) => *state,
        }
    }

    pub fn pending_action(&self) -> Option<&'static SensitiveAction> {
        self.challenge.as_ref().map(|c| c.action)
    }

    /// Whole seconds left on the open challenge, rounded up. Zero when none is open.
    pub fn seconds_left(&self) -> u64 {
        match (&self.state, &self.challenge) {
            (StepUpState::CodeRequested | StepUpState::Verifying, Some(c)) => {
                let elapsed = Instant::now().duration_since(c.issued_at);
                let left = CHALLENGE_WINDOW.saturating_sub(elapsed);
                left.as_millis().div_ceil(1000) as u64
            }
            _ => 0,
        }
    }

    /// Seconds-left feed of the running countdown, for display.
    pub fn countdown(&self) -> Option<watch::Receiver<u64>> {
        self.countdown.as_ref().map(Countdown::subscribe)
    }

    pub fn completed_actions(&self) -> &[CompletedAction] {
        &self.completed
    }

    pub fn request_action(&mut self, action_id: &str) -> Result<ActionDecision, StepUpError> {
        let action = catalog::find_action(action_id).ok_or_else(|| {
            tracing::warn!(action_id, "unknown sensitive action requested");
            StepUpError::UnknownAction
        })?;

        self.discard_challenge();

        if !action.requires_step_up {
            self.state = StepUpState::Confirmed;
            self.record_completion(action, false);
            return Ok(ActionDecision::Permitted(action));
        }

        self.open_challenge(action);
        tracing::info!(action = action.id, "step-up challenge issued");
        Ok(ActionDecision::ChallengeRequired(action))
    }

    /// Issues a fresh code for the same action, restarting the window.
    pub fn resend_code(&mut self) -> Result<(), StepUpError> {
        let action = match (self.state, &self.challenge) {
            (StepUpState::Confirmed, _) => return Err(StepUpError::AlreadyConsumed),
            (StepUpState::Cancelled, _) => return Err(StepUpError::Cancelled),
            (_, Some(c)) => c.action,
            (_, None) => return Err(StepUpError::NoChallenge),
        };
        self.discard_challenge();
        self.open_challenge(action);
        tracing::info!(action = action.id, "step-up code re-sent");
        Ok(())
    }

    /// Checks `code` against the open challenge.
    ///
    /// A wrong code leaves the challenge open for another try until it expires.
    pub fn verify(&mut self, code: &str) -> Result<&'static SensitiveAction, StepUpError> {
        match self.state {
            StepUpState::Confirmed => return Err(StepUpError::AlreadyConsumed),
            StepUpState::Cancelled => return Err(StepUpError::Cancelled),
            StepUpState::Expired => return Err(StepUpError::ChallengeExpired),
            StepUpState::Idle => return Err(StepUpError::NoChallenge),
            StepUpState::CodeRequested | StepUpState::Verifying => {}
        }

        let now = Instant::now();
        let Some(challenge) = self.challenge.as_mut() else {
            return Err(StepUpError::NoChallenge);
        };
        if challenge.consumed {
            return Err(StepUpError::AlreadyConsumed);
        }
        if challenge.is_expired(now) {
            tracing::info!(action = challenge.action.id, "step-up challenge expired");
            self.state = StepUpState::Expired;
            self.stop_countdown();
            return Err(StepUpError::ChallengeExpired);
        }

        if !self.verifier.verify(challenge.action, code) {
            tracing::warn!(action = challenge.action.id, "step-up code rejected");
            self.state = StepUpState::Verifying;
            return Err(StepUpError::InvalidCode);
        }

        challenge.consumed = true;
        let action = challenge.action;
        self.state = StepUpState::Confirmed;
        self.stop_countdown();
        self.record_completion(action, true);
        Ok(action)
    }

    /// Returns `false` when there was nothing to cancel (idle or already confirmed).
    pub fn cancel(&mut self) -> bool {
        match self.state {
            StepUpState::Idle | StepUpState::Confirmed | StepUpState::Cancelled => false,
            StepUpState::CodeRequested | StepUpState::Verifying | StepUpState::Expired => {
                self.discard_challenge();
                self.state = StepUpState::Cancelled;
                tracing::debug!("step-up challenge cancelled");
                true
            }
        }
    }

    /// Back to `Idle`, forgetting the completion log. Used on logout.
    pub fn reset(&mut self) {
        self.discard_challenge();
        self.state = StepUpState::Idle;
        self.completed.clear();
    }

    fn open_challenge(&mut self, action: &'static SensitiveAction) {
        self.challenge = Some(StepUpChallenge::new(action));
        self.countdown = Some(Countdown::start(CHALLENGE_WINDOW));
        self.state = StepUpState::CodeRequested;
    }

    fn discard_challenge(&mut self) {
        self.stop_countdown();
        self.challenge = None;
    }

    fn stop_countdown(&mut self) {
        if let Some(mut countdown) = self.countdown.take() {
            countdown.stop();
        }
    }

    fn record_completion(&mut self, action: &'static SensitiveAction, stepped_up: bool) {
        tracing::info!(action = action.id, stepped_up, "sensitive action completed");
        self.completed.push(CompletedAction {
            action_id: action.id,
            stepped_up,
            completed_at: Utc::now(),
        });
    }
}
