mod authenticator;
mod catalog;
mod countdown;
mod verifier;

pub use authenticator::{
    ActionDecision, CHALLENGE_WINDOW, CompletedAction, StepUpAuthenticator, StepUpState,
};
pub use catalog::{SENSITIVE_ACTIONS, SensitiveAction, find_action};
pub use countdown::Countdown;
pub use verifier::{CODE_LENGTH, DEMO_CODE, DemoCodeVerifier, OtpVerifier};
