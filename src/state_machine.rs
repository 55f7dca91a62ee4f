//! Reel flow state machine:
//! Idle → FetchingMetadata → DetectingLanguage → Transcribing → AssemblingRecipe → Delivered,
//! with Error reachable from every non-terminal state.
//! One tracker per incoming reel; it is never shared between flows.

use thiserror::Error;
use tracing::{info, warn};

/// States a single reel-processing request moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowState {
    Idle,
    FetchingMetadata,
    DetectingLanguage,
    Transcribing,
    AssemblingRecipe,
    Delivered,
    Error,
}

impl std::fmt::Display for FlowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlowState::Idle => write!(f, "Idle"),
            FlowState::FetchingMetadata => write!(f, "FetchingMetadata"),
            FlowState::DetectingLanguage => write!(f, "DetectingLanguage"),
            FlowState::Transcribing => write!(f, "Transcribing"),
            FlowState::AssemblingRecipe => write!(f, "AssemblingRecipe"),
            FlowState::Delivered => write!(f, "Delivered"),
            FlowState::Error => write!(f, "Error"),
        }
    }
}

/// Validated state transitions.
impl FlowState {
    /// Returns whether transitioning from `self` to `next` is valid.
    pub fn can_transition_to(self, next: FlowState) -> bool {
        matches!(
            (self, next),
            (FlowState::Idle, FlowState::FetchingMetadata)
                | (FlowState::FetchingMetadata, FlowState::DetectingLanguage)
                | (FlowState::DetectingLanguage, FlowState::Transcribing)
                | (FlowState::Transcribing, FlowState::AssemblingRecipe)
                | (FlowState::AssemblingRecipe, FlowState::Delivered)
        ) || (next == FlowState::Error && !self.is_terminal())
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, FlowState::Delivered | FlowState::Error)
    }

    /// Text shown in the progress message while in this state.
    pub fn progress_text(self) -> Option<&'static str> {
        match self {
            FlowState::FetchingMetadata => Some("Watching the video..."),
            FlowState::DetectingLanguage => Some("Detecting language..."),
            FlowState::Transcribing => Some("Transcribing..."),
            FlowState::AssemblingRecipe => Some("Compiling recipe..."),
            FlowState::Idle | FlowState::Delivered | FlowState::Error => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid transition: {from} -> {to}")]
pub struct InvalidTransition {
    pub from: FlowState,
    pub to: FlowState,
}

/// Tracks one flow's state and the path it took.
#[derive(Debug)]
pub struct FlowTracker {
    state: FlowState,
    history: Vec<FlowState>,
}

impl FlowTracker {
    pub fn new() -> Self {
        Self {
            state: FlowState::Idle,
            history: vec![FlowState::Idle],
        }
    }

    pub fn current(&self) -> FlowState {
        self.state
    }

    /// Every state visited so far, starting with `Idle`.
    pub fn history(&self) -> &[FlowState] {
        &self.history
    }

    /// Attempt a state transition. Returns Ok(new_state) or the rejected pair.
    pub fn transition(&mut self, next: FlowState) -> Result<FlowState, InvalidTransition> {
        let current = self.state;
        if !current.can_transition_to(next) {
            let err = InvalidTransition {
                from: current,
                to: next,
            };
            warn!("{}", err);
            return Err(err);
        }
        self.state = next;
        self.history.push(next);
        info!(from = %current, to = %next, "state_transition");
        Ok(next)
    }
}

impl Default for FlowTracker {
    fn default() -> Self {
        Self::new()
    }
}
