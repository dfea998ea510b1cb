//! View-state controllers, one per screen.
//!
//! Controllers never talk to the network themselves. A `begin_*` method
//! moves the controller into its in-flight state and returns the request the
//! app should run; the matching `finish_*` method applies the outcome and may
//! return the route to navigate to next.

pub mod dashboard;
pub mod input;
pub mod knowledge_detail;
pub mod knowledge_form;
pub mod knowledge_list;
pub mod search;
pub mod signin;
pub mod signup;
pub mod source_detail;
pub mod source_form;
pub mod sources_list;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed(String),
}

impl LoadState {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            LoadState::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// Stamps fetches so only the most recent response is applied.
///
/// Earlier requests are not cancelled; their responses are dropped on arrival.
#[derive(Debug, Clone, Default)]
pub struct RequestSeq {
    latest: u64,
}

impl RequestSeq {
    pub fn next(&mut self) -> u64 {
        self.latest += 1;
        self.latest
    }

    pub fn is_current(&self, seq: u64) -> bool {
        seq == self.latest
    }
}

/// Moves a list cursor by `delta`, clamped to `len`.
pub fn step(index: usize, len: usize, delta: isize) -> usize {
    if len == 0 {
        return 0;
    }
    index.saturating_add_signed(delta).min(len - 1)
}

/// Cycles a form focus index forwards or backwards.
pub fn cycle(index: usize, len: usize, forward: bool) -> usize {
    if len == 0 {
        return 0;
    }
    if forward {
        (index + 1) % len
    } else {
        (index + len - 1) % len
    }
}
