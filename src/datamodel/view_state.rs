/// Lifecycle of the data behind one dashboard view.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ViewState<T> {
    #[default]
    Idle,
    Loading,
    Loaded(T),
    Failed(String),
}

impl<T> ViewState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading)
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            ViewState::Loaded(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ViewState::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}

/// Identifies one refresh; only the most recent ticket may complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket(u64);

/// A view state that tolerates overlapping fetches.
///
/// Starting a refresh invalidates every earlier ticket, so a slow response
/// arriving after a newer request was issued is discarded instead of
/// overwriting fresher data.
#[derive(Debug, Clone, Default)]
pub struct RefreshTracker<T> {
    state: ViewState<T>,
    generation: u64,
}

impl<T> RefreshTracker<T> {
    pub fn new() -> Self {
        Self {
            state: ViewState::Idle,
            generation: 0,
        }
    }

    pub fn state(&self) -> &ViewState<T> {
        &self.state
    }

    pub fn begin_refresh(&mut self) -> RefreshTicket {
        self.generation += 1;
        self.state = ViewState::Loading;
        RefreshTicket(self.generation)
    }

    /// Returns `false` when the ticket is stale and the outcome was dropped.
    pub fn complete<E: ToString>(&mut self, ticket: RefreshTicket, outcome: Result<T, E>) -> bool {
        if ticket.0 != self.generation {
            return false;
        }
        self.state = match outcome {
            Ok(data) => ViewState::Loaded(data),
            Err(err) => ViewState::Failed(err.to_string()),
        };
        true
    }

    /// Periodic refreshes are skipped while a fetch is in flight.
    pub fn should_auto_refresh(&self) -> bool {
        !self.state.is_loading()
    }

    pub fn reset(&mut self) {
        self.generation += 1;
        self.state = ViewState::Idle;
    }
}
