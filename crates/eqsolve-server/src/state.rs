use eqsolve::solver::Solver;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub solver: Arc<Solver>,
}

impl AppState {
    pub fn new(solver: Solver) -> Self {
        Self {
            solver: Arc::new(solver),
        }
    }
}
