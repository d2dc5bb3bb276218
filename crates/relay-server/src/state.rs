use relay::{completion::CompletionExchange, coordinator::RunCompletionCoordinator};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<RunCompletionCoordinator>,
    pub completion: Arc<CompletionExchange>,
    /// Cancelled when the server shuts down, every request works on a child of it
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(
        coordinator: RunCompletionCoordinator,
        completion: CompletionExchange,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            coordinator: Arc::new(coordinator),
            completion: Arc::new(completion),
            shutdown,
        }
    }
}
