use jobscout_core::orchestrator::ScrapeOrchestrator;
use jobscout_core::traits::SessionProvider;

/// Shared application state, available to all route handlers via `State<Arc<AppState<P>>>`.
pub struct AppState<P: SessionProvider> {
    pub orchestrator: ScrapeOrchestrator<P>,
    /// Per-source cap used when a request omits `max_results`.
    pub default_max_results: usize,
}
