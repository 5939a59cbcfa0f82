pub mod dto;
mod repos;
pub mod response;
mod router;

use std::future::Future;

use axum::Router;
use tokio::net::TcpListener;

pub use repos::repo_router;
pub use router::{AppState, create_router};

use crate::apache::RestartCoordinator;
use crate::error::Result;

/// Serves until `shutdown` resolves, then performs any queued Apache
/// restart. The restart is flushed even when serving failed.
pub async fn serve<F>(
    listener: TcpListener,
    router: Router,
    shutdown: F,
    restarter: &RestartCoordinator,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let served = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await;
    if let Err(e) = &served {
        tracing::error!("server error: {e}");
    }

    restarter.flush().await?;
    served?;
    Ok(())
}
