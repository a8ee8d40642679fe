use axum::Router;
use tokio::net::{TcpListener, ToSocketAddrs};
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::routes;
use crate::ReelState;

pub struct ReelApp {
    pub state: ReelState,
    router: Router<()>,
}

impl ReelApp {
    pub fn new(state: ReelState) -> Self {
        let router = routes::router().with_state(state.clone());
        Self { state, router }
    }

    /// The complete router with request-id and tracing layers.
    pub fn into_router(self) -> Router<()> {
        self.router.layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
    }

    pub async fn listen<A>(self, addr: A) -> anyhow::Result<()>
    where
        A: ToSocketAddrs,
    {
        let listener = TcpListener::bind(addr).await?;
        tracing::info!(addr = %listener.local_addr()?, "reel listening");
        axum::serve(listener, self.into_router()).await?;
        Ok(())
    }
}
