//! JSON API server over the repositories.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use mailgate_store::{EmailRecord, EmailStore, NewUser, User, UserSearchTerms, UserStore};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::timeout::TimeoutLayer;
use tracing::info;

use crate::{
    config::HttpConfig,
    error::{ApiError, HttpError},
};

/// Shared handles the request handlers work against.
#[derive(Clone)]
pub struct AppState {
    users: Arc<dyn UserStore>,
    emails: Arc<dyn EmailStore>,
}

impl AppState {
    #[must_use]
    pub const fn new(users: Arc<dyn UserStore>, emails: Arc<dyn EmailStore>) -> Self {
        Self { users, emails }
    }
}

/// HTTP server bound to its configured address.
pub struct HttpServer {
    address: SocketAddr,
    listener: TcpListener,
    router: Router,
}

impl HttpServer {
    /// Bind the server and build its routes.
    ///
    /// Binding happens here rather than in [`serve`](Self::serve) so a
    /// taken port fails startup instead of surfacing later.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured address cannot be bound.
    pub async fn new(config: &HttpConfig, state: AppState) -> Result<Self, HttpError> {
        let listener = TcpListener::bind(&config.listen_address)
            .await
            .map_err(|error| HttpError::Bind {
                address: config.listen_address.clone(),
                source: error,
            })?;
        let address = listener.local_addr().map_err(|error| HttpError::Bind {
            address: config.listen_address.clone(),
            source: error,
        })?;

        let router =
            router(state).layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout)));

        Ok(Self {
            address,
            listener,
            router,
        })
    }

    /// The bound address, with any ephemeral port resolved.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.address
    }

    /// Run the server until `cancel` fires, then drain in-flight
    /// requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the server stops with a runtime error.
    pub async fn serve(self, cancel: CancellationToken) -> Result<(), HttpError> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(async move {
                cancel.cancelled().await;
                info!("Http server draining");
            })
            .await
            .map_err(|error| HttpError::Server(error.to_string()))?;

        info!("Http server stopped");
        Ok(())
    }
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/users", post(create_user))
        .route("/v1/users/search", post(search_user))
        .route("/v1/users/{id}", get(get_user))
        .route("/v1/emails/{id}", get(get_email))
        .route("/health/live", get(liveness))
        .with_state(state)
}

async fn create_user(
    State(state): State<AppState>,
    Json(new_user): Json<NewUser>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let user = state.users.create_user(new_user).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(state.users.get_user(&id).await?))
}

async fn search_user(
    State(state): State<AppState>,
    Json(terms): Json<UserSearchTerms>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(state.users.search_user(terms).await?))
}

async fn get_email(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EmailRecord>, ApiError> {
    Ok(Json(state.emails.get_email(&id).await?))
}

/// Liveness probe. Answering at all is the signal.
async fn liveness() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}
