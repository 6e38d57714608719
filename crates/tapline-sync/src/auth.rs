//! # Auth Use Case
//!
//! One credential submission, two emissions: `loading`, then either the
//! signed-in user or the failure message.

use std::sync::Arc;

use futures_util::stream::{BoxStream, StreamExt};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

use tapline_core::{AuthResult, AuthSummary, Credential, DataState, Email, Token, UserInfo, Username};

use crate::context::AppContext;
use crate::remote::{NetResponse, RemoteClient};

/// Sequence of auth states.
pub type AuthStream = BoxStream<'static, DataState<AuthSummary>>;

/// Submits credentials. Never retries.
#[derive(Clone)]
pub struct AuthUseCase {
    remote: Arc<dyn RemoteClient>,
    runtime: Handle,
}

impl std::fmt::Debug for AuthUseCase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthUseCase").finish_non_exhaustive()
    }
}

impl AuthUseCase {
    pub fn new(ctx: &AppContext) -> Self {
        AuthUseCase {
            remote: Arc::clone(&ctx.remote),
            runtime: ctx.runtime.clone(),
        }
    }

    /// Emits `loading`, then the outcome of the login. The call runs on the
    /// context's runtime.
    pub fn authenticate(&self, username: impl Into<String>, password: impl Into<String>) -> AuthStream {
        let credential = Credential::new(username, password);
        let remote = Arc::clone(&self.remote);
        let (tx, rx) = mpsc::channel(2);

        self.runtime.spawn(async move {
            if tx.send(DataState::loading()).await.is_err() {
                return;
            }

            let result = match remote.submit_credential(&credential).await {
                NetResponse::Success { user, auth_token } => {
                    info!(username = %user.username, "Login succeeded");
                    AuthResult::Success {
                        user: UserInfo {
                            username: Username::new(user.username),
                            email: Email::new(user.email),
                            token: Token::new(auth_token),
                        },
                    }
                }
                NetResponse::Error { message } => {
                    warn!(username = %credential.username, %message, "Login failed");
                    AuthResult::Error { message }
                }
            };

            if tx.send(result.into_state()).await.is_err() {
                debug!("Auth consumer went away");
            }
        });

        ReceiverStream::new(rx).boxed()
    }
}
