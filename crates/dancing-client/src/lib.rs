//! # dancing-client
//!
//! Client SDK for the Dancing video/social platform.
//!
//! ## Features
//!
//! - **Authenticated transport** - token injection, local rejection of
//!   protected calls without a token, 401 handling
//! - **Session store** - login/logout/restore mirrored into token storage
//! - **Typed APIs** - users, videos, friends, posts, video-call rooms
//! - **Route table** - view routes with `requiresAuth` metadata
//!
//! ## Quick Start
//!
//! ```no_run
//! use dancing_client::DancingClient;
//! use dancing_config::Config;
//!
//! # async fn example() -> Result<(), dancing_client::ClientError> {
//! let client = DancingClient::from_config(&Config::default())?;
//!
//! let outcome = client.session().login("alice", "secret").await;
//! if outcome.success {
//!     let videos = client.videos().list().await?.into_data()?;
//!     println!("{} videos", videos.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod client;
pub mod endpoint;
pub mod envelope;
pub mod error;
pub mod models;
pub mod navigator;
pub mod routes;
pub mod session;
pub mod storage;
pub mod transport;

// Re-export main types for convenience
pub use api::{FriendApi, PostApi, UserApi, VideoApi, VideoCallApi, VideoUpload};
pub use client::DancingClient;
pub use endpoint::{Access, Endpoint};
pub use envelope::{Ack, Envelope};
pub use error::{ClientError, ClientResult};
pub use navigator::{redirect_to_login, MemoryNavigator, Navigator};
pub use routes::{GuardPolicy, NavigationError, RouteEntry, RouteMatch, Router, View};
pub use session::{AuthOutcome, Session, SessionStore};
pub use storage::{FileTokenStore, MemoryTokenStore, StorageError, TokenStore};
pub use transport::{Payload, Transport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
