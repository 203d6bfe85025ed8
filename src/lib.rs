//! Signatory feed - live roster client for the Reactive Manifesto
//!
//! Keeps an observable list of manifesto signatories in sync with the server
//! while the user searches, pages and signs.
//!
//! # Architecture
//!
//! - **signatory**: raw entries, relative age and version classification
//! - **link**: `Link: <url>; rel=next` cursor parsing
//! - **feed**: the roster state machine and the actor that drives it
//! - **session**: current user, sign/unsign, provider login
//! - **transport**: the HTTP seam, with a `reqwest` implementation
//!
//! # Example
//!
//! ```rust,no_run
//! use signatory_feed::{
//!     ClientConfig, Enricher, FeedController, ManifestoApi, ReqwestTransport, View,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::default();
//! let api = ManifestoApi::new(ReqwestTransport::new(config.timeout())?, &config.base_url);
//! let (feed, _task) = FeedController::spawn(
//!     api,
//!     Enricher::new(config.version_schedule()),
//!     config.controller(),
//! );
//!
//! feed.initial_load(View::Home).await?;
//! feed.set_term("bon").await?;
//! let snapshot = feed.settled().await?;
//! for record in snapshot.roster.iter() {
//!     println!("{} signed {}", record.identity.display_name(), record.display_age);
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod feed;
pub mod link;
pub mod session;
pub mod signatory;
pub mod transport;

pub use api::{ManifestoApi, SignatoryPage, User};
pub use config::ClientConfig;
pub use error::{FeedError, Result};
pub use feed::{FeedController, FeedHandle, FeedMachine, FeedSnapshot, View};
pub use link::parse_next_link;
pub use session::{
    LoginCompletion, PendingLogin, PopupSpec, Provider, SessionController, SessionSnapshot,
};
pub use signatory::{DocumentVersion, Enricher, RawSignatory, SignatoryRecord, VersionSchedule};
pub use transport::{HttpResponse, Method, ReqwestTransport, Transport};
