//! Actor that drives the feed state machine
//!
//! All operations on the feed (keystrokes, refreshes, page loads and request
//! completions) are serialized through one mailbox and applied to a single
//! [`FeedMachine`] owned by the controller task. Requests run as their own
//! tasks and post their outcome back into the mailbox, so responses may
//! arrive in any order while no two handlers ever interleave.

use super::machine::{Command, FeedMachine, FeedSnapshot, MachineConfig, Outcome, PageBatch, Request, RequestId};
use crate::api::ManifestoApi;
use crate::error::{FeedError, Result};
use crate::signatory::Enricher;
use crate::transport::Transport;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Which page of the site is being rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    /// Front page: a short roster
    #[default]
    Home,
    /// The `/list` page: a long roster
    FullList,
}

/// Controller settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerConfig {
    pub machine: MachineConfig,
    /// Page size for [`View::FullList`]
    pub list_page_size: u32,
    /// Mailbox depth
    pub mailbox_capacity: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            machine: MachineConfig::default(),
            list_page_size: 200,
            mailbox_capacity: 64,
        }
    }
}

/// Operations accepted by the controller
#[derive(Debug)]
enum Message {
    SetTerm(String),
    Refresh(u32),
    Search(String),
    FetchMore,
    RefreshTotal,
}

/// Mailbox entry; `ack` fires once the message has been applied
struct Envelope {
    message: Message,
    ack: oneshot::Sender<()>,
}

/// A finished request
struct Completion {
    id: RequestId,
    outcome: Outcome,
}

/// Cloneable handle to a running [`FeedController`]
#[derive(Clone)]
pub struct FeedHandle {
    mailbox: mpsc::Sender<Envelope>,
    state: watch::Receiver<FeedSnapshot>,
    config: ControllerConfig,
}

impl FeedHandle {
    /// Update the search term (one keystroke)
    pub async fn set_term(&self, term: impl Into<String>) -> Result<()> {
        self.send(Message::SetTerm(term.into())).await
    }

    /// Reload the default listing with `per_page` entries
    pub async fn refresh(&self, per_page: u32) -> Result<()> {
        self.send(Message::Refresh(per_page)).await
    }

    /// Search for `term` directly, bypassing the keystroke trigger
    pub async fn search(&self, term: impl Into<String>) -> Result<()> {
        self.send(Message::Search(term.into())).await
    }

    /// Append the next page, if any
    pub async fn fetch_more(&self) -> Result<()> {
        self.send(Message::FetchMore).await
    }

    /// Reload the signatory count
    pub async fn refresh_total(&self) -> Result<()> {
        self.send(Message::RefreshTotal).await
    }

    /// Load the total and the roster sized for `view`
    pub async fn initial_load(&self, view: View) -> Result<()> {
        let per_page = match view {
            View::Home => self.config.machine.default_page_size,
            View::FullList => self.config.list_page_size,
        };
        self.refresh_total().await?;
        self.refresh(per_page).await
    }

    /// Latest state
    pub fn snapshot(&self) -> FeedSnapshot {
        self.state.borrow().clone()
    }

    /// Watch every state change
    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.state.clone()
    }

    /// Wait until no request is outstanding
    pub async fn settled(&self) -> Result<FeedSnapshot> {
        let mut state = self.state.clone();
        let snapshot = state
            .wait_for(FeedSnapshot::is_settled)
            .await
            .map_err(|_| FeedError::ControllerClosed)?;
        Ok(snapshot.clone())
    }

    pub fn config(&self) -> ControllerConfig {
        self.config
    }

    async fn send(&self, message: Message) -> Result<()> {
        let (ack, applied) = oneshot::channel();
        self.mailbox
            .send(Envelope { message, ack })
            .await
            .map_err(|_| FeedError::ControllerClosed)?;
        applied.await.map_err(|_| FeedError::ControllerClosed)
    }
}

/// Owns the feed state and performs its requests
pub struct FeedController<T> {
    api: ManifestoApi<T>,
    enricher: Arc<Enricher>,
    machine: FeedMachine,
    inbox: mpsc::Receiver<Envelope>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions: mpsc::UnboundedReceiver<Completion>,
    state: watch::Sender<FeedSnapshot>,
}

impl<T: Transport> FeedController<T> {
    /// Start the controller task and return a handle to it.
    ///
    /// The task ends once every [`FeedHandle`] has been dropped.
    pub fn spawn(
        api: ManifestoApi<T>,
        enricher: Enricher,
        config: ControllerConfig,
    ) -> (FeedHandle, JoinHandle<()>) {
        let (mailbox, inbox) = mpsc::channel(config.mailbox_capacity.max(1));
        let (completions_tx, completions) = mpsc::unbounded_channel();
        let machine = FeedMachine::new(config.machine);
        let (state, state_rx) = watch::channel(machine.snapshot());

        let controller = FeedController {
            api,
            enricher: Arc::new(enricher),
            machine,
            inbox,
            completions_tx,
            completions,
            state,
        };

        let handle = FeedHandle {
            mailbox,
            state: state_rx,
            config,
        };

        (handle, tokio::spawn(controller.run()))
    }

    async fn run(mut self) {
        info!("Feed controller started against {}", self.api.base_url());

        loop {
            tokio::select! {
                maybe = self.inbox.recv() => match maybe {
                    Some(Envelope { message, ack }) => {
                        self.apply(message);
                        self.publish();
                        let _ = ack.send(());
                    }
                    None => break,
                },
                Some(Completion { id, outcome }) = self.completions.recv() => {
                    if let Some(command) = self.machine.complete(id, outcome) {
                        self.dispatch(command);
                    }
                    self.publish();
                }
            }
        }

        info!("Feed controller stopped");
    }

    fn apply(&mut self, message: Message) {
        debug!("Feed message: {:?}", message);
        let command = match message {
            Message::SetTerm(term) => self.machine.set_term(term),
            Message::Refresh(per_page) => Some(self.machine.refresh(per_page)),
            Message::Search(term) => Some(self.machine.search(term)),
            Message::FetchMore => self.machine.fetch_more(),
            Message::RefreshTotal => Some(self.machine.refresh_total()),
        };
        if let Some(command) = command {
            self.dispatch(command);
        }
    }

    fn publish(&self) {
        self.state.send_replace(self.machine.snapshot());
    }

    /// Run a request on its own task; its outcome comes back as a completion
    fn dispatch(&self, command: Command) {
        let Command { id, request } = command;
        debug!("Issuing request {}: {:?}", id, request);

        let api = self.api.clone();
        let enricher = Arc::clone(&self.enricher);
        let completions = self.completions_tx.clone();

        tokio::spawn(async move {
            let outcome = perform(&api, &enricher, &request).await;
            if let Outcome::Failed(error) = &outcome {
                warn!("Request {} ({:?}) failed: {}", id, request, error);
            }
            // the controller may have shut down meanwhile
            let _ = completions.send(Completion { id, outcome });
        });
    }
}

async fn perform<T: Transport>(
    api: &ManifestoApi<T>,
    enricher: &Enricher,
    request: &Request,
) -> Outcome {
    let result = match request {
        Request::List { per_page } => api.list(*per_page).await,
        Request::Search { term } => api.search(term).await,
        Request::Page { cursor } => api.page(cursor).await,
        Request::Total => {
            return match api.total().await {
                Ok(total) => Outcome::Total(total),
                Err(e) => Outcome::Failed(e.to_string()),
            }
        }
    };

    match result {
        Ok(page) => Outcome::Page(PageBatch {
            records: enricher.enrich_now(page.signatories),
            next: page.next,
        }),
        Err(e) => Outcome::Failed(e.to_string()),
    }
}
