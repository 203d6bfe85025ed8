//! Sans-IO state machine behind the feed controller
//!
//! Every operation returns the request (if any) the caller must issue, and
//! every response is fed back through [`FeedMachine::complete`]. The machine
//! never performs I/O, so the race policy can be exercised by delivering
//! responses in any order.
//!
//! Race policy: a refresh or search response is only final if, on arrival,
//! the live search term still matches what was asked for. Otherwise exactly
//! one follow-up request is issued for the latest term. The live term is the
//! single "desired term" register; nothing recurses.

use crate::signatory::SignatoryRecord;
use std::sync::Arc;
use tracing::debug;

/// Identifies an issued request
pub type RequestId = u64;

/// A request the driver must perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// `/signatories?per_page=N`
    List { per_page: u32 },
    /// `/search?query=TERM`
    Search { term: String },
    /// Follow a pagination cursor
    Page { cursor: String },
    /// `/signatories/total`
    Total,
}

/// A request tagged with its id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub id: RequestId,
    pub request: Request,
}

/// Enriched records from one page response
#[derive(Debug, Clone, Default)]
pub struct PageBatch {
    pub records: Vec<SignatoryRecord>,
    pub next: Option<String>,
}

/// What came back for a request
#[derive(Debug, Clone)]
pub enum Outcome {
    Page(PageBatch),
    Total(u64),
    Failed(String),
}

/// Tunables for the machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MachineConfig {
    /// Page size for the fallback refresh when the term is cleared
    pub default_page_size: u32,
    /// Shortest term that fires a search
    pub min_search_len: usize,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            default_page_size: 30,
            min_search_len: 2,
        }
    }
}

/// Immutable view of the feed for observers
#[derive(Debug, Clone, Default)]
pub struct FeedSnapshot {
    pub roster: Arc<Vec<SignatoryRecord>>,
    pub total: Option<u64>,
    pub term: String,
    /// A refresh or search is outstanding
    pub searching: bool,
    /// A cursor page is outstanding
    pub loading_more: bool,
    /// A total refresh is outstanding
    pub loading_total: bool,
    /// Next page URL
    pub cursor: Option<String>,
    /// Most recent failure, cleared by the next successful roster load
    pub last_error: Option<String>,
}

impl FeedSnapshot {
    pub fn has_more(&self) -> bool {
        self.cursor.is_some()
    }

    /// No request of any kind is outstanding
    pub fn is_settled(&self) -> bool {
        !self.searching && !self.loading_more && !self.loading_total
    }
}

#[derive(Debug, Clone)]
struct PendingPage {
    id: RequestId,
    /// Roster generation the page extends
    generation: u64,
}

/// The feed state machine
#[derive(Debug)]
pub struct FeedMachine {
    config: MachineConfig,
    roster: Arc<Vec<SignatoryRecord>>,
    /// Bumped whenever the roster is replaced
    generation: u64,
    cursor: Option<String>,
    term: String,
    searching: bool,
    total: Option<u64>,
    last_error: Option<String>,
    next_id: RequestId,
    /// The one refresh/search whose response may replace the roster
    authoritative: Option<Command>,
    page: Option<PendingPage>,
    total_request: Option<RequestId>,
}

impl FeedMachine {
    pub fn new(config: MachineConfig) -> Self {
        Self {
            config,
            roster: Arc::new(Vec::new()),
            generation: 0,
            cursor: None,
            term: String::new(),
            searching: false,
            total: None,
            last_error: None,
            next_id: 1,
            authoritative: None,
            page: None,
            total_request: None,
        }
    }

    pub fn config(&self) -> MachineConfig {
        self.config
    }

    pub fn roster(&self) -> &[SignatoryRecord] {
        &self.roster
    }

    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn is_searching(&self) -> bool {
        self.searching
    }

    pub fn total(&self) -> Option<u64> {
        self.total
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        FeedSnapshot {
            roster: Arc::clone(&self.roster),
            total: self.total,
            term: self.term.clone(),
            searching: self.searching,
            loading_more: self.page.is_some(),
            loading_total: self.total_request.is_some(),
            cursor: self.cursor.clone(),
            last_error: self.last_error.clone(),
        }
    }

    /// Record a keystroke and fire the request it implies.
    ///
    /// Long enough terms search, an empty term reloads the default listing,
    /// shorter terms are inert. Nothing fires while a search is outstanding;
    /// its completion picks up the new term instead. Re-setting the same term
    /// is not a change and fires nothing.
    pub fn set_term(&mut self, term: impl Into<String>) -> Option<Command> {
        let term = term.into();
        if term == self.term {
            return None;
        }
        self.term = term;
        if self.searching {
            return None;
        }

        let len = self.term.chars().count();
        if len >= self.config.min_search_len {
            let term = self.term.clone();
            Some(self.search(term))
        } else if len == 0 {
            Some(self.refresh(self.config.default_page_size))
        } else {
            None
        }
    }

    /// Load the first page of the default listing
    pub fn refresh(&mut self, per_page: u32) -> Command {
        self.issue_authoritative(Request::List { per_page })
    }

    /// Load the first page of results for `term`
    pub fn search(&mut self, term: impl Into<String>) -> Command {
        self.issue_authoritative(Request::Search { term: term.into() })
    }

    /// Request the next page, if there is one and none is already loading
    pub fn fetch_more(&mut self) -> Option<Command> {
        if self.page.is_some() {
            debug!("fetch_more ignored: a page is already loading");
            return None;
        }
        let cursor = match &self.cursor {
            Some(cursor) => cursor.clone(),
            None => {
                debug!("fetch_more ignored: no next page");
                return None;
            }
        };

        let command = self.issue(Request::Page { cursor });
        self.page = Some(PendingPage {
            id: command.id,
            generation: self.generation,
        });
        Some(command)
    }

    /// Reload the signatory count
    pub fn refresh_total(&mut self) -> Command {
        let command = self.issue(Request::Total);
        self.total_request = Some(command.id);
        command
    }

    /// Feed a response back in; returns the follow-up request, if any
    pub fn complete(&mut self, id: RequestId, outcome: Outcome) -> Option<Command> {
        if let Some(current) = self.authoritative.as_ref().filter(|c| c.id == id) {
            let request = current.request.clone();
            self.authoritative = None;
            return self.complete_authoritative(request, outcome);
        }

        if self.page.as_ref().is_some_and(|p| p.id == id) {
            self.complete_page(outcome);
            return None;
        }

        if self.total_request == Some(id) {
            self.total_request = None;
            match outcome {
                Outcome::Total(total) => self.total = Some(total),
                Outcome::Failed(error) => self.last_error = Some(error),
                Outcome::Page(_) => debug!("request {} expected a total, got a page", id),
            }
            return None;
        }

        debug!("Dropping response to superseded request {}", id);
        None
    }

    // === Private Implementation ===

    fn issue(&mut self, request: Request) -> Command {
        let id = self.next_id;
        self.next_id += 1;
        Command { id, request }
    }

    fn issue_authoritative(&mut self, request: Request) -> Command {
        let command = self.issue(request);
        if let Some(previous) = self.authoritative.replace(command.clone()) {
            debug!("Request {} supersedes {}", command.id, previous.id);
        }
        self.searching = true;
        command
    }

    fn complete_authoritative(&mut self, request: Request, outcome: Outcome) -> Option<Command> {
        match outcome {
            Outcome::Page(batch) => {
                self.roster = Arc::new(batch.records);
                self.generation += 1;
                self.cursor = batch.next;
                self.last_error = None;
            }
            Outcome::Failed(error) => self.last_error = Some(error),
            Outcome::Total(_) => {
                debug!("roster request answered with a total, ignoring");
            }
        }
        self.follow_live_term(request)
    }

    /// Chase the live term after a roster request settles, whatever its outcome
    fn follow_live_term(&mut self, settled: Request) -> Option<Command> {
        let current_len = self.term.chars().count();
        match settled {
            Request::List { .. } if current_len >= self.config.min_search_len => {
                let term = self.term.clone();
                Some(self.search(term))
            }
            Request::Search { term: issued } if issued != self.term => {
                if current_len >= self.config.min_search_len {
                    debug!("Search for {:?} superseded by {:?}", issued, self.term);
                    let term = self.term.clone();
                    Some(self.search(term))
                } else if current_len == 0 {
                    Some(self.refresh(self.config.default_page_size))
                } else {
                    self.searching = false;
                    None
                }
            }
            _ => {
                self.searching = false;
                None
            }
        }
    }

    fn complete_page(&mut self, outcome: Outcome) {
        let Some(pending) = self.page.take() else {
            return;
        };

        match outcome {
            Outcome::Page(batch) if pending.generation == self.generation => {
                Arc::make_mut(&mut self.roster).extend(batch.records);
                self.cursor = batch.next;
            }
            Outcome::Page(_) => {
                debug!("Dropping page {}: roster replaced while it loaded", pending.id);
            }
            Outcome::Failed(error) => self.last_error = Some(error),
            Outcome::Total(_) => debug!("page request {} answered with a total", pending.id),
        }
    }
}

impl Default for FeedMachine {
    fn default() -> Self {
        Self::new(MachineConfig::default())
    }
}
