//! Signatory feed: roster, search and pagination
//!
//! [`FeedMachine`] holds the state and the race policy without doing any
//! I/O. [`FeedController`] runs it as an actor over a [`Transport`](crate::transport::Transport)
//! and publishes [`FeedSnapshot`]s to any number of observers.

mod controller;
mod machine;

pub use controller::{ControllerConfig, FeedController, FeedHandle, View};
pub use machine::{
    Command, FeedMachine, FeedSnapshot, MachineConfig, Outcome, PageBatch, Request, RequestId,
};
