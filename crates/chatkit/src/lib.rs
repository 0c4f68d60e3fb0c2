//! # SmartPick ChatKit
//!
//! A local, in-process stand-in for the chat widget's streaming backend.
//! Operations arrive as JSON envelopes; synchronous ones are answered from
//! the [`ThreadStore`], streaming ones run one agent turn and come back as an
//! ordered [`TurnStream`] of protocol events.

pub mod operation;
pub mod router;
pub mod store;
pub mod stream;

pub use operation::{Operation, UserInput};
pub use router::{OperationRouter, RouterResponse};
pub use store::ThreadStore;
pub use stream::{ItemUpdate, StreamEvent, TurnStream, emulate, frame, word_chunks};
