//! # SmartPick Core
//!
//! Domain types, traits, and error definitions for the SmartPick card
//! recommendation backend. This crate has **no framework dependencies**; it
//! defines the model the other crates build on:
//!
//! - [`catalog`]: the fixed card catalog and free-text → card id matching
//! - [`rotation`]: shortest-path carousel targeting and the carousel controller
//! - [`thread`]: threads, items and their wire shapes
//! - [`agent`]: the remote agent collaborator contract
//! - [`event`]: UI signals published by the operation router

pub mod agent;
pub mod catalog;
pub mod error;
pub mod event;
pub mod rotation;
pub mod thread;

// Re-export key types at crate root for ergonomics
pub use agent::{Agent, AgentReply};
pub use catalog::{Catalog, CatalogEntry, EntityId};
pub use error::{AgentError, CatalogError, Error, Result};
pub use event::{SignalBus, UiSignal};
pub use rotation::{Carousel, CarouselMode, RotationCommand, RotationState, next_target};
pub use thread::{
    AssistantContent, AssistantMessage, Page, Thread, ThreadItem, ThreadStatus, ThreadView,
    UserContent, UserMessage,
};
