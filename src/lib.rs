//! Chat message post-processor for YouTube content.
//!
//! Turns `@<youtube link>` markers into inline players and expands
//! `{{yt-<name>::<link or id>}}` macros into video metadata fetched through
//! the chat server's YouTube plugin.

pub mod cache;
pub mod chat;
pub mod config;
pub mod error;
pub mod sources;
pub mod ui;

pub use chat::{EmbedSubsystem, FailurePolicy, MessageEvent, MessagePipeline};
pub use error::{Result, TubeError};
