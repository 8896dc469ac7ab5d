//! In-process command worker ("the bot").
//!
//! The worker consumes command envelopes from the commands queue, looks up
//! the requested quote and publishes a reply on the responses queue. The
//! hub never talks to it directly.

mod quote;
mod worker;

pub use quote::{format_quote, QuoteProvider, StooqClient};
pub use worker::{
    CommandError, CommandMessage, Worker, EXTERNAL_FAILURE_TEXT, INTERNAL_FAILURE_TEXT,
};
