//! The turn pipeline for Pathwise.
//!
//! Every chat message goes through the same steps:
//!
//! 1. **Load** the college/branch catalog (optionally through a TTL cache)
//! 2. **Match** entity names mentioned in the message
//! 3. **Assemble** a counselor prompt with a context block for the matches
//! 4. **Invoke** the completion provider once
//! 5. **Log** the exchange to the session log and return the answer
//!
//! Collaborators (catalog store, session log, provider) are passed in as
//! trait objects so each stage can be tested in isolation.

pub mod assembler;
pub mod cache;
pub mod invoker;
pub mod matcher;
pub mod orchestrator;

#[cfg(test)]
mod test_helpers;

pub use assembler::{assemble, render_context};
pub use cache::CachedCatalog;
pub use invoker::CompletionInvoker;
pub use matcher::{MatchResult, MatchedCollege, match_entities};
pub use orchestrator::{TurnError, TurnOrchestrator, TurnOutcome, TurnRequest, TurnState};
