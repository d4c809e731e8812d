//! Domain types and pure logic for the font-recommendation evaluation tool.
//!
//! Nothing in this crate performs I/O. The store, the recommendation
//! client, and the HTTP service all build on these types.

pub mod candidate;
pub mod error;
pub mod prompts;
pub mod rating;
pub mod reconcile;
pub mod score;
pub mod session;
pub mod types;
