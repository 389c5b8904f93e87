//! Protobuf wire messages
//!
//! Field numbers are part of the consensus format: block IDs are hashes of
//! these encodings, so tags and types must never change.

mod block_messages;
mod transaction_messages;

pub use block_messages::*;
pub use transaction_messages::*;
