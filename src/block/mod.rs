//! Block module - identity, headers, wire codecs, signing and verification

mod binary;
#[allow(clippy::module_inception)]
mod block;
mod codec;
mod header;
mod id;
mod proto;
mod rewards;
mod version;

pub use binary::{append_header_bytes_to_transactions, block_signature_from_bytes};
pub use block::*;
pub use codec::*;
pub use header::*;
pub use id::*;
pub use rewards::*;
pub use version::*;
