//! Codec for the persisted casting state.

mod containers;
mod document;

pub use containers::{TaggedMap, TaggedSet, decode, encode, tagged_map, tagged_set};
pub use document::StateCodec;
