//! Core types shared by every burnbin crate.
//!
//! A paste is a [`PasteRecord`] pointing at a content-addressed blob by its
//! [`ContentHash`]. Many records may share one hash; the blob is only
//! reclaimable once every record in that group is unreadable.

pub mod hash;
pub mod id;
pub mod paste;

pub use hash::ContentHash;
pub use id::{DEFAULT_ID_LENGTH, PUBLIC_ID_ALPHABET, generate_public_id};
pub use paste::{PasteRecord, Unreadable};
