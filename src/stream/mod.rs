//! Byte-stream primitives for encoding and decoding type references.
//!
//! The outer serializer owns its stream; this module only defines what the type-identity layer
//! needs from it. [`WireRead`] is the decoding capability, [`WireReader`] its slice-backed
//! implementation and [`WireWriter`] the encoding counterpart.
//!
//! # Wire conventions
//!
//! - Length-encoded byte sequences: `i32` little-endian byte count followed by the bytes
//! - Indexed type ids: `u16` little-endian
//! - Field counts: a single unsigned byte

pub mod io;
mod reader;
mod writer;

pub use reader::{WireRead, WireReader};
pub use writer::WireWriter;
