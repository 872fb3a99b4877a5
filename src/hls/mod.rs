//! HLS playlist rewriting engine.
//!
//! Parse a playlist, resolve and rewrite every URI so it routes back through
//! the proxy, then serialize it again. Everything here is synchronous and
//! does no I/O.

pub mod parser;
pub mod playlist;
pub mod resolve;
pub mod rewrite;
pub mod writer;

pub use parser::parse;
pub use playlist::{AttributeList, PlaylistDocument, PlaylistKind, Rendition, Segment, Variant};
pub use rewrite::{ProxyEndpoints, rewrite};
pub use writer::{PlaylistError, write};
