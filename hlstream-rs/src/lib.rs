//! # hlstream-rs
//! A library for parsing HLS media playlists
//!
//! # Example
//! ```rust
//! use hlstream_rs::Parser;
//! use std::io::Cursor;
//! use url::Url;
//!
//! let base = Url::parse("http://example.com/stream/index.m3u8").unwrap();
//! let mut parser = Parser::new(
//!     Cursor::new("#EXTM3U\n#EXT-X-TARGETDURATION:6\n#EXTINF:6,\nsegment0.ts"),
//!     base,
//! );
//! parser.parse().unwrap();
//! let playlist = parser.get_result();
//! // Do your works with playlist...
//! assert_eq!(playlist.segments.len(), 1);
//! ```

pub mod format;
mod parser;
pub use parser::*;
