//! A library to parse m3u8 playlists (HTTP Live Streaming) [link]
//! (https://tools.ietf.org/html/draft-pantos-http-live-streaming-19).
//!
//! The parser consumes any [`std::io::BufRead`] line by line and builds a
//! single [`Playlist`] value holding segments, variant streams and alternate
//! renditions. Structural problems (a missing `#EXTM3U` header, a failing
//! reader) abort the parse; everything else is tolerated and reported to a
//! [`DiagnosticSink`] together with the line it came from.
//!
//! # Examples
//!
//! Parsing a media playlist:
//!
//! ```
//! let input = "#EXTM3U\n\
//!     #EXT-X-VERSION:3\n\
//!     #EXT-X-TARGETDURATION:10\n\
//!     #EXTINF:9.009,\n\
//!     http://media.example.com/first.ts\n\
//!     #EXTINF:9.009,\n\
//!     http://media.example.com/second.ts\n\
//!     #EXT-X-ENDLIST\n";
//!
//! let playlist = m3u8_scan::parse_playlist(input.as_bytes()).unwrap();
//!
//! assert_eq!(playlist.version, 3);
//! assert_eq!(playlist.segments.len(), 2);
//! assert!(playlist.end_of_list);
//! assert!(!playlist.is_master());
//! ```
//!
//! Collecting the anomalies of a sloppy playlist instead of logging them:
//!
//! ```
//! use m3u8_scan::{parse_playlist_with, Diagnostic};
//!
//! let input = "#EXTM3U\n\
//!     #EXT-X-SKIP:SKIPPED-SEGMENTS=3\n\
//!     #EXTINF:6.006,\n\
//!     main.ts\n";
//!
//! let mut diagnostics: Vec<Diagnostic> = Vec::new();
//! let playlist = parse_playlist_with(input.as_bytes(), &mut diagnostics).unwrap();
//!
//! assert_eq!(playlist.segments.len(), 1);
//! assert_eq!(diagnostics[0].line, 2);
//! ```

pub mod attributes;
pub mod diagnostics;
pub mod parser;
pub mod playlist;

pub use attributes::parse_attribute_list;
pub use diagnostics::{Diagnostic, DiagnosticSink, TracingSink};
pub use parser::{classify, parse_playlist, parse_playlist_with, LineKind, ParseError};
pub use playlist::{ByteRange, Key, Map, Media, Playlist, PlaylistType, Segment, Variant};
