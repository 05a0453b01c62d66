//! The scanner that turns playlist text into a [`Playlist`].
//!
//! Lines are classified one at a time, recognized tags drive a small state
//! machine, and a URI line picks up whatever tag state is pending for it.
//! Anything tolerable (unknown tags, bad scalar values, orphan lines) goes
//! to the [`DiagnosticSink`]; only a missing `#EXTM3U` header or a failing
//! line source aborts the parse.

use std::io::BufRead;
use std::sync::Arc;

use thiserror::Error;

use crate::attributes::parse_attribute_list;
use crate::diagnostics::{DiagnosticSink, TracingSink};
use crate::playlist::*;

/// Structural failures. Everything else the parser can tolerate is routed
/// to the [`DiagnosticSink`] instead.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The first non-blank line was not `#EXTM3U`, or there were no lines
    /// at all.
    #[error("playlist must start with an #EXTM3U tag")]
    MissingHeader,
    /// The line source failed mid-read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Parse an m3u8 playlist.
///
/// Accepts any [`BufRead`], so both readers and in-memory slices work.
/// Tolerated anomalies are logged through `tracing` at warn level; use
/// [`parse_playlist_with`] to capture them instead.
///
/// # Examples
///
/// ```
/// let input = "#EXTM3U\n\
///     #EXT-X-TARGETDURATION:10\n\
///     #EXTINF:9.009,\n\
///     http://media.example.com/first.ts\n";
///
/// let playlist = m3u8_scan::parse_playlist(input.as_bytes()).unwrap();
///
/// assert_eq!(playlist.target_duration, 10);
/// assert_eq!(playlist.segments.len(), 1);
/// ```
pub fn parse_playlist(reader: impl BufRead) -> Result<Playlist, ParseError> {
    parse_playlist_with(reader, &mut TracingSink)
}

/// Parse an m3u8 playlist, reporting every tolerated anomaly to `sink`.
///
/// # Examples
///
/// ```
/// use m3u8_scan::Diagnostic;
///
/// let input = "#EXTM3U\n#EXT-X-SPLICE:1\n";
/// let mut diagnostics: Vec<Diagnostic> = Vec::new();
///
/// let playlist = m3u8_scan::parse_playlist_with(input.as_bytes(), &mut diagnostics).unwrap();
///
/// assert!(playlist.segments.is_empty());
/// assert_eq!(diagnostics[0].line, 2);
/// ```
pub fn parse_playlist_with(
    reader: impl BufRead,
    sink: &mut dyn DiagnosticSink,
) -> Result<Playlist, ParseError> {
    let mut parser = Parser::new(sink);
    for line in reader.lines() {
        parser.feed(&line?)?;
    }
    parser.finish()
}

// -----------------------------------------------------------------------------------------------
// Line classification
// -----------------------------------------------------------------------------------------------

/// One line of playlist text, categorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// The empty line.
    Blank,
    /// Starts with `#` but not with the reserved `#EXT` prefix.
    Comment,
    /// Exactly `#EXTM3U`.
    Header,
    /// A `#EXT...` tag; `value` is whatever follows the first `:`.
    Tag { name: &'a str, value: &'a str },
    /// Anything else, interpreted as a URI for the pending entity.
    Content(&'a str),
}

/// Categorize a single line. Line terminators must already be stripped.
pub fn classify(line: &str) -> LineKind<'_> {
    if line.is_empty() {
        LineKind::Blank
    } else if line == "#EXTM3U" {
        LineKind::Header
    } else if line.starts_with("#EXT") {
        match line.split_once(':') {
            Some((name, value)) => LineKind::Tag { name, value },
            None => LineKind::Tag { name: line, value: "" },
        }
    } else if line.starts_with('#') {
        LineKind::Comment
    } else {
        LineKind::Content(line)
    }
}

// -----------------------------------------------------------------------------------------------
// Tags
// -----------------------------------------------------------------------------------------------

/// Every tag the interpreter understands.
///
/// Resolution is by exact name, so `#EXT-X-MEDIA` can never swallow
/// `#EXT-X-MEDIA-SEQUENCE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagKind {
    Inf,
    Version,
    PlaylistType,
    MediaSequence,
    TargetDuration,
    EndList,
    ByteRange,
    Key,
    Map,
    Media,
    StreamInf,
}

impl TagKind {
    fn from_name(name: &str) -> Option<TagKind> {
        match name {
            "#EXTINF" => Some(TagKind::Inf),
            "#EXT-X-VERSION" => Some(TagKind::Version),
            "#EXT-X-PLAYLIST-TYPE" => Some(TagKind::PlaylistType),
            "#EXT-X-MEDIA-SEQUENCE" => Some(TagKind::MediaSequence),
            "#EXT-X-TARGETDURATION" => Some(TagKind::TargetDuration),
            "#EXT-X-ENDLIST" => Some(TagKind::EndList),
            "#EXT-X-BYTERANGE" => Some(TagKind::ByteRange),
            "#EXT-X-KEY" => Some(TagKind::Key),
            "#EXT-X-MAP" => Some(TagKind::Map),
            "#EXT-X-MEDIA" => Some(TagKind::Media),
            "#EXT-X-STREAM-INF" => Some(TagKind::StreamInf),
            _ => None,
        }
    }
}

// -----------------------------------------------------------------------------------------------
// Tag interpreter
// -----------------------------------------------------------------------------------------------

/// The state machine fed one classified line at a time.
struct Parser<'a> {
    playlist: Playlist,
    line_number: usize,
    seen_header: bool,
    // One-shot state, consumed by the next URI line.
    pending_duration: f64,
    pending_title: String,
    pending_byte_range: Option<ByteRange>,
    pending_variant: Option<Variant>,
    awaiting_segment_uri: bool,
    // Persistent state, replaced only by the next tag of the same kind.
    current_key: Option<Arc<Key>>,
    current_map: Option<Arc<Map>>,
    sink: &'a mut dyn DiagnosticSink,
}

impl<'a> Parser<'a> {
    fn new(sink: &mut dyn DiagnosticSink) -> Parser<'_> {
        Parser {
            playlist: Playlist::default(),
            line_number: 0,
            seen_header: false,
            pending_duration: 0.0,
            pending_title: String::new(),
            pending_byte_range: None,
            pending_variant: None,
            awaiting_segment_uri: false,
            current_key: None,
            current_map: None,
            sink,
        }
    }

    /// Advance the state machine by one line.
    fn feed(&mut self, line: &str) -> Result<(), ParseError> {
        self.line_number += 1;
        match classify(line) {
            LineKind::Blank => {}
            LineKind::Header => self.seen_header = true,
            _ if !self.seen_header => return Err(ParseError::MissingHeader),
            LineKind::Comment => {}
            LineKind::Tag { name, value } => self.handle_tag(name, value),
            LineKind::Content(uri) => self.handle_content(uri),
        }
        Ok(())
    }

    fn finish(self) -> Result<Playlist, ParseError> {
        if self.seen_header {
            Ok(self.playlist)
        } else {
            Err(ParseError::MissingHeader)
        }
    }

    fn handle_tag(&mut self, name: &str, value: &str) {
        let Some(kind) = TagKind::from_name(name) else {
            self.warn(&format!("unrecognized tag {}", name));
            return;
        };

        match kind {
            TagKind::Version => {
                if let Some(n) = self.counter_value(name, value) {
                    self.playlist.version = n;
                }
            }
            TagKind::MediaSequence => {
                if let Some(n) = self.counter_value(name, value) {
                    self.playlist.media_sequence = n;
                }
            }
            TagKind::TargetDuration => {
                if let Some(n) = self.counter_value(name, value) {
                    self.playlist.target_duration = n;
                }
            }
            TagKind::PlaylistType => match value.parse() {
                Ok(list_type) => self.playlist.list_type = Some(list_type),
                Err(message) => self.warn(&message),
            },
            TagKind::EndList => self.playlist.end_of_list = true,
            TagKind::ByteRange => self.pending_byte_range = Some(ByteRange::parse(value)),
            TagKind::Key => {
                self.current_key = Some(Arc::new(Key::from_hashmap(parse_attribute_list(value))));
            }
            TagKind::Map => {
                self.current_map = Some(Arc::new(Map::from_hashmap(parse_attribute_list(value))));
            }
            TagKind::Media => {
                // Self-contained, no URI line follows.
                self.playlist
                    .media
                    .push(Media::from_hashmap(parse_attribute_list(value)));
            }
            TagKind::StreamInf => {
                self.pending_variant = Some(Variant::from_hashmap(parse_attribute_list(value)));
            }
            TagKind::Inf => {
                let (duration, title) = match value.split_once(',') {
                    Some((duration, title)) => (duration, title),
                    None => (value, ""),
                };
                match duration.parse() {
                    Ok(duration) => {
                        self.pending_duration = duration;
                        self.pending_title = title.to_string();
                    }
                    Err(_) => {
                        self.pending_duration = 0.0;
                        self.pending_title.clear();
                        self.warn(&format!("#EXTINF expects a duration, got {:?}", duration));
                    }
                }
                self.awaiting_segment_uri = true;
            }
        }
    }

    fn handle_content(&mut self, uri: &str) {
        if self.awaiting_segment_uri {
            self.playlist.segments.push(Segment {
                url: uri.to_string(),
                duration: self.pending_duration,
                title: std::mem::take(&mut self.pending_title),
                byte_range: self.pending_byte_range.take(),
                key: self.current_key.clone(),
                map: self.current_map.clone(),
            });
            self.pending_duration = 0.0;
            self.awaiting_segment_uri = false;
        } else if let Some(mut variant) = self.pending_variant.take() {
            variant.url = uri.to_string();
            self.playlist.variants.push(variant);
        } else {
            self.warn("unexpected line, not preceded by #EXTINF or #EXT-X-STREAM-INF");
        }
    }

    fn counter_value(&mut self, name: &str, value: &str) -> Option<u64> {
        match value.parse() {
            Ok(n) => Some(n),
            Err(_) => {
                self.warn(&format!("{} expects an integer, got {:?}", name, value));
                None
            }
        }
    }

    fn warn(&mut self, message: &str) {
        self.sink.report(self.line_number, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostic;
    use std::io;

    fn parse(input: &str) -> Playlist {
        parse_playlist(input.as_bytes()).unwrap()
    }

    fn parse_collecting(input: &str) -> (Playlist, Vec<Diagnostic>) {
        let mut diagnostics = Vec::new();
        let playlist = parse_playlist_with(input.as_bytes(), &mut diagnostics).unwrap();
        (playlist, diagnostics)
    }

    // -----------------------------------------------------------------------------------------------
    // Line classification

    #[test]
    fn classify_blank() {
        assert_eq!(classify(""), LineKind::Blank);
    }

    #[test]
    fn classify_header() {
        assert_eq!(classify("#EXTM3U"), LineKind::Header);
    }

    #[test]
    fn classify_comment() {
        assert_eq!(classify("# generated by packager v1.2"), LineKind::Comment);
    }

    #[test]
    fn classify_tag_with_value() {
        assert_eq!(
            classify("#EXT-X-VERSION:3"),
            LineKind::Tag { name: "#EXT-X-VERSION", value: "3" }
        );
    }

    #[test]
    fn classify_tag_without_value() {
        assert_eq!(
            classify("#EXT-X-ENDLIST"),
            LineKind::Tag { name: "#EXT-X-ENDLIST", value: "" }
        );
    }

    #[test]
    fn classify_uri_line() {
        assert_eq!(
            classify("http://media.example.com/first.ts"),
            LineKind::Content("http://media.example.com/first.ts")
        );
    }

    #[test]
    fn classify_whitespace_only_line() {
        // Only the empty line is blank; this one is content.
        assert_eq!(classify("   "), LineKind::Content("   "));
    }

    // -----------------------------------------------------------------------------------------------
    // Header handling

    #[test]
    fn missing_header_on_empty_input() {
        assert!(matches!(
            parse_playlist("".as_bytes()),
            Err(ParseError::MissingHeader)
        ));
    }

    #[test]
    fn missing_header_on_blank_input() {
        assert!(matches!(
            parse_playlist("\n\n".as_bytes()),
            Err(ParseError::MissingHeader)
        ));
    }

    #[test]
    fn missing_header_when_tag_comes_first() {
        assert!(matches!(
            parse_playlist("#EXT-X-VERSION:3\n#EXTM3U\n".as_bytes()),
            Err(ParseError::MissingHeader)
        ));
    }

    #[test]
    fn comment_before_header_is_fatal() {
        assert!(matches!(
            parse_playlist("# hello\n#EXTM3U\n".as_bytes()),
            Err(ParseError::MissingHeader)
        ));
    }

    #[test]
    fn blank_lines_before_header_are_fine() {
        let playlist = parse("\n\n#EXTM3U\n#EXT-X-ENDLIST\n");
        assert!(playlist.end_of_list);
    }

    #[test]
    fn repeated_header_is_ignored() {
        let (playlist, diagnostics) = parse_collecting("#EXTM3U\n#EXT-X-VERSION:3\n#EXTM3U\n");
        assert_eq!(playlist.version, 3);
        assert!(diagnostics.is_empty());
    }

    // -----------------------------------------------------------------------------------------------
    // Scalar tags

    #[test]
    fn version_last_write_wins() {
        let playlist = parse("#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-VERSION:4\n");
        assert_eq!(playlist.version, 4);
    }

    #[test]
    fn bad_version_reported_and_field_kept() {
        let (playlist, diagnostics) = parse_collecting("#EXTM3U\n#EXT-X-VERSION:three\n");
        assert_eq!(playlist.version, 0);
        assert_eq!(
            diagnostics,
            vec![Diagnostic {
                line: 2,
                message: "#EXT-X-VERSION expects an integer, got \"three\"".to_string(),
            }]
        );
    }

    #[test]
    fn media_sequence_not_swallowed_by_media() {
        let playlist = parse("#EXTM3U\n#EXT-X-MEDIA-SEQUENCE:7794\n");
        assert_eq!(playlist.media_sequence, 7794);
        assert!(playlist.media.is_empty());
    }

    #[test]
    fn target_duration_is_set() {
        let playlist = parse("#EXTM3U\n#EXT-X-TARGETDURATION:10\n");
        assert_eq!(playlist.target_duration, 10);
    }

    #[test]
    fn playlist_type_event_and_vod() {
        let event = parse("#EXTM3U\n#EXT-X-PLAYLIST-TYPE:EVENT\n");
        assert_eq!(event.list_type, Some(PlaylistType::Event));

        let vod = parse("#EXTM3U\n#EXT-X-PLAYLIST-TYPE:VOD\n");
        assert_eq!(vod.list_type, Some(PlaylistType::Vod));
    }

    #[test]
    fn playlist_type_unknown_reported() {
        let (playlist, diagnostics) = parse_collecting("#EXTM3U\n#EXT-X-PLAYLIST-TYPE:LIVE\n");
        assert_eq!(playlist.list_type, None);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].line, 2);
    }

    // -----------------------------------------------------------------------------------------------
    // Segments

    #[test]
    fn extinf_with_title() {
        let playlist = parse("#EXTM3U\n#EXTINF:9.009,Opening\nfirst.ts\n");
        assert_eq!(playlist.segments[0].duration, 9.009);
        assert_eq!(playlist.segments[0].title, "Opening");
        assert_eq!(playlist.segments[0].url, "first.ts");
    }

    #[test]
    fn extinf_without_title() {
        let playlist = parse("#EXTM3U\n#EXTINF:9.009,\nfirst.ts\n#EXTINF:4\nsecond.ts\n");
        assert_eq!(playlist.segments[0].title, "");
        assert_eq!(playlist.segments[1].duration, 4.0);
        assert_eq!(playlist.segments[1].title, "");
    }

    #[test]
    fn extinf_title_keeps_commas() {
        let playlist = parse("#EXTM3U\n#EXTINF:4.5,one,two\nfirst.ts\n");
        assert_eq!(playlist.segments[0].title, "one,two");
    }

    #[test]
    fn extinf_bad_duration_reported() {
        let (playlist, diagnostics) = parse_collecting("#EXTM3U\n#EXTINF:abc,Title\nfirst.ts\n");
        assert_eq!(playlist.segments.len(), 1);
        assert_eq!(playlist.segments[0].duration, 0.0);
        assert_eq!(playlist.segments[0].title, "");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].line, 2);
    }

    #[test]
    fn byterange_applies_to_next_segment_only() {
        let playlist = parse(
            "#EXTM3U\n\
             #EXT-X-BYTERANGE:1234@5678\n\
             #EXTINF:1,\n\
             a.ts\n\
             #EXTINF:1,\n\
             b.ts\n",
        );
        assert_eq!(
            playlist.segments[0].byte_range,
            Some(ByteRange { length: 1234, offset: 5678 })
        );
        assert_eq!(playlist.segments[1].byte_range, None);
    }

    #[test]
    fn key_applies_until_superseded() {
        let playlist = parse(
            "#EXTM3U\n\
             #EXTINF:1,\n\
             a.ts\n\
             #EXT-X-KEY:METHOD=AES-128,URI=\"k1\"\n\
             #EXTINF:1,\n\
             b.ts\n\
             #EXTINF:1,\n\
             c.ts\n\
             #EXT-X-KEY:METHOD=AES-128,URI=\"k2\"\n\
             #EXTINF:1,\n\
             d.ts\n",
        );
        let segments = &playlist.segments;

        assert_eq!(segments[0].key, None);
        assert!(Arc::ptr_eq(
            segments[1].key.as_ref().unwrap(),
            segments[2].key.as_ref().unwrap()
        ));
        assert_eq!(segments[1].key.as_ref().unwrap().url.as_deref(), Some("k1"));
        assert_eq!(segments[3].key.as_ref().unwrap().url.as_deref(), Some("k2"));
        assert!(!Arc::ptr_eq(
            segments[2].key.as_ref().unwrap(),
            segments[3].key.as_ref().unwrap()
        ));
    }

    #[test]
    fn map_shared_across_segments() {
        let playlist = parse(
            "#EXTM3U\n\
             #EXT-X-MAP:URI=\"init.mp4\",BYTERANGE=\"720@0\"\n\
             #EXTINF:1,\n\
             a.mp4\n\
             #EXTINF:1,\n\
             b.mp4\n",
        );
        let segments = &playlist.segments;

        assert!(Arc::ptr_eq(
            segments[0].map.as_ref().unwrap(),
            segments[1].map.as_ref().unwrap()
        ));
        assert_eq!(segments[0].map.as_ref().unwrap().url, "init.mp4");
        assert_eq!(
            segments[0].map.as_ref().unwrap().byte_range,
            Some(ByteRange { length: 720, offset: 0 })
        );
    }

    #[test]
    fn orphan_line_reported() {
        let (playlist, diagnostics) = parse_collecting("#EXTM3U\nstray.ts\n");
        assert!(playlist.segments.is_empty());
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].line, 2);
    }

    #[test]
    fn whitespace_only_line_is_an_orphan() {
        let (playlist, diagnostics) = parse_collecting("#EXTM3U\n   \n#EXTINF:1,\na.ts\n");
        assert_eq!(playlist.segments.len(), 1);
        assert_eq!(playlist.segments[0].url, "a.ts");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].line, 2);
    }

    #[test]
    fn unrecognized_tag_reported_with_line() {
        let (playlist, diagnostics) = parse_collecting(
            "#EXTM3U\n#EXT-X-DISCONTINUITY\n#EXTINF:1,\na.ts\n",
        );
        assert_eq!(playlist.segments.len(), 1);
        assert_eq!(
            diagnostics,
            vec![Diagnostic {
                line: 2,
                message: "unrecognized tag #EXT-X-DISCONTINUITY".to_string(),
            }]
        );
    }

    // -----------------------------------------------------------------------------------------------
    // Master playlists

    #[test]
    fn stream_inf_attaches_next_line() {
        let playlist = parse(
            "#EXTM3U\n\
             #EXT-X-STREAM-INF:BANDWIDTH=300000,CODECS=\"mp4a.40.2,avc1.4d401e\"\n\
             low.m3u8\n",
        );
        assert!(playlist.is_master());
        assert_eq!(playlist.variants[0].bandwidth, 300000);
        assert_eq!(playlist.variants[0].codecs, "mp4a.40.2,avc1.4d401e");
        assert_eq!(playlist.variants[0].url, "low.m3u8");
    }

    #[test]
    fn variant_attributes_default_to_zero() {
        let playlist = parse("#EXTM3U\n#EXT-X-STREAM-INF:CODECS=\"mp4a.40.5\"\naudio.m3u8\n");
        assert_eq!(playlist.variants[0].bandwidth, 0);
        assert_eq!(playlist.variants[0].average_bandwidth, 0);
        assert_eq!(playlist.variants[0].frame_rate, 0.0);
    }

    #[test]
    fn media_tag_appends_immediately() {
        let playlist = parse(
            "#EXTM3U\n\
             #EXT-X-MEDIA:TYPE=AUDIO,GROUP-ID=\"aac\",NAME=\"English\",DEFAULT=YES,AUTOSELECT=YES,LANGUAGE=\"en\",URI=\"eng.m3u8\"\n",
        );
        let media = &playlist.media[0];

        assert_eq!(media.kind, "AUDIO");
        assert_eq!(media.group_id, "aac");
        assert_eq!(media.name, "English");
        assert_eq!(media.language, "en");
        assert_eq!(media.url.as_deref(), Some("eng.m3u8"));
        assert!(media.is_default);
        assert!(media.auto_select);
        assert!(!media.is_forced);
    }

    // -----------------------------------------------------------------------------------------------
    // Input handling

    #[test]
    fn crlf_line_endings() {
        let playlist = parse("#EXTM3U\r\n#EXTINF:3.003,\r\nthird.ts\r\n");
        assert_eq!(playlist.segments[0].duration, 3.003);
        assert_eq!(playlist.segments[0].url, "third.ts");
    }

    #[test]
    fn input_without_trailing_newline() {
        let playlist = parse("#EXTM3U\n#EXTINF:4,\nlast.ts");
        assert_eq!(playlist.segments[0].url, "last.ts");
    }

    struct FailingReader;

    impl io::Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "source died"))
        }
    }

    impl io::BufRead for FailingReader {
        fn fill_buf(&mut self) -> io::Result<&[u8]> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "source died"))
        }

        fn consume(&mut self, _amt: usize) {}
    }

    #[test]
    fn read_failure_is_structural() {
        assert!(matches!(
            parse_playlist(FailingReader),
            Err(ParseError::Io(_))
        ));
    }

    // -----------------------------------------------------------------------------------------------
    // Byte ranges

    #[test]
    fn byte_range_with_offset() {
        assert_eq!(
            ByteRange::parse("1234@5678"),
            ByteRange { length: 1234, offset: 5678 }
        );
    }

    #[test]
    fn byte_range_without_offset() {
        assert_eq!(ByteRange::parse("1234"), ByteRange { length: 1234, offset: 0 });
    }

    #[test]
    fn byte_range_empty() {
        assert_eq!(ByteRange::parse(""), ByteRange { length: 0, offset: 0 });
    }
}
