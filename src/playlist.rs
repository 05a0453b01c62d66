//! The structs that make up a parsed playlist.
//!
//! The main type here is [`Playlist`]. One parse pass fills it and nothing
//! mutates it afterwards.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// A [Playlist](https://tools.ietf.org/html/draft-pantos-http-live-streaming-19#section-4.1).
///
/// A Playlist is a Media Playlist if all URI lines in the Playlist
/// identify Media Segments. A Playlist is a Master Playlist if all URI
/// lines in the Playlist identify Media Playlists. The parser does not
/// enforce that exclusivity; [`Playlist::is_master`] lets callers tell the
/// two apart.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Playlist {
    /// `#EXT-X-VERSION:<n>`
    pub version: u64,
    /// `#EXT-X-TARGETDURATION:<s>`
    pub target_duration: u64,
    /// `#EXT-X-MEDIA-SEQUENCE:<number>`
    pub media_sequence: u64,
    /// `#EXT-X-PLAYLIST-TYPE:<EVENT|VOD>`
    pub list_type: Option<PlaylistType>,
    /// `#EXT-X-ENDLIST`
    pub end_of_list: bool,
    pub segments: Vec<Segment>,
    pub variants: Vec<Variant>,
    pub media: Vec<Media>,
}

impl Playlist {
    /// True when the playlist declares variant streams, i.e. its URI lines
    /// point at further playlists rather than at media segments.
    pub fn is_master(&self) -> bool {
        !self.variants.is_empty()
    }
}

/// [`#EXT-X-PLAYLIST-TYPE:<EVENT|VOD>`]
/// (https://tools.ietf.org/html/draft-pantos-http-live-streaming-19#section-4.3.3.5)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaylistType {
    Event,
    Vod,
}

impl FromStr for PlaylistType {
    type Err = String;

    fn from_str(s: &str) -> Result<PlaylistType, String> {
        match s {
            "EVENT" => Ok(PlaylistType::Event),
            "VOD" => Ok(PlaylistType::Vod),
            _ => Err(format!("unknown playlist type {:?}", s)),
        }
    }
}

// -----------------------------------------------------------------------------------------------
// Media Segment
// -----------------------------------------------------------------------------------------------

/// A [Media Segment](https://tools.ietf.org/html/draft-pantos-http-live-streaming-19#section-3)
/// is specified by a URI and optionally a byte range.
///
/// The key and map are shared: every segment between one `#EXT-X-KEY` (or
/// `#EXT-X-MAP`) tag and the next points at the same allocation, which is
/// what lets a player fetch the key material once per rotation.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Segment {
    pub url: String,
    /// `#EXTINF:<duration>,[<title>]`
    pub duration: f64,
    /// `#EXTINF:<duration>,[<title>]`, empty when the title is absent.
    pub title: String,
    /// `#EXT-X-BYTERANGE:<n>[@<o>]`
    pub byte_range: Option<ByteRange>,
    /// `#EXT-X-KEY:<attribute-list>`
    pub key: Option<Arc<Key>>,
    /// `#EXT-X-MAP:<attribute-list>`
    pub map: Option<Arc<Map>>,
}

/// [`#EXT-X-KEY:<attribute-list>`]
/// (https://tools.ietf.org/html/draft-pantos-http-live-streaming-19#section-4.3.2.4)
///
/// Media Segments MAY be encrypted. The EXT-X-KEY tag specifies how to
/// decrypt them. It applies to every Media Segment that appears between
/// it and the next EXT-X-KEY tag in the Playlist file (or the end of the
/// Playlist file).
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Key {
    pub method: String,
    pub url: Option<String>,
    pub iv: Option<String>,
}

impl Key {
    pub fn from_hashmap(mut attrs: HashMap<String, String>) -> Key {
        Key {
            method: attrs.remove("METHOD").unwrap_or_default(),
            url: attrs.remove("URI"),
            iv: attrs.remove("IV"),
        }
    }
}

/// [`#EXT-X-MAP:<attribute-list>`]
/// (https://tools.ietf.org/html/draft-pantos-http-live-streaming-19#section-4.3.2.5)
///
/// The EXT-X-MAP tag specifies how to obtain the Media Initialization
/// Section required to parse the applicable Media Segments. It applies to
/// every Media Segment that appears after it in the Playlist until the next
/// EXT-X-MAP tag or until the end of the playlist.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Map {
    pub url: String,
    pub byte_range: Option<ByteRange>,
}

impl Map {
    pub fn from_hashmap(mut attrs: HashMap<String, String>) -> Map {
        Map {
            url: attrs.remove("URI").unwrap_or_default(),
            byte_range: attrs.remove("BYTERANGE").map(|r| ByteRange::parse(&r)),
        }
    }
}

/// [`#EXT-X-BYTERANGE:<n>[@<o>]`]
/// (https://tools.ietf.org/html/draft-pantos-http-live-streaming-19#section-4.3.2.2)
///
/// The EXT-X-BYTERANGE tag indicates that a Media Segment is a sub-range
/// of the resource identified by its URI. It applies only to the next
/// URI line that follows it in the Playlist.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub length: u64,
    pub offset: u64,
}

impl ByteRange {
    /// Reads the `<n>[@<o>]` form used by the tag and by the BYTERANGE
    /// attribute of `#EXT-X-MAP`. Missing or non-numeric parts come out
    /// as zero.
    pub fn parse(value: &str) -> ByteRange {
        let mut parts = value.split('@');
        ByteRange {
            length: parts.next().and_then(|n| n.parse().ok()).unwrap_or_default(),
            offset: parts.next().and_then(|n| n.parse().ok()).unwrap_or_default(),
        }
    }
}

// -----------------------------------------------------------------------------------------------
// Master Playlist entries
// -----------------------------------------------------------------------------------------------

/// [`#EXT-X-STREAM-INF:<attribute-list>`]
/// (https://tools.ietf.org/html/draft-pantos-http-live-streaming-19#section-4.3.4.2)
///
/// A Variant Stream includes a Media Playlist that specifies media
/// encoded at a particular bit rate, in a particular format, and at a
/// particular resolution for media containing video.
///
/// Clients should switch between different Variant Streams to adapt to
/// network conditions. The AUDIO/VIDEO/SUBTITLES/CLOSED-CAPTIONS values
/// are group IDs referencing [`Media`] entries.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Variant {
    pub url: String,

    // <attribute-list>
    pub bandwidth: u64,
    pub average_bandwidth: u64,
    pub codecs: String,
    pub resolution: String,
    pub frame_rate: f64,
    pub audio: String,
    pub video: String,
    pub subtitles: String,
    pub closed_captions: String,
}

impl Variant {
    pub fn from_hashmap(mut attrs: HashMap<String, String>) -> Variant {
        Variant {
            url: String::new(),
            bandwidth: numeric(attrs.remove("BANDWIDTH")),
            average_bandwidth: numeric(attrs.remove("AVERAGE-BANDWIDTH")),
            codecs: attrs.remove("CODECS").unwrap_or_default(),
            resolution: attrs.remove("RESOLUTION").unwrap_or_default(),
            frame_rate: attrs
                .remove("FRAME-RATE")
                .and_then(|r| r.parse().ok())
                .unwrap_or_default(),
            audio: attrs.remove("AUDIO").unwrap_or_default(),
            video: attrs.remove("VIDEO").unwrap_or_default(),
            subtitles: attrs.remove("SUBTITLES").unwrap_or_default(),
            closed_captions: attrs.remove("CLOSED-CAPTIONS").unwrap_or_default(),
        }
    }
}

/// [`#EXT-X-MEDIA:<attribute-list>`]
/// (https://tools.ietf.org/html/draft-pantos-http-live-streaming-19#section-4.3.4.1)
///
/// The EXT-X-MEDIA tag is used to relate Media Playlists that contain
/// alternative Renditions of the same content. For example, three
/// EXT-X-MEDIA tags can be used to identify audio-only Media Playlists
/// that contain English, French and Spanish Renditions of the same
/// presentation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Media {
    // <attribute-list>
    pub kind: String,
    pub url: Option<String>,
    pub group_id: String,
    pub language: String,
    pub name: String, // All EXT-X-MEDIA tags in the same Group MUST have different NAME attributes.
    pub is_default: bool,
    pub auto_select: bool,
    pub is_forced: bool,
}

impl Media {
    pub fn from_hashmap(mut attrs: HashMap<String, String>) -> Media {
        Media {
            kind: attrs.remove("TYPE").unwrap_or_default(),
            url: attrs.remove("URI"),
            group_id: attrs.remove("GROUP-ID").unwrap_or_default(),
            language: attrs.remove("LANGUAGE").unwrap_or_default(),
            name: attrs.remove("NAME").unwrap_or_default(),
            is_default: yes_flag(attrs.remove("DEFAULT")),
            auto_select: yes_flag(attrs.remove("AUTOSELECT")),
            is_forced: yes_flag(attrs.remove("FORCED")),
        }
    }
}

fn numeric(value: Option<String>) -> u64 {
    value.and_then(|n| n.parse().ok()).unwrap_or_default()
}

// Absence of the attribute indicates an implicit value of NO.
fn yes_flag(value: Option<String>) -> bool {
    value.as_deref() == Some("YES")
}

// -----------------------------------------------------------------------------------------------
// Display
// -----------------------------------------------------------------------------------------------

impl fmt::Display for Playlist {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_master() {
            writeln!(
                f,
                "[Master Playlist, version: {} | {} streams]",
                self.version,
                self.variants.len()
            )?;
            for (i, variant) in self.variants.iter().enumerate() {
                write!(f, " {} -> {}", i + 1, variant)?;
            }
            for media in &self.media {
                write!(f, "{}", media)?;
            }
        } else {
            write!(
                f,
                "[Media Playlist | duration: {:?} ~ seq: {:?} ~ type: {:?} ~ segments: {}",
                self.target_duration,
                self.media_sequence,
                self.list_type,
                self.segments.len()
            )?;
            if self.end_of_list {
                write!(f, " [endlist]")?;
            }
            writeln!(f, "]")?;
            for (i, segment) in self.segments.iter().enumerate() {
                write!(f, " {} -> {}", i + 1, segment)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[Segment |")?;

        if !self.title.is_empty() {
            write!(f, " title: {:?} ~", self.title)?;
        }
        write!(f, " duration: {:?}", self.duration)?;

        if let Some(range) = &self.byte_range {
            write!(f, " ~ byterange: {}@{}", range.length, range.offset)?;
        }
        if let Some(key) = &self.key {
            write!(f, " ~ key: {}", key.method)?;
        }
        if self.map.is_some() {
            write!(f, " [map]")?;
        }

        writeln!(f, " ~ uri: {:?}]", self.url)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[Variant | uri: {:?} ~ bandwidth: {}", self.url, self.bandwidth)?;

        if !self.resolution.is_empty() {
            write!(f, " ~ res: {}", self.resolution)?;
        }
        if self.frame_rate > 0.0 {
            write!(f, " ~ fps: {}", self.frame_rate)?;
        }
        if !self.codecs.is_empty() {
            write!(f, " ~ codecs: {:?}", self.codecs)?;
        }
        if !self.audio.is_empty() {
            write!(f, " ~ audio: {}", self.audio)?;
        }
        if !self.video.is_empty() {
            write!(f, " ~ video: {}", self.video)?;
        }
        if !self.subtitles.is_empty() {
            write!(f, " ~ subs: {}", self.subtitles)?;
        }
        if !self.closed_captions.is_empty() {
            write!(f, " ~ closed_captions: {}", self.closed_captions)?;
        }

        writeln!(f, "]")
    }
}

impl fmt::Display for Media {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "[Media | type: {} ~ group: {} ~ name: {:?}",
            self.kind, self.group_id, self.name
        )?;

        if let Some(url) = &self.url {
            write!(f, " ~ uri: {:?}", url)?;
        }
        if !self.language.is_empty() {
            write!(f, " ~ lang: {}", self.language)?;
        }

        write!(f, " ~ default: {}", self.is_default)?;
        write!(f, " ~ autoselect: {}", self.auto_select)?;
        write!(f, " ~ forced: {}", self.is_forced)?;

        writeln!(f, "]")
    }
}
