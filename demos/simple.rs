//! Parses a playlist file and prints its summary, followed by any anomalies
//! the parser tolerated along the way.
//!
//! ```sh
//! cargo run --example simple -- sample-playlists/media-with-unknown-tags.m3u8
//! ```

use std::env;
use std::fs::File;
use std::io::BufReader;

use m3u8_scan::{parse_playlist_with, Diagnostic};

fn main() {
    let path = env::args()
        .nth(1)
        .unwrap_or_else(|| "sample-playlists/mediaplaylist.m3u8".to_string());

    let file = File::open(&path).expect("can't open playlist");
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    match parse_playlist_with(BufReader::new(file), &mut diagnostics) {
        Ok(playlist) => print!("{}", playlist),
        Err(e) => eprintln!("{}: {}", path, e),
    }
    for diagnostic in &diagnostics {
        eprintln!("{}", diagnostic);
    }
}
