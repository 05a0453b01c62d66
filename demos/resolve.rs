//! Joins every URI in a playlist against a base URL, the way a client
//! fetching the playlist over HTTP would.
//!
//! ```sh
//! cargo run --example resolve -- sample-playlists/master.m3u8 http://example.com/stream/index.m3u8
//! ```

use std::env;
use std::fs::File;
use std::io::BufReader;

use tracing_subscriber::EnvFilter;
use url::Url;

use m3u8_scan::parse_playlist;

fn resolve(base: &Url, reference: &str) -> String {
    match base.join(reference) {
        Ok(url) => url.to_string(),
        // Leave references the base can't absorb untouched.
        Err(_) => reference.to_string(),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let mut args = env::args().skip(1);
    let path = args
        .next()
        .unwrap_or_else(|| "sample-playlists/master.m3u8".to_string());
    let base = args
        .next()
        .unwrap_or_else(|| "http://example.com/stream/index.m3u8".to_string());
    let base = Url::parse(&base).expect("base must be an absolute URL");

    let file = File::open(&path).expect("can't open playlist");
    let playlist = match parse_playlist(BufReader::new(file)) {
        Ok(playlist) => playlist,
        Err(e) => {
            eprintln!("{}: {}", path, e);
            return;
        }
    };

    if playlist.is_master() {
        for variant in &playlist.variants {
            println!("{:>9} bps  {}", variant.bandwidth, resolve(&base, &variant.url));
        }
    } else {
        for segment in &playlist.segments {
            println!("{:>8.3}s  {}", segment.duration, resolve(&base, &segment.url));
        }
    }
}
