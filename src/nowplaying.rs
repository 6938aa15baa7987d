// streamctl - CLI for HTTP+JSON network audio streamers
// Copyright (C) 2024 The streamctl contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Human-readable summary of the `nowplaying` resource.

use crate::query;
use serde_json::Value;
use std::fmt;

pub const PLACEHOLDER: &str = "?";

/// Bit rates below this are small codes rather than bits per second.
pub const BITRATE_KBPS_THRESHOLD: i64 = 16000;

const SOURCE_PREFIX: &str = "inputs/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NowPlaying {
    pub artist: String,
    pub title: String,
    pub album: String,
    pub elapsed: String,
    pub duration: String,
    pub codec: String,
    pub sample_rate: String,
    pub bit_depth: String,
    pub bit_rate: String,
    pub source: String,
}

/// `M:SS` with unpadded minutes.
pub fn clock(ms: i64) -> String {
    let secs = ms.max(0) / 1000;
    format!("{}:{:02}", secs / 60, secs % 60)
}

pub fn bit_rate_label(rate: i64) -> String {
    if rate < BITRATE_KBPS_THRESHOLD {
        rate.to_string()
    } else {
        format!("{} kbps", (rate + 500) / 1000)
    }
}

fn source_label(doc: &Value) -> String {
    if let Some(detail) = query::get(doc, "sourceDetail").map(query::scalar)
        && !detail.is_empty()
    {
        return detail;
    }
    match query::get(doc, "source").map(query::scalar) {
        Some(raw) if !raw.is_empty() => raw
            .strip_prefix(SOURCE_PREFIX)
            .unwrap_or(&raw)
            .to_string(),
        _ => PLACEHOLDER.into(),
    }
}

impl NowPlaying {
    pub fn from_json(doc: &Value) -> Self {
        let [artist, title, album, codec, sample_rate, bit_depth]: [String; 6] = query::tuple(
            doc,
            &["artistName", "title", "albumName", "codec", "sampleRate", "bitDepth"],
            PLACEHOLDER,
        )
        .try_into()
        .unwrap_or_else(|_| std::array::from_fn(|_| PLACEHOLDER.to_string()));
        let time = |path: &str| {
            query::int(doc, path)
                .map(clock)
                .unwrap_or_else(|| PLACEHOLDER.into())
        };

        Self {
            artist,
            title,
            album,
            elapsed: time("transportPosition"),
            duration: time("duration"),
            codec,
            sample_rate,
            bit_depth,
            bit_rate: query::int(doc, "bitRate")
                .map(bit_rate_label)
                .unwrap_or_else(|| PLACEHOLDER.into()),
            source: source_label(doc),
        }
    }
}

impl fmt::Display for NowPlaying {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} - {}", self.artist, self.title)?;
        writeln!(f, "{}", self.album)?;
        writeln!(f, "{} / {}  [{}]", self.elapsed, self.duration, self.source)?;
        write!(
            f,
            "{} {} Hz {} bit {}",
            self.codec, self.sample_rate, self.bit_depth, self.bit_rate
        )
    }
}
