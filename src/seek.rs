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

use crate::argument::{self, Token};
use crate::client::{Transport, fetch_json};
use crate::error::CtlError;
use crate::query;
use reqwest::Method;
use tracing::debug;

pub const MAX_SEEK_SECONDS: i64 = 3600;
pub const NOW_PLAYING: &str = "nowplaying";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekArg {
    Absolute(i64),
    Forward(i64),
    Rewind(i64),
}

pub fn parse(option: &str, raw: Option<&str>) -> Result<SeekArg, CtlError> {
    let arg = raw.unwrap_or_default();
    let out_of_range =
        || CtlError::invalid_argument(option, arg, format!("at most {MAX_SEEK_SECONDS} seconds"));

    match argument::classify(raw, 4) {
        Token::Empty => Err(CtlError::MissingArgument(option.to_string())),
        Token::Digit(n) if n <= MAX_SEEK_SECONDS => Ok(SeekArg::Absolute(n)),
        Token::Signed { negative: true, n } if n <= MAX_SEEK_SECONDS => Ok(SeekArg::Rewind(n)),
        Token::Signed { negative: false, n } if n <= MAX_SEEK_SECONDS => Ok(SeekArg::Forward(n)),
        Token::Digit(_) | Token::Signed { .. } => Err(out_of_range()),
        Token::QueryMarker | Token::Invalid => Err(CtlError::invalid_argument(
            option,
            arg,
            "expected seconds as N, +N or -N",
        )),
    }
}

pub fn ms_to_secs(ms: i64) -> i64 {
    (ms + 500).div_euclid(1000)
}

/// Target position in seconds, or `None` when there is no live track.
///
/// `-N` resolves to `N - position`, not `position - N`.
pub fn target(arg: SeekArg, position: i64, duration: i64) -> Option<i64> {
    if duration <= 0 {
        return None;
    }
    let raw = match arg {
        SeekArg::Absolute(n) => n,
        SeekArg::Forward(n) => position + n,
        SeekArg::Rewind(n) => n - position,
    };
    Some(raw.clamp(0, duration - 1))
}

/// Read the current position, compute the target and issue the seek.
/// Returns the new position in seconds, `None` if nothing was playing.
pub fn seek(
    transport: &dyn Transport,
    option: &str,
    raw: Option<&str>,
) -> Result<Option<i64>, CtlError> {
    let arg = parse(option, raw)?;
    let doc = fetch_json(transport, NOW_PLAYING)?;
    let position = ms_to_secs(query::int(&doc, "transportPosition").unwrap_or(0));
    let duration = ms_to_secs(query::int(&doc, "duration").unwrap_or(0));

    let Some(secs) = target(arg, position, duration) else {
        debug!("no live track, seek skipped");
        return Ok(None);
    };
    debug!(?arg, position, duration, secs, "seeking");

    let path = format!("{NOW_PLAYING}?cmd=seek&position={}", secs * 1000);
    transport.request(Method::GET, &path)?;
    Ok(Some(secs))
}
