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

//! Shape of the single argument token that follows a command.

/// Tokens that ask for the current value without changing it.
pub const QUERY_MARKERS: &[&str] = &["?", "-"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Empty,
    QueryMarker,
    Digit(i64),
    /// `+n` or `-n`; the sign is kept apart so `-0` stays a rewind.
    Signed { negative: bool, n: i64 },
    Invalid,
}

fn digits(s: &str, max_digits: usize) -> Option<i64> {
    if s.is_empty() || s.len() > max_digits || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Classify `raw` allowing at most `max_digits` digits for numbers.
pub fn classify(raw: Option<&str>, max_digits: usize) -> Token {
    let Some(raw) = raw else {
        return Token::Empty;
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Token::Empty;
    }
    if QUERY_MARKERS.contains(&raw) {
        return Token::QueryMarker;
    }
    if let Some(n) = digits(raw, max_digits) {
        return Token::Digit(n);
    }
    let (negative, rest) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => match raw.strip_prefix('+') {
            Some(rest) => (false, rest),
            None => return Token::Invalid,
        },
    };
    digits(rest, max_digits).map_or(Token::Invalid, |n| Token::Signed { negative, n })
}

/// A 1-based menu index of one or two digits.
pub fn index(raw: &str) -> Option<usize> {
    let n = digits(raw.trim(), 2)?;
    (n >= 1).then_some(n as usize)
}

/// Field names accepted by query commands.
pub fn is_identifier(raw: &str) -> bool {
    !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}
