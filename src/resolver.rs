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

//! Computes the value written to a stateful device field.
//!
//! Planning is pure: the argument token and the field's grammar decide
//! whether the current value is needed at all. Execution then performs at
//! most one read and one write.

use crate::argument::{self, Token};
use crate::client::{Transport, fetch_json, write_field};
use crate::error::CtlError;
use crate::query;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grammar {
    /// Cycles through `0..modulus`; no argument advances by one.
    Toggle { modulus: i64 },
    /// Absolute value in `0..=max` only.
    BoundedDigit { max: i64 },
    /// Absolute value or a signed delta of up to `digits` digits, clamped.
    RelativeOrAbsolute { max: i64, digits: usize },
    QueryOnly,
}

impl Grammar {
    fn digits(&self) -> usize {
        match *self {
            Grammar::Toggle { modulus } => width(modulus - 1),
            Grammar::BoundedDigit { max } => width(max),
            Grammar::RelativeOrAbsolute { digits, .. } => digits,
            Grammar::QueryOnly => 0,
        }
    }

    pub fn describe(&self) -> String {
        match *self {
            Grammar::Toggle { modulus } => format!("[0-{}|?]", modulus - 1),
            Grammar::BoundedDigit { max } => format!("<0-{max}|?>"),
            Grammar::RelativeOrAbsolute { max, .. } => format!("<0-{max}|+N|-N|?>"),
            Grammar::QueryOnly => "[?]".into(),
        }
    }
}

fn width(n: i64) -> usize {
    n.max(1).to_string().len()
}

/// A single read/write scalar on a device resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub resource: &'static str,
    pub name: &'static str,
    pub grammar: Grammar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plan {
    Read,
    Set(i64),
    Advance { modulus: i64 },
    Shift { delta: i64, max: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Current raw value; `None` when the device does not report the field.
    Value(Option<String>),
    Wrote(i64),
}

pub fn cycle(current: i64, modulus: i64) -> i64 {
    (current.rem_euclid(modulus) + 1) % modulus
}

pub fn shift(current: i64, delta: i64, max: i64) -> i64 {
    current.saturating_add(delta).clamp(0, max)
}

pub fn plan(option: &str, field: &Field, raw: Option<&str>) -> Result<Plan, CtlError> {
    let token = argument::classify(raw, field.grammar.digits());
    let arg = raw.unwrap_or_default();
    let bad = |reason: String| CtlError::invalid_argument(option, arg, reason);

    match (field.grammar, token) {
        (_, Token::QueryMarker) => Ok(Plan::Read),
        (Grammar::QueryOnly, Token::Empty) => Ok(Plan::Read),
        (Grammar::Toggle { modulus }, Token::Empty) => Ok(Plan::Advance { modulus }),
        (Grammar::Toggle { modulus }, Token::Digit(n)) if n < modulus => Ok(Plan::Set(n)),
        (Grammar::BoundedDigit { max }, Token::Digit(n))
        | (Grammar::RelativeOrAbsolute { max, .. }, Token::Digit(n))
            if n <= max =>
        {
            Ok(Plan::Set(n))
        }
        (Grammar::RelativeOrAbsolute { max, .. }, Token::Signed { negative, n }) => {
            let delta = if negative { -n } else { n };
            Ok(Plan::Shift { delta, max })
        }
        (Grammar::BoundedDigit { .. } | Grammar::RelativeOrAbsolute { .. }, Token::Empty) => {
            Err(CtlError::MissingArgument(option.to_string()))
        }
        (grammar, _) => Err(bad(format!("expected {}", grammar.describe()))),
    }
}

/// Plan, read if needed, and write.
pub fn resolve(
    transport: &dyn Transport,
    option: &str,
    field: &Field,
    raw: Option<&str>,
) -> Result<Outcome, CtlError> {
    let plan = plan(option, field, raw)?;
    debug!(option, ?plan, "resolved argument");

    let next = match plan {
        Plan::Read => {
            let doc = fetch_json(transport, field.resource)?;
            return Ok(Outcome::Value(query::get(&doc, field.name).map(query::scalar)));
        }
        Plan::Set(v) => v,
        Plan::Advance { modulus } => {
            let doc = fetch_json(transport, field.resource)?;
            let current = query::int(&doc, field.name).unwrap_or(0);
            cycle(current, modulus)
        }
        Plan::Shift { delta, max } => {
            let doc = fetch_json(transport, field.resource)?;
            let current = query::int(&doc, field.name)
                .ok_or_else(|| CtlError::QueryFieldAbsent(field.name.to_string()))?;
            shift(current, delta, max)
        }
    };

    write_field(transport, field.resource, field.name, next)?;
    Ok(Outcome::Wrote(next))
}
