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

//! Path queries over device JSON documents.
//!
//! Expressions are dotted paths with optional array indices and an optional
//! default: `children[0].name // ?`. A `null` counts as absent, so the
//! default also replaces explicit nulls.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("field `{0}` is absent")]
    FieldAbsent(String),
    #[error("`{path}` is not {expected}")]
    TypeMismatch {
        path: String,
        expected: &'static str,
    },
    #[error("{0}")]
    Parse(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(usize),
}

pub fn parse(body: &[u8]) -> Result<Value, QueryError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body).map_err(|err| QueryError::Parse(err.to_string()))
}

fn segments(path: &str) -> Result<Vec<Segment>, QueryError> {
    let mut out = Vec::new();
    for part in path.split('.').filter(|p| !p.is_empty()) {
        let (key, mut rest) = match part.find('[') {
            Some(pos) => (&part[..pos], &part[pos..]),
            None => (part, ""),
        };
        if !key.is_empty() {
            out.push(Segment::Key(key.to_string()));
        }
        while let Some(stripped) = rest.strip_prefix('[') {
            let close = stripped
                .find(']')
                .ok_or_else(|| QueryError::Parse(format!("unclosed `[` in `{path}`")))?;
            let idx = stripped[..close]
                .parse::<usize>()
                .map_err(|_| QueryError::Parse(format!("bad index in `{path}`")))?;
            out.push(Segment::Index(idx));
            rest = &stripped[close + 1..];
        }
        if !rest.is_empty() {
            return Err(QueryError::Parse(format!("unexpected `{rest}` in `{path}`")));
        }
    }
    Ok(out)
}

/// Walk `path` through `doc`; `None` when any step is missing or null.
pub fn get<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    let segs = segments(path).ok()?;
    let mut cur = doc;
    for seg in &segs {
        cur = match seg {
            Segment::Key(k) => cur.get(k.as_str())?,
            Segment::Index(i) => cur.get(*i)?,
        };
    }
    (!cur.is_null()).then_some(cur)
}

/// Evaluate `path` or `path // default`.
pub fn lookup(doc: &Value, expr: &str) -> Result<Value, QueryError> {
    let (path, default) = match expr.split_once("//") {
        Some((p, d)) => (p.trim(), Some(d.trim())),
        None => (expr.trim(), None),
    };
    segments(path)?;
    match (get(doc, path), default) {
        (Some(v), _) => Ok(v.clone()),
        (None, Some(d)) => {
            Ok(serde_json::from_str(d).unwrap_or_else(|_| Value::String(d.to_string())))
        }
        (None, None) => Err(QueryError::FieldAbsent(path.to_string())),
    }
}

/// Render a JSON value the way it is printed on the command line.
pub fn scalar(value: &Value) -> String {
    match value {
        Value::Null => "".into(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

pub fn field_or(doc: &Value, path: &str, default: &str) -> String {
    get(doc, path)
        .map(scalar)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Integer view of a field; devices report numbers both as JSON numbers
/// and as numeric strings.
pub fn int(doc: &Value, path: &str) -> Option<i64> {
    match get(doc, path)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

/// Project several fields at once, each falling back to `default`.
pub fn tuple(doc: &Value, paths: &[&str], default: &str) -> Vec<String> {
    paths.iter().map(|p| field_or(doc, p, default)).collect()
}

/// The `children` collection of a resource; absent means empty.
pub fn children(doc: &Value) -> Result<&[Value], QueryError> {
    match doc.get("children") {
        None | Some(Value::Null) => Ok(&[]),
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(QueryError::TypeMismatch {
            path: "children".into(),
            expected: "an array",
        }),
    }
}

/// Top-level `key=value` pairs of an object in document order.
pub fn entries(doc: &Value) -> Result<Vec<(String, String)>, QueryError> {
    let map = doc.as_object().ok_or(QueryError::TypeMismatch {
        path: ".".into(),
        expected: "an object",
    })?;
    Ok(map.iter().map(|(k, v)| (k.clone(), scalar(v))).collect())
}
