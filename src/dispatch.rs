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

use crate::argument;
use crate::client::{Transport, Verb, fetch_json};
use crate::error::CtlError;
use crate::nowplaying::{NowPlaying, clock};
use crate::query::{self, QueryError};
use crate::registry::{self, DESCRIPTORS, Dump, Kind, STRUCTURAL_KEYS};
use crate::resolver::{self, Outcome};
use crate::seek;
use crate::selection::{self, Mode, Prompt, Selection};
use serde_json::Value;
use std::io::{self, Write};
use tracing::debug;

pub struct Dispatcher<'a> {
    transport: &'a dyn Transport,
    prompt: &'a mut dyn Prompt,
    mode: Mode,
}

impl<'a> Dispatcher<'a> {
    pub fn new(transport: &'a dyn Transport, prompt: &'a mut dyn Prompt, mode: Mode) -> Self {
        Self {
            transport,
            prompt,
            mode,
        }
    }

    /// Run one command and write its output to `out`.
    pub fn run(
        &mut self,
        option: &str,
        arg: Option<&str>,
        out: &mut dyn Write,
    ) -> Result<(), CtlError> {
        let name = registry::canonicalize(option);
        let descriptor = registry::lookup(&name)
            .ok_or_else(|| CtlError::InvalidOption(option.to_string()))?;
        debug!(option, %name, kind = descriptor.kind.label(), ?arg, "dispatching");

        match descriptor.kind {
            Kind::Action { verb, path } => {
                if let Some(extra) = arg {
                    return Err(CtlError::invalid_argument(&name, extra, "takes no argument"));
                }
                self.transport.request(verb.method(), path)?;
                if verb == Verb::Head {
                    writeln!(out, "ok")?;
                }
            }
            Kind::Query(dump) => self.dump(&name, &dump, arg, out)?,
            Kind::StatefulField(field) => {
                match resolver::resolve(self.transport, &name, &field, arg)? {
                    Outcome::Value(Some(value)) => writeln!(out, "{value}")?,
                    Outcome::Value(None) => {}
                    Outcome::Wrote(value) => writeln!(out, "{value}")?,
                }
            }
            Kind::Selector(selector) => {
                match selection::run(
                    self.transport,
                    &selector,
                    &name,
                    arg,
                    self.mode,
                    &mut *self.prompt,
                )? {
                    Selection::Listed(items) => selection::write_menu(out, &items)?,
                    Selection::Played(item) => writeln!(out, "{}", item.display_name)?,
                }
            }
            Kind::NowPlaying => {
                let doc = fetch_json(self.transport, seek::NOW_PLAYING)?;
                match arg {
                    None => writeln!(out, "{}", NowPlaying::from_json(&doc))?,
                    Some(key) if argument::is_identifier(key) => write_field(&doc, key, out)?,
                    Some(bad) => {
                        return Err(CtlError::invalid_argument(&name, bad, "expected a field name"));
                    }
                }
            }
            Kind::Seek => {
                if let Some(secs) = seek::seek(self.transport, &name, arg)? {
                    writeln!(out, "{}", clock(secs * 1000))?;
                }
            }
        }
        Ok(())
    }

    fn dump(
        &self,
        name: &str,
        dump: &Dump,
        arg: Option<&str>,
        out: &mut dyn Write,
    ) -> Result<(), CtlError> {
        match arg {
            None => {
                let doc = fetch_json(self.transport, dump.resource)?;
                for (key, value) in query::entries(&doc)? {
                    if STRUCTURAL_KEYS.contains(&key.as_str()) || dump.hidden.contains(&key.as_str())
                    {
                        continue;
                    }
                    writeln!(out, "{key}={value}")?;
                }
            }
            Some(key) if argument::is_identifier(key) => {
                let doc = fetch_json(self.transport, dump.resource)?;
                write_field(&doc, key, out)?;
            }
            Some(bad) => {
                return Err(CtlError::invalid_argument(name, bad, "expected a field name"));
            }
        }
        Ok(())
    }
}

/// Print one field; an absent field prints nothing.
fn write_field(doc: &Value, key: &str, out: &mut dyn Write) -> Result<(), CtlError> {
    match query::lookup(doc, key) {
        Ok(value) => writeln!(out, "{}", query::scalar(&value))?,
        Err(QueryError::FieldAbsent(_)) => debug!(key, "field absent"),
        Err(err) => return Err(err.into()),
    }
    Ok(())
}

/// Print every command with its aliases, argument shape and summary.
pub fn write_commands(out: &mut dyn Write) -> io::Result<()> {
    let rows: Vec<[String; 4]> = DESCRIPTORS
        .iter()
        .map(|d| {
            let aliases = registry::aliases_of(d.name).collect::<Vec<_>>().join(",");
            let args = match d.kind {
                Kind::Action { .. } => String::new(),
                Kind::Query(_) | Kind::NowPlaying => "[FIELD]".into(),
                Kind::StatefulField(f) => f.grammar.describe(),
                Kind::Selector(_) => "[INDEX]".into(),
                Kind::Seek => "<N|+N|-N>".into(),
            };
            [d.name.to_string(), aliases, args, d.summary.to_string()]
        })
        .collect();

    let header = ["COMMAND", "ALIASES", "ARG", "DESCRIPTION"];
    let mut widths: Vec<usize> = header.iter().map(|h| h.len()).collect();
    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(cell.len());
        }
    }

    let last = header.len() - 1;
    let header_row = header.map(String::from);
    for row in std::iter::once(&header_row).chain(rows.iter()) {
        for (i, cell) in row.iter().enumerate() {
            if i > 0 {
                write!(out, "  ")?;
            }
            if i == last {
                write!(out, "{cell}")?;
            } else {
                write!(out, "{:width$}", cell, width = widths[i])?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}
