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

//! Browse a resource's children and play one of them.

use crate::argument;
use crate::client::{Transport, Verb, fetch_json};
use crate::error::CtlError;
use crate::query;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::Value;
use std::io::{self, BufRead, Write};
use tracing::debug;

const TARGET_KEY: &str = "ussi";
const TARGET: &str = "{target}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    All,
    /// Drop children whose `disabled` flag is set.
    NotDisabled,
    /// Keep children where the key is present and not null.
    HasField(&'static str),
    /// Keep children whose `class` starts with the prefix.
    ClassPrefix(&'static str),
}

impl Filter {
    fn keeps(&self, child: &Value) -> bool {
        match *self {
            Filter::All => true,
            Filter::NotDisabled => !is_set(query::get(child, "disabled")),
            Filter::HasField(key) => query::get(child, key).is_some(),
            Filter::ClassPrefix(prefix) => query::get(child, "class")
                .and_then(Value::as_str)
                .is_some_and(|class| class.starts_with(prefix)),
        }
    }
}

/// Truthiness of a device flag reported as a bool, number or string.
fn is_set(flag: Option<&Value>) -> bool {
    match flag {
        None => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.eq_ignore_ascii_case("true")
                || s.eq_ignore_ascii_case("yes")
                || s.parse::<i64>().is_ok_and(|n| n != 0)
        }
        Some(_) => false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selector {
    pub resource: &'static str,
    pub filter: Filter,
    /// Numeric key to sort by, ascending; children without it go last.
    pub sort_key: Option<&'static str>,
    /// Display name candidates, first non-empty wins.
    pub name_keys: &'static [&'static str],
    pub play_verb: Verb,
    /// Path of the play call; `{target}` is replaced by the item's id.
    pub play_path: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectableItem {
    pub display_name: String,
    pub target_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Listed(Vec<SelectableItem>),
    Played(SelectableItem),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Interactive,
    Listing,
}

/// Source of an interactive choice; returns a 0-based index into `items`.
pub trait Prompt {
    fn choose(&mut self, items: &[SelectableItem]) -> Result<usize, CtlError>;
}

/// Numbered menu on a line-oriented terminal.
pub struct LinePrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LinePrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl LinePrompt<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompt for LinePrompt<R, W> {
    fn choose(&mut self, items: &[SelectableItem]) -> Result<usize, CtlError> {
        write_menu(&mut self.output, items)?;
        loop {
            write!(self.output, "Select 1-{}: ", items.len())?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Err(CtlError::MissingArgument("selection".into()));
            }
            match argument::index(&line) {
                Some(n) if n <= items.len() => return Ok(n - 1),
                _ => writeln!(self.output, "Invalid choice")?,
            }
        }
    }
}

pub fn write_menu(out: &mut dyn Write, items: &[SelectableItem]) -> io::Result<()> {
    for (i, item) in items.iter().enumerate() {
        writeln!(out, "{}) {}", i + 1, item.display_name)?;
    }
    Ok(())
}

/// Filter, sort and project a resource document into menu order.
pub fn project(selector: &Selector, doc: &Value) -> Result<Vec<SelectableItem>, CtlError> {
    let mut kept: Vec<&Value> = query::children(doc)?
        .iter()
        .filter(|child| selector.filter.keeps(child))
        .collect();

    if let Some(key) = selector.sort_key {
        kept.sort_by_key(|child| {
            let v = query::int(child, key);
            (v.is_none(), v)
        });
    }

    Ok(kept
        .into_iter()
        .filter_map(|child| {
            let target_id = query::get(child, TARGET_KEY).map(query::scalar)?;
            let display_name = selector
                .name_keys
                .iter()
                .filter_map(|k| query::get(child, k).map(query::scalar))
                .find(|s| !s.is_empty())
                .unwrap_or_else(|| "?".into());
            Some(SelectableItem {
                display_name,
                target_id,
            })
        })
        .collect())
}

pub fn list(
    transport: &dyn Transport,
    selector: &Selector,
) -> Result<Vec<SelectableItem>, CtlError> {
    let doc = fetch_json(transport, selector.resource)?;
    project(selector, &doc)
}

/// Resolve a 1-based index argument against the menu.
pub fn pick<'a>(
    option: &str,
    items: &'a [SelectableItem],
    raw: &str,
) -> Result<&'a SelectableItem, CtlError> {
    if items.is_empty() {
        return Err(CtlError::invalid_argument(option, raw, "nothing to select"));
    }
    argument::index(raw)
        .and_then(|n| items.get(n - 1))
        .ok_or_else(|| {
            CtlError::invalid_argument(option, raw, format!("expected 1-{}", items.len()))
        })
}

/// Substitute `{target}`: verbatim in the path, percent-encoded in the query.
fn play_path(template: &str, target: &str) -> String {
    match template.split_once('?') {
        Some((path, query)) => {
            let encoded = utf8_percent_encode(target, NON_ALPHANUMERIC).to_string();
            format!(
                "{}?{}",
                path.replace(TARGET, target),
                query.replace(TARGET, &encoded)
            )
        }
        None => template.replace(TARGET, target),
    }
}

pub fn play(
    transport: &dyn Transport,
    selector: &Selector,
    item: &SelectableItem,
) -> Result<(), CtlError> {
    let path = play_path(selector.play_path, &item.target_id);
    debug!(%path, name = %item.display_name, "playing selection");
    transport.request(selector.play_verb.method(), &path)?;
    Ok(())
}

pub fn run(
    transport: &dyn Transport,
    selector: &Selector,
    option: &str,
    raw: Option<&str>,
    mode: Mode,
    prompt: &mut dyn Prompt,
) -> Result<Selection, CtlError> {
    let items = list(transport, selector)?;

    let chosen = match (raw, mode) {
        (Some(raw), _) => pick(option, &items, raw)?.clone(),
        (None, Mode::Listing) => return Ok(Selection::Listed(items)),
        (None, Mode::Interactive) => {
            if items.is_empty() {
                return Err(CtlError::invalid_argument(option, "", "nothing to select"));
            }
            let idx = prompt.choose(&items)?;
            items
                .get(idx)
                .cloned()
                .ok_or_else(|| CtlError::invalid_argument(option, &idx.to_string(), "no such item"))?
        }
    };

    play(transport, selector, &chosen)?;
    Ok(Selection::Played(chosen))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockTransport;
    use serde_json::json;
    use std::io::Cursor;

    const PRESETS: Selector = Selector {
        resource: "favourites",
        filter: Filter::HasField("presetID"),
        sort_key: Some("presetID"),
        name_keys: &["name"],
        play_verb: Verb::Get,
        play_path: "{target}?cmd=play",
    };
    const INPUTS: Selector = Selector {
        resource: "inputs",
        filter: Filter::NotDisabled,
        sort_key: None,
        name_keys: &["name"],
        play_verb: Verb::Get,
        play_path: "{target}?cmd=select",
    };

    struct Scripted(Vec<usize>);

    impl Prompt for Scripted {
        fn choose(&mut self, _items: &[SelectableItem]) -> Result<usize, CtlError> {
            self.0
                .pop()
                .ok_or_else(|| CtlError::MissingArgument("selection".into()))
        }
    }

    fn favourites() -> Value {
        json!({
            "children": [
                {"name": "Jazz FM", "ussi": "favourites/4", "presetID": 3, "class": "object.stream.radio"},
                {"name": "Album", "ussi": "favourites/9", "class": "object.container.album"},
                {"name": "BBC 6", "ussi": "favourites/2", "presetID": 1, "class": "object.stream.radio"},
                {"name": "FIP", "ussi": "favourites/5", "presetID": null, "class": "object.stream.radio"},
                {"name": "KEXP", "ussi": "favourites/7", "presetID": "2", "class": "object.stream.radio"}
            ]
        })
    }

    fn inputs() -> Value {
        json!({
            "children": [
                {"name": "Spotify", "ussi": "inputs/spotify", "disabled": false},
                {"name": "Optical", "ussi": "inputs/dig1", "disabled": true},
                {"name": "Radio", "ussi": "inputs/radio"}
            ]
        })
    }

    fn names(items: &[SelectableItem]) -> Vec<&str> {
        items.iter().map(|i| i.display_name.as_str()).collect()
    }

    #[test]
    fn presets_are_filtered_and_sorted() {
        let items = project(&PRESETS, &favourites()).unwrap();
        assert_eq!(names(&items), vec!["BBC 6", "KEXP", "Jazz FM"]);
        assert_eq!(items[0].target_id, "favourites/2");
    }

    #[test]
    fn radio_favourites_use_class_prefix() {
        let radio = Selector {
            filter: Filter::ClassPrefix("object.stream.radio"),
            sort_key: None,
            ..PRESETS
        };
        let items = project(&radio, &favourites()).unwrap();
        assert_eq!(names(&items), vec!["Jazz FM", "BBC 6", "FIP", "KEXP"]);
    }

    #[test]
    fn disabled_inputs_are_hidden() {
        let items = project(&INPUTS, &inputs()).unwrap();
        assert_eq!(names(&items), vec!["Spotify", "Radio"]);
    }

    #[test]
    fn listing_order_is_stable() {
        let device = MockTransport::new().with_json("favourites", favourites());
        let first = list(&device, &PRESETS).unwrap();
        let second = list(&device, &PRESETS).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn index_bounds() {
        let items = project(&PRESETS, &favourites()).unwrap();
        assert_eq!(pick("preset", &items, "1").unwrap().display_name, "BBC 6");
        assert_eq!(pick("preset", &items, "3").unwrap().display_name, "Jazz FM");
        for bad in ["0", "4", "x", "", "-1", "100"] {
            assert!(
                matches!(
                    pick("preset", &items, bad),
                    Err(CtlError::InvalidArgument { .. })
                ),
                "{bad}"
            );
        }
    }

    #[test]
    fn empty_collection_cannot_be_indexed() {
        let device = MockTransport::new().with_json("inputs", json!({"children": []}));
        let listed = run(&device, &INPUTS, "input", None, Mode::Listing, &mut Scripted(vec![]))
            .unwrap();
        assert_eq!(listed, Selection::Listed(vec![]));

        let err = run(&device, &INPUTS, "input", Some("1"), Mode::Listing, &mut Scripted(vec![]))
            .unwrap_err();
        assert!(matches!(err, CtlError::InvalidArgument { .. }));

        let err = run(
            &device,
            &INPUTS,
            "input",
            None,
            Mode::Interactive,
            &mut Scripted(vec![0]),
        )
        .unwrap_err();
        assert!(matches!(err, CtlError::InvalidArgument { .. }));
        assert!(device.writes().is_empty());
    }

    #[test]
    fn index_argument_plays_without_prompting() {
        let device = MockTransport::new().with_json("inputs", inputs());
        let out = run(&device, &INPUTS, "input", Some("2"), Mode::Interactive, &mut Scripted(vec![]))
            .unwrap();
        assert_eq!(
            out,
            Selection::Played(SelectableItem {
                display_name: "Radio".into(),
                target_id: "inputs/radio".into(),
            })
        );
        assert_eq!(device.writes(), vec!["GET inputs/radio?cmd=select"]);
    }

    #[test]
    fn listing_mode_has_no_side_effects() {
        let device = MockTransport::new().with_json("favourites", favourites());
        let out = run(&device, &PRESETS, "preset", None, Mode::Listing, &mut Scripted(vec![]))
            .unwrap();
        assert!(matches!(out, Selection::Listed(ref items) if items.len() == 3));
        assert!(device.writes().is_empty());
    }

    #[test]
    fn interactive_choice_is_played() {
        let device = MockTransport::new().with_json("favourites", favourites());
        let out = run(
            &device,
            &PRESETS,
            "preset",
            None,
            Mode::Interactive,
            &mut Scripted(vec![2]),
        )
        .unwrap();
        assert!(matches!(out, Selection::Played(ref item) if item.display_name == "Jazz FM"));
        assert_eq!(device.writes(), vec!["GET favourites/4?cmd=play"]);
    }

    #[test]
    fn line_prompt_reprompts_until_valid() {
        let items = project(&INPUTS, &inputs()).unwrap();
        let mut output = Vec::new();
        let mut prompt = LinePrompt::new(Cursor::new("\n7\nabc\n2\n"), &mut output);

        assert_eq!(prompt.choose(&items).unwrap(), 1);

        let shown = String::from_utf8(output).unwrap();
        assert!(shown.starts_with("1) Spotify\n2) Radio\n"));
        assert_eq!(shown.matches("Invalid choice").count(), 3);
    }

    #[test]
    fn line_prompt_fails_at_end_of_input() {
        let items = project(&INPUTS, &inputs()).unwrap();
        let mut prompt = LinePrompt::new(Cursor::new(""), Vec::new());
        assert!(matches!(
            prompt.choose(&items),
            Err(CtlError::MissingArgument(_))
        ));
    }

    #[test]
    fn target_is_encoded_only_inside_the_query() {
        assert_eq!(
            play_path("{target}?cmd=select", "inputs/radio"),
            "inputs/radio?cmd=select"
        );
        assert_eq!(
            play_path("inputs/playqueue?cmd=play&ussi={target}", "tracks/1&x=2 a"),
            "inputs/playqueue?cmd=play&ussi=tracks%2F1%26x%3D2%20a"
        );
    }

    #[test]
    fn disabled_flag_accepts_device_spellings() {
        let doc = json!({
            "children": [
                {"name": "A", "ussi": "inputs/a", "disabled": "true"},
                {"name": "B", "ussi": "inputs/b", "disabled": "false"},
                {"name": "C", "ussi": "inputs/c", "disabled": 1},
                {"name": "D", "ussi": "inputs/d", "disabled": "0"},
                {"name": "E", "ussi": "inputs/e", "disabled": true},
                {"name": "F", "ussi": "inputs/f", "disabled": null}
            ]
        });
        let items = project(&INPUTS, &doc).unwrap();
        assert_eq!(names(&items), vec!["B", "D", "F"]);
    }
}
