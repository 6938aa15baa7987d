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

//! Command table: every supported option, its aliases and what it touches.
//!
//! Adding a device field or alias is a table edit; nothing else in the
//! crate needs to change.

use crate::client::Verb;
use crate::resolver::{Field, Grammar};
use crate::selection::{Filter, Selector};

/// Keys never shown by a resource dump: identity/structural entries,
/// child collections and transient telemetry.
pub const STRUCTURAL_KEYS: &[&str] = &["ussi", "class", "name", "type", "parent", "children", "cpu"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dump {
    pub resource: &'static str,
    /// Hidden in addition to [`STRUCTURAL_KEYS`].
    pub hidden: &'static [&'static str],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Action { verb: Verb, path: &'static str },
    Query(Dump),
    StatefulField(Field),
    Selector(Selector),
    NowPlaying,
    Seek,
}

impl Kind {
    pub fn label(&self) -> &'static str {
        match self {
            Kind::Action { .. } => "action",
            Kind::Query(_) => "query",
            Kind::StatefulField(_) => "field",
            Kind::Selector(_) => "selector",
            Kind::NowPlaying => "info",
            Kind::Seek => "seek",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Descriptor {
    pub name: &'static str,
    pub kind: Kind,
    pub summary: &'static str,
}

const fn action(
    name: &'static str,
    verb: Verb,
    path: &'static str,
    summary: &'static str,
) -> Descriptor {
    Descriptor {
        name,
        kind: Kind::Action { verb, path },
        summary,
    }
}

const fn dump(name: &'static str, resource: &'static str, summary: &'static str) -> Descriptor {
    Descriptor {
        name,
        kind: Kind::Query(Dump {
            resource,
            hidden: &[],
        }),
        summary,
    }
}

const fn field(
    name: &'static str,
    resource: &'static str,
    key: &'static str,
    grammar: Grammar,
    summary: &'static str,
) -> Descriptor {
    Descriptor {
        name,
        kind: Kind::StatefulField(Field {
            resource,
            name: key,
            grammar,
        }),
        summary,
    }
}

pub const DESCRIPTORS: &[Descriptor] = &[
    action("play", Verb::Get, "nowplaying?cmd=play", "start playback"),
    action("playpause", Verb::Get, "nowplaying?cmd=playpause", "toggle play/pause"),
    action("next", Verb::Get, "nowplaying?cmd=next", "next track"),
    action("prev", Verb::Get, "nowplaying?cmd=prev", "previous track"),
    action("stop", Verb::Get, "nowplaying?cmd=stop", "stop playback"),
    action("standby", Verb::Put, "power?system=lona", "enter network standby"),
    action("wake", Verb::Put, "power?system=on", "wake from standby"),
    action("clearqueue", Verb::Post, "inputs/playqueue?clear=true", "empty the play queue"),
    action("ping", Verb::Head, "power", "check the device answers"),
    dump("network", "network", "network settings"),
    dump("system", "system", "system information"),
    Descriptor {
        name: "levels",
        kind: Kind::Query(Dump {
            resource: "levels",
            hidden: &["room"],
        }),
        summary: "level settings",
    },
    dump("outputs", "outputs", "output settings"),
    dump("power", "power", "power state"),
    dump("update", "update", "firmware update status"),
    dump("capabilities", "system/capabilities", "device capabilities"),
    field(
        "volume",
        "levels/room",
        "volume",
        Grammar::RelativeOrAbsolute { max: 100, digits: 3 },
        "room volume",
    ),
    field(
        "mute",
        "levels/room",
        "mute",
        Grammar::Toggle { modulus: 2 },
        "mute on/off",
    ),
    field(
        "shuffle",
        "inputs",
        "shuffle",
        Grammar::Toggle { modulus: 2 },
        "shuffle on/off",
    ),
    field(
        "repeat",
        "inputs",
        "repeat",
        Grammar::Toggle { modulus: 3 },
        "repeat off/one/all",
    ),
    field(
        "standbytimeout",
        "power",
        "standbyTimeout",
        Grammar::RelativeOrAbsolute { max: 120, digits: 3 },
        "minutes before auto standby",
    ),
    field(
        "lighttheme",
        "userinterface",
        "lightTheme",
        Grammar::Toggle { modulus: 3 },
        "illumination theme",
    ),
    field(
        "brightness",
        "userinterface",
        "brightness",
        Grammar::BoundedDigit { max: 100 },
        "display brightness",
    ),
    field(
        "poweramp",
        "outputs/poweramp",
        "enabled",
        Grammar::Toggle { modulus: 2 },
        "power amplifier output",
    ),
    field(
        "serial",
        "system",
        "serialNumber",
        Grammar::QueryOnly,
        "serial number",
    ),
    Descriptor {
        name: "input",
        kind: Kind::Selector(Selector {
            resource: "inputs",
            filter: Filter::NotDisabled,
            sort_key: None,
            name_keys: &["name"],
            play_verb: Verb::Get,
            play_path: "{target}?cmd=select",
        }),
        summary: "choose an input",
    },
    Descriptor {
        name: "preset",
        kind: Kind::Selector(Selector {
            resource: "favourites",
            filter: Filter::HasField("presetID"),
            sort_key: Some("presetID"),
            name_keys: &["name"],
            play_verb: Verb::Get,
            play_path: "{target}?cmd=play",
        }),
        summary: "play a radio preset",
    },
    Descriptor {
        name: "favourite",
        kind: Kind::Selector(Selector {
            resource: "favourites",
            filter: Filter::ClassPrefix("object.stream.radio"),
            sort_key: None,
            name_keys: &["name"],
            play_verb: Verb::Get,
            play_path: "{target}?cmd=play",
        }),
        summary: "play a radio favourite",
    },
    Descriptor {
        name: "queue",
        kind: Kind::Selector(Selector {
            resource: "inputs/playqueue",
            filter: Filter::All,
            sort_key: None,
            name_keys: &["title", "name"],
            play_verb: Verb::Post,
            play_path: "inputs/playqueue?cmd=play&ussi={target}",
        }),
        summary: "jump to a play-queue track",
    },
    Descriptor {
        name: "nowplaying",
        kind: Kind::NowPlaying,
        summary: "current track",
    },
    Descriptor {
        name: "seek",
        kind: Kind::Seek,
        summary: "seek to N, +N or -N seconds",
    },
];

/// `alias -> canonical name`.
pub const ALIASES: &[(&str, &str)] = &[
    ("pause", "playpause"),
    ("pp", "playpause"),
    ("toggle", "playpause"),
    ("skip", "next"),
    ("previous", "prev"),
    ("back", "prev"),
    ("sleep", "standby"),
    ("off", "standby"),
    ("on", "wake"),
    ("clear", "clearqueue"),
    ("alive", "ping"),
    ("net", "network"),
    ("sys", "system"),
    ("lvl", "levels"),
    ("out", "outputs"),
    ("pwr", "power"),
    ("upd", "update"),
    ("caps", "capabilities"),
    ("vol", "volume"),
    ("v", "volume"),
    ("m", "mute"),
    ("shuf", "shuffle"),
    ("rep", "repeat"),
    ("timeout", "standbytimeout"),
    ("theme", "lighttheme"),
    ("light", "lighttheme"),
    ("bright", "brightness"),
    ("amp", "poweramp"),
    ("inputs", "input"),
    ("in", "input"),
    ("source", "input"),
    ("presets", "preset"),
    ("radio", "preset"),
    ("favourites", "favourite"),
    ("fav", "favourite"),
    ("favs", "favourite"),
    ("playqueue", "queue"),
    ("q", "queue"),
    ("now", "nowplaying"),
    ("np", "nowplaying"),
    ("current", "nowplaying"),
    ("status", "nowplaying"),
    ("pos", "seek"),
    ("position", "seek"),
];

/// Normalize a user token and resolve aliases. Leading dashes are dropped
/// so `--vol` and `vol` are the same option.
pub fn canonicalize(token: &str) -> String {
    let bare = token.trim().trim_start_matches('-').to_ascii_lowercase();
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == bare)
        .map(|(_, name)| (*name).to_string())
        .unwrap_or(bare)
}

pub fn lookup(name: &str) -> Option<&'static Descriptor> {
    DESCRIPTORS.iter().find(|d| d.name == name)
}

pub fn aliases_of(name: &str) -> impl Iterator<Item = &'static str> + '_ {
    ALIASES
        .iter()
        .filter(move |(_, target)| *target == name)
        .map(|(alias, _)| *alias)
}
