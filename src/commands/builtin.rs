//! Built-in command tables
//!
//! A subset of the receiver command set covering power, volume, muting,
//! input selection, tone/level trims, presets, multiroom and network
//! controls for the main zone, zones 2-4 and the dock/network zone.
//! Use [`Catalogue::from_json`](super::Catalogue::from_json) for a
//! complete model-specific catalogue.

use super::catalogue::{build_zone, Catalogue, CommandSpec, ValueKey, ValueRange, ValueSpec};

enum V {
    Code(&'static str, &'static [&'static str], &'static str),
    Range(i64, i64, &'static str),
    Pattern(&'static str, &'static str),
}

struct C {
    prefix: &'static str,
    names: &'static [&'static str],
    description: &'static str,
    values: &'static [V],
}

struct Z {
    name: &'static str,
    aliases: &'static [&'static str],
    commands: &'static [C],
}

// =============================================================================
// Shared value tables
// =============================================================================

const POWER: &[V] = &[
    V::Code("00", &["standby", "off"], "sets System Standby"),
    V::Code("01", &["on"], "sets System On"),
    V::Code("QSTN", &["query"], "gets the System Power Status"),
];

const MUTING: &[V] = &[
    V::Code("00", &["off"], "sets Audio Muting Off"),
    V::Code("01", &["on"], "sets Audio Muting On"),
    V::Code("TG", &["toggle"], "sets Audio Muting Wrap-Around"),
    V::Code("QSTN", &["query"], "gets the Audio Muting State"),
];

const VOLUME: &[V] = &[
    V::Range(0, 100, "Volume Level 0 - 100 (in hexadecimal representation)"),
    V::Code("UP", &["level-up"], "sets Volume Level Up"),
    V::Code("DOWN", &["level-down"], "sets Volume Level Down"),
    V::Code("UP1", &["level-up-1db-step"], "sets Volume Level Up 1dB Step"),
    V::Code("DOWN1", &["level-down-1db-step"], "sets Volume Level Down 1dB Step"),
    V::Code("QSTN", &["query"], "gets the Volume Level"),
];

const SELECTOR: &[V] = &[
    V::Code("00", &["video1", "vcr", "dvr", "stb"], "sets VIDEO1, VCR/DVR, STB/DVR"),
    V::Code("01", &["video2", "cbl", "sat"], "sets VIDEO2, CBL/SAT"),
    V::Code("02", &["video3", "game/tv", "game"], "sets VIDEO3, GAME/TV, GAME"),
    V::Code("03", &["video4", "aux1"], "sets VIDEO4, AUX1(AUX)"),
    V::Code("05", &["video6", "pc"], "sets VIDEO6, PC"),
    V::Code("10", &["dvd", "bd-dvd"], "sets DVD, BD/DVD"),
    V::Code("12", &["tv"], "sets TV"),
    V::Code("20", &["tape-1", "tv/tape"], "sets TAPE(1), TV/TAPE"),
    V::Code("22", &["phono"], "sets PHONO"),
    V::Code("23", &["cd", "tv/cd"], "sets CD, TV/CD"),
    V::Code("24", &["fm"], "sets FM"),
    V::Code("25", &["am"], "sets AM"),
    V::Code("26", &["tuner"], "sets TUNER"),
    V::Code("2B", &["network", "net"], "sets NETWORK, NET"),
    V::Code("2E", &["bluetooth"], "sets BLUETOOTH"),
    V::Code("UP", &["up"], "sets Selector Position Wrap-Around Up"),
    V::Code("DOWN", &["down"], "sets Selector Position Wrap-Around Down"),
    V::Code("QSTN", &["query"], "gets The Selector Position"),
];

const TUNING: &[V] = &[
    V::Pattern("nnnnn", "sets Directly Tuning Frequency"),
    V::Code("UP", &["up"], "sets Tuning Frequency Wrap-Around Up"),
    V::Code("DOWN", &["down"], "sets Tuning Frequency Wrap-Around Down"),
    V::Code("QSTN", &["query"], "gets The Tuning Frequency"),
];

const PRESET: &[V] = &[
    V::Range(1, 40, "sets Preset No. 1 - 40 (in hexadecimal representation)"),
    V::Code("UP", &["up"], "sets Preset No. Wrap-Around Up"),
    V::Code("DOWN", &["down"], "sets Preset No. Wrap-Around Down"),
    V::Code("QSTN", &["query"], "gets The Preset No."),
];

const QUERY_ONLY: &[V] = &[V::Code("QSTN", &["query"], "gets the current state")];

// =============================================================================
// Zones
// =============================================================================

const MAIN: &[C] = &[
    C { prefix: "PWR", names: &["system-power", "power"], description: "System Power Command", values: POWER },
    C { prefix: "AMT", names: &["audio-muting", "mute"], description: "Audio Muting Command", values: MUTING },
    C { prefix: "MVL", names: &["master-volume", "volume"], description: "Master Volume Command", values: VOLUME },
    C { prefix: "SLI", names: &["input-selector", "selector"], description: "Input Selector Command", values: SELECTOR },
    C {
        prefix: "SWL",
        names: &["subwoofer-temporary-level", "subwoofer-level"],
        description: "Subwoofer (temporary) Level Command",
        values: &[
            V::Range(-15, 12, "sets Subwoofer Level -15dB - 0dB - +12dB"),
            V::Code("UP", &["up"], "LEVEL UP"),
            V::Code("DOWN", &["down"], "LEVEL DOWN"),
            V::Code("QSTN", &["query"], "gets the Subwoofer Level"),
        ],
    },
    C {
        prefix: "CTL",
        names: &["center-temporary-level", "center-level"],
        description: "Center (temporary) Level Command",
        values: &[
            V::Range(-12, 12, "sets Center Level -12dB - 0dB - +12dB"),
            V::Code("UP", &["up"], "LEVEL UP"),
            V::Code("DOWN", &["down"], "LEVEL DOWN"),
            V::Code("QSTN", &["query"], "gets the Center Level"),
        ],
    },
    C {
        prefix: "TFR",
        names: &["tone-front"],
        description: "Tone(Front) Command",
        values: &[
            V::Pattern("B{xx}", "Front Bass (xx is \"-A\"...\"00\"...\"+A\")"),
            V::Code("BUP", &["bass-up"], "sets Front Bass up(2 step)"),
            V::Code("BDOWN", &["bass-down"], "sets Front Bass down(2 step)"),
            V::Code("QSTN", &["query"], "gets Front Tone"),
        ],
    },
    C {
        prefix: "LMD",
        names: &["listening-mode"],
        description: "Listening Mode Command",
        values: &[
            V::Code("00", &["stereo"], "sets STEREO"),
            V::Code("01", &["direct"], "sets DIRECT"),
            V::Code("0C", &["all-ch-stereo"], "sets ALL CH STEREO"),
            V::Code("11", &["pure-audio"], "sets PURE AUDIO"),
            V::Code("UP", &["up"], "sets Listening Mode Wrap-Around Up"),
            V::Code("DOWN", &["down"], "sets Listening Mode Wrap-Around Down"),
            V::Code("QSTN", &["query"], "gets The Listening Mode"),
        ],
    },
    C {
        prefix: "DIM",
        names: &["dimmer-level", "dim"],
        description: "Dimmer Level Command",
        values: &[
            V::Code("00", &["bright"], "sets Dimmer Level \"Bright\""),
            V::Code("01", &["dim"], "sets Dimmer Level \"Dim\""),
            V::Code("02", &["dark"], "sets Dimmer Level \"Dark\""),
            V::Code("03", &["shut-off"], "sets Dimmer Level \"Shut-Off\""),
            V::Code("DIM", &["brightness"], "sets Dimmer Level Wrap-Around Up"),
            V::Code("QSTN", &["query"], "gets The Dimmer Level"),
        ],
    },
    C {
        prefix: "SLP",
        names: &["sleep-set", "sleep"],
        description: "Sleep Set Command",
        values: &[
            V::Range(1, 90, "sets Sleep Time 1 - 90min (in hexadecimal representation)"),
            V::Code("OFF", &["time-off", "off"], "sets Sleep Time Off"),
            V::Code("UP", &["up"], "sets Sleep Time Wrap-Around Up"),
            V::Code("QSTN", &["query"], "gets The Sleep Time"),
        ],
    },
    C {
        prefix: "MOT",
        names: &["music-optimizer"],
        description: "Music Optimizer Command",
        values: &[
            V::Code("00", &["off"], "sets Music Optimizer Off"),
            V::Code("01", &["on"], "sets Music Optimizer On"),
            V::Code("QSTN", &["query"], "gets The Music Optimizer State"),
        ],
    },
    C { prefix: "TUN", names: &["tuning", "tune"], description: "Tuning Command", values: TUNING },
    C { prefix: "PRS", names: &["preset"], description: "Preset Command", values: PRESET },
    C {
        prefix: "MDI",
        names: &["multiroom-info"],
        description: "Multiroom Device Information Command",
        values: QUERY_ONLY,
    },
    C {
        prefix: "MGS",
        names: &["multiroom-group-setting"],
        description: "Multiroom Group Setting Command",
        values: &[],
    },
    C {
        prefix: "CTV",
        names: &["tv-operation"],
        description: "TV Operation Command (HDMI-CEC, no response)",
        values: &[
            V::Code("POWER", &["power"], "TV Power ON/Standby"),
            V::Code("PWRON", &["power-on"], "TV Power ON"),
            V::Code("PWROFF", &["power-off"], "TV Power Standby"),
            V::Code("CHUP", &["channel-up"], "TV Channel Up"),
            V::Code("CHDN", &["channel-down"], "TV Channel Down"),
            V::Code("VLUP", &["volume-up"], "TV Volume Up"),
            V::Code("VLDN", &["volume-down"], "TV Volume Down"),
            V::Code("MUTE", &["mute"], "TV Mute"),
        ],
    },
];

const ZONE2: &[C] = &[
    C { prefix: "ZPW", names: &["power"], description: "Zone2 Power Command", values: POWER },
    C { prefix: "ZMT", names: &["muting", "mute"], description: "Zone2 Muting Command", values: MUTING },
    C { prefix: "ZVL", names: &["volume"], description: "Zone2 Volume Command", values: VOLUME },
    C { prefix: "SLZ", names: &["selector"], description: "ZONE2 Selector Command", values: SELECTOR },
    C { prefix: "TUZ", names: &["tuning", "tune"], description: "Tuning Command", values: TUNING },
    C { prefix: "PRZ", names: &["preset"], description: "Preset Command", values: PRESET },
];

const ZONE3: &[C] = &[
    C { prefix: "PW3", names: &["power"], description: "Zone3 Power Command", values: POWER },
    C { prefix: "MT3", names: &["muting", "mute"], description: "Zone3 Muting Command", values: MUTING },
    C { prefix: "VL3", names: &["volume"], description: "Zone3 Volume Command", values: VOLUME },
    C { prefix: "SL3", names: &["selector"], description: "ZONE3 Selector Command", values: SELECTOR },
];

const ZONE4: &[C] = &[
    C { prefix: "PW4", names: &["power"], description: "Zone4 Power Command", values: POWER },
    C { prefix: "MT4", names: &["muting", "mute"], description: "Zone4 Muting Command", values: MUTING },
    C { prefix: "VL4", names: &["volume"], description: "Zone4 Volume Command", values: VOLUME },
    C { prefix: "SL4", names: &["selector"], description: "ZONE4 Selector Command", values: SELECTOR },
];

const DOCK: &[C] = &[
    C {
        prefix: "NRI",
        names: &["receiver-information"],
        description: "Receiver Information Command (XML)",
        values: QUERY_ONLY,
    },
    C {
        prefix: "NTC",
        names: &["network-usb", "net-usb"],
        description: "Network/USB Operation Command",
        values: &[
            V::Code("PLAY", &["play"], "PLAY KEY"),
            V::Code("STOP", &["stop"], "STOP KEY"),
            V::Code("PAUSE", &["pause"], "PAUSE KEY"),
            V::Code("TRUP", &["trup"], "TRACK UP KEY"),
            V::Code("TRDN", &["trdn"], "TRACK DOWN KEY"),
            V::Code("MENU", &["menu"], "MENU KEY"),
            V::Code("RETURN", &["return"], "RETURN KEY"),
        ],
    },
    C {
        prefix: "NST",
        names: &["net-usb-play-status"],
        description: "NET/USB Play Status",
        values: QUERY_ONLY,
    },
];

const ZONES: &[Z] = &[
    Z { name: "main", aliases: &["zone1"], commands: MAIN },
    Z { name: "zone2", aliases: &["z2"], commands: ZONE2 },
    Z { name: "zone3", aliases: &["z3"], commands: ZONE3 },
    Z { name: "zone4", aliases: &["z4"], commands: ZONE4 },
    Z { name: "dock", aliases: &["net"], commands: DOCK },
];

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

fn value(def: &V) -> ValueSpec {
    let (key, names, description) = match def {
        V::Code(code, names, description) => (ValueKey::Code(code.to_string()), owned(names), description),
        V::Range(start, end, description) => {
            (ValueKey::Range(ValueRange::new(*start, *end)), Vec::new(), description)
        }
        V::Pattern(pattern, description) => (ValueKey::Pattern(pattern.to_string()), Vec::new(), description),
    };
    ValueSpec {
        key,
        names,
        description: description.to_string(),
    }
}

pub(super) fn catalogue() -> Catalogue {
    let zones = ZONES
        .iter()
        .map(|z| {
            let commands = z
                .commands
                .iter()
                .map(|c| CommandSpec {
                    prefix: c.prefix.to_string(),
                    names: owned(c.names),
                    description: c.description.to_string(),
                    values: c.values.iter().map(value).collect(),
                })
                .collect();
            (build_zone(z.name, commands), owned(z.aliases))
        })
        .collect();
    Catalogue::from_zones(zones)
}
