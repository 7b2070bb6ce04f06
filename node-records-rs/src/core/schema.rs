//! Column naming for node record logs.
//!
//! A bank carries one `Time` column followed by a channel triple
//! (`Exp{i}`, `Prim{i}`, `Sec{i}`) for every leaf `i` in `1..=60`. Once the
//! banks are separated, every channel column is prefixed with its bank letter
//! (`AExp1`, `BPrim37`, ...).

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Number of leaves tracked per bank.
pub const LEAF_COUNT: usize = 60;

/// Label of the shared time column.
pub const TIME_COLUMN: &str = "Time";

/// One of the two measurement banks in a node record file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Bank {
    A,
    B,
}

impl Bank {
    /// Banks in file order.
    pub const ALL: [Bank; 2] = [Bank::A, Bank::B];

    /// Prefix letter used in renamed columns.
    pub fn letter(self) -> char {
        match self {
            Bank::A => 'A',
            Bank::B => 'B',
        }
    }

    fn from_letter(letter: &str) -> Option<Self> {
        match letter {
            "A" => Some(Bank::A),
            "B" => Some(Bank::B),
            _ => None,
        }
    }
}

impl fmt::Display for Bank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Which of the three redundant position readings a column holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelKind {
    /// Expected (planned) position
    Exp,
    /// Primary sensor reading
    Prim,
    /// Secondary sensor reading
    Sec,
}

impl ChannelKind {
    /// Kinds in the order they appear within a channel triple.
    pub const ALL: [ChannelKind; 3] = [ChannelKind::Exp, ChannelKind::Prim, ChannelKind::Sec];

    pub fn as_str(self) -> &'static str {
        match self {
            ChannelKind::Exp => "Exp",
            ChannelKind::Prim => "Prim",
            ChannelKind::Sec => "Sec",
        }
    }

    /// Position of this kind within a channel triple.
    pub fn offset(self) -> usize {
        match self {
            ChannelKind::Exp => 0,
            ChannelKind::Prim => 1,
            ChannelKind::Sec => 2,
        }
    }

    fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "Exp" => Some(ChannelKind::Exp),
            "Prim" => Some(ChannelKind::Prim),
            "Sec" => Some(ChannelKind::Sec),
            _ => None,
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The (Exp, Prim, Sec) column triple of one leaf in one bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Channel {
    pub bank: Bank,
    /// 1-based leaf index
    pub leaf: usize,
}

impl Channel {
    pub fn new(bank: Bank, leaf: usize) -> Self {
        Self { bank, leaf }
    }

    /// All channels in output order: bank A leaves 1..=60, then bank B.
    pub fn all() -> impl Iterator<Item = Channel> {
        Bank::ALL
            .into_iter()
            .flat_map(|bank| (1..=LEAF_COUNT).map(move |leaf| Channel::new(bank, leaf)))
    }

    /// Bank-prefixed label for one column of this channel, e.g. `BPrim37`.
    pub fn column(&self, kind: ChannelKind) -> String {
        bank_column_name(self.bank, kind, self.leaf)
    }

    /// The three bank-prefixed labels of this channel in triple order.
    pub fn columns(&self) -> [String; 3] {
        ChannelKind::ALL.map(|kind| self.column(kind))
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.bank, self.leaf)
    }
}

/// Raw device label, e.g. `Prim37`.
pub fn raw_column_name(kind: ChannelKind, leaf: usize) -> String {
    format!("{}{}", kind.as_str(), leaf)
}

/// Bank-prefixed label, e.g. `APrim37`.
pub fn bank_column_name(bank: Bank, kind: ChannelKind, leaf: usize) -> String {
    format!("{}{}{}", bank.letter(), kind.as_str(), leaf)
}

/// Raw labels of one bank in canonical order, excluding `Time`.
pub fn raw_channel_columns() -> Vec<(ChannelKind, usize, String)> {
    (1..=LEAF_COUNT)
        .flat_map(|leaf| {
            ChannelKind::ALL
                .into_iter()
                .map(move |kind| (kind, leaf, raw_column_name(kind, leaf)))
        })
        .collect()
}

/// A parsed channel column label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLabel {
    pub bank: Option<Bank>,
    pub kind: ChannelKind,
    pub leaf: usize,
}

fn label_regex() -> Option<&'static Regex> {
    static LABEL: OnceLock<Option<Regex>> = OnceLock::new();
    LABEL
        .get_or_init(|| Regex::new(r"^(?P<bank>[AB])?(?P<kind>Exp|Prim|Sec)(?P<leaf>[0-9]{1,2})$").ok())
        .as_ref()
}

/// Parse a channel column label with an optional bank prefix.
///
/// Returns `None` for labels outside the convention, including decoy
/// columns such as `CarExp` and leaf indices outside `1..=60`.
pub fn parse_column_label(label: &str) -> Option<ColumnLabel> {
    let caps = label_regex()?.captures(label.trim())?;
    let leaf: usize = caps.name("leaf")?.as_str().parse().ok()?;
    if !(1..=LEAF_COUNT).contains(&leaf) {
        return None;
    }
    let kind = ChannelKind::from_str_opt(caps.name("kind")?.as_str())?;
    let bank = match caps.name("bank") {
        Some(m) => Some(Bank::from_letter(m.as_str())?),
        None => None,
    };
    Some(ColumnLabel { bank, kind, leaf })
}
