//! # Address Model
//!
//! The unit of input is a [`NormalizedLine`]: one address path from coarse
//! to fine, plus the source priority, a point and an optional note. Lines
//! come from text files written by the per-source converters:
//!
//! ```text
//! 東京都;1,渋谷区;3,道玄坂;5,一丁目;6,!03,139.6987,35.6575,aza_id:0001001
//! └──────────── elements (name;level) ──────┘ └┬┘ └─── x, y ───┘ └─ note ─┘
//!                                          priority
//! ```
//!
//! Names are compared through a [`Standardizer`], which folds spelling and
//! script variants into one canonical key.

mod line;
mod standardize;

use std::fmt;

pub use line::parse_line;
pub use standardize::{NfkcStandardizer, Standardizer};

use crate::config::{DEFAULT_PRIORITY, UNKNOWN_COORDINATE};

/// Rank of an address element, coarse to fine. Level 0 is the virtual root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AddressLevel(u8);

impl AddressLevel {
    pub const ROOT: Self = Self(0);
    pub const PREF: Self = Self(1);
    pub const COUNTY: Self = Self(2);
    pub const CITY: Self = Self(3);
    pub const WARD: Self = Self(4);
    pub const OAZA: Self = Self(5);
    pub const AZA: Self = Self(6);
    pub const BLOCK: Self = Self(7);
    pub const BLD: Self = Self(8);

    pub const MAX: Self = Self::BLD;

    /// Accepts `1..=MAX`; the root level never appears in input.
    pub fn from_u8(level: u8) -> Option<Self> {
        if (Self::PREF.0..=Self::MAX.0).contains(&level) {
            Some(Self(level))
        } else {
            None
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn label(self) -> &'static str {
        match self.0 {
            0 => "root",
            1 => "pref",
            2 => "county",
            3 => "city",
            4 => "ward",
            5 => "oaza",
            6 => "aza",
            7 => "block",
            _ => "bld",
        }
    }
}

impl fmt::Display for AddressLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressElement {
    pub name: String,
    pub level: AddressLevel,
}

impl AddressElement {
    pub fn new(name: &str, level: AddressLevel) -> Self {
        Self {
            name: name.to_string(),
            level,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedLine {
    pub elements: Vec<AddressElement>,
    pub priority: u8,
    pub x: f64,
    pub y: f64,
    pub note: String,
}

impl NormalizedLine {
    /// A line without a point, priority marker or note.
    pub fn new(elements: Vec<AddressElement>) -> Self {
        Self {
            elements,
            priority: DEFAULT_PRIORITY,
            x: UNKNOWN_COORDINATE,
            y: UNKNOWN_COORDINATE,
            note: String::new(),
        }
    }

    pub fn with_point(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_note(mut self, note: &str) -> Self {
        self.note = note.to_string();
        self
    }

    /// Sort key segments, `standardized_name;level` per element.
    pub fn key_segments(&self, standardizer: &dyn Standardizer) -> Vec<String> {
        self.elements
            .iter()
            .map(|e| format!("{};{}", standardizer.standardize(&e.name), e.level))
            .collect()
    }
}
