use crate::note::REST;

/// One step of a melody: a note token held for `duration_ms`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MelodyEntry<'a> {
    pub token: &'a str,
    pub duration_ms: u32,
}

impl<'a> MelodyEntry<'a> {
    pub const fn new(token: &'a str, duration_ms: u32) -> Self {
        Self { token, duration_ms }
    }

    pub const fn rest(duration_ms: u32) -> Self {
        Self::new(REST, duration_ms)
    }
}

/// An ordered list of entries, played front to back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Melody<'a> {
    entries: &'a [MelodyEntry<'a>],
}

impl<'a> Melody<'a> {
    pub const fn new(entries: &'a [MelodyEntry<'a>]) -> Self {
        Self { entries }
    }

    pub const fn entries(&self) -> &'a [MelodyEntry<'a>] {
        self.entries
    }

    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Time `play` blocks for, in milliseconds
    pub fn total_duration_ms(&self) -> u64 {
        self.entries.iter().map(|e| u64::from(e.duration_ms)).sum()
    }
}

/// Three one-second beeps separated by short rests
pub const ALARM: Melody<'static> = Melody::new(ALARM_ENTRIES);

const ALARM_ENTRIES: &[MelodyEntry<'static>] = &[
    MelodyEntry::new("C7", 1000),
    MelodyEntry::rest(100),
    MelodyEntry::new("C7", 1000),
    MelodyEntry::rest(100),
    MelodyEntry::new("C7", 1000),
];

// Happy birthday, tempo 140: quarter = 428 ms, eighth = 214 ms, dotted notes x1.5
// https://musescore.com/user/8221/scores/26906
pub const HAPPY_BIRTHDAY: Melody<'static> = Melody::new(HAPPY_BIRTHDAY_ENTRIES);

const HAPPY_BIRTHDAY_ENTRIES: &[MelodyEntry<'static>] = &[
    MelodyEntry::new("C4", 428),
    MelodyEntry::new("C4", 214),
    MelodyEntry::new("D4", 642),
    MelodyEntry::new("C4", 642),
    MelodyEntry::new("F4", 642),
    MelodyEntry::new("E4", 1285),
    MelodyEntry::new("C4", 428),
    MelodyEntry::new("C4", 214),
    MelodyEntry::new("D4", 642),
    MelodyEntry::new("C4", 642),
    MelodyEntry::new("G4", 642),
    MelodyEntry::new("F4", 1285),
    MelodyEntry::new("C4", 428),
    MelodyEntry::new("C4", 214),
    MelodyEntry::new("C5", 642),
    MelodyEntry::new("A4", 642),
    MelodyEntry::new("F4", 642),
    MelodyEntry::new("E4", 642),
    MelodyEntry::new("D4", 642),
    MelodyEntry::new("A4#", 428),
    MelodyEntry::new("A4#", 214),
    MelodyEntry::new("A4", 642),
    MelodyEntry::new("F4", 642),
    MelodyEntry::new("G4", 642),
    MelodyEntry::new("F4", 1285),
];

/// Names accepted by [`preset`]
pub const PRESET_NAMES: &[&str] = &["alarm", "happy-birthday"];

/// Looks up a built-in melody by name
pub fn preset(name: &str) -> Option<Melody<'static>> {
    match name {
        "alarm" => Some(ALARM),
        "happy-birthday" => Some(HAPPY_BIRTHDAY),
        _ => None,
    }
}
