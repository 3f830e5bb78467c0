//! Domain models that mirror the SQLite schema and get passed throughout the
//! TUI. These types stay light-weight data holders so the persistence layer
//! and the live-performance controller can share them without conversions.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
/// A named, user-owned collection of songs performed in a fixed order.
pub struct Repertoire {
    /// Primary key from the database.
    pub id: i64,
    /// User-facing display name.
    pub name: String,
    /// Optional free-form description shown under the name.
    pub description: Option<String>,
    /// Account that owns the repertoire. Listing queries always filter on it.
    pub owner_id: i64,
    /// Creation timestamp, used to list repertoires newest first.
    pub created_at: DateTime<Utc>,
}

impl fmt::Display for Repertoire {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Clone, PartialEq)]
/// One song inside a repertoire. `position` defines the traversal order and is
/// unique within the parent repertoire.
pub struct Song {
    pub id: i64,
    pub repertoire_id: i64,
    pub title: String,
    pub artist: Option<String>,
    pub key: Option<MusicalKey>,
    /// Chords and lyrics as typed by the user, newlines preserved.
    pub chord_text: Option<String>,
    pub notes: Option<String>,
    pub position: i64,
}

impl Song {
    /// Compose a `Title - Artist` string that omits the hyphen when the artist
    /// is unknown. List views and confirmation dialogs share this formatting.
    pub fn display_title(&self) -> String {
        match self.artist.as_deref() {
            Some(artist) => format!("{} - {}", self.title, artist),
            None => self.title.clone(),
        }
    }
}

/// Editable song attributes accepted by create/update operations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SongFields {
    pub title: String,
    pub artist: Option<String>,
    pub key: Option<MusicalKey>,
    pub chord_text: Option<String>,
    pub notes: Option<String>,
}

impl SongFields {
    /// Shorthand used by tests and seeding code.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Trim every text field and collapse blank optional values to `None` so
    /// the store never persists whitespace-only strings. Chord text keeps its
    /// inner layout; only trailing whitespace is dropped.
    pub fn normalized(&self) -> SongFields {
        SongFields {
            title: self.title.trim().to_string(),
            artist: non_blank(self.artist.as_deref()),
            key: self.key,
            chord_text: self
                .chord_text
                .as_deref()
                .map(str::trim_end)
                .filter(|text| !text.trim().is_empty())
                .map(str::to_string),
            notes: non_blank(self.notes.as_deref()),
        }
    }
}

/// Collapse an optional string to `None` when it is empty after trimming.
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

/// The fixed set of keys a song can be tagged with. Major keys include both
/// enharmonic spellings musicians commonly write on charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MusicalKey {
    C,
    CSharp,
    DFlat,
    D,
    DSharp,
    EFlat,
    E,
    F,
    FSharp,
    GFlat,
    G,
    GSharp,
    AFlat,
    A,
    ASharp,
    BFlat,
    B,
    CMinor,
    CSharpMinor,
    DMinor,
    DSharpMinor,
    EMinor,
    FMinor,
    FSharpMinor,
    GMinor,
    GSharpMinor,
    AMinor,
    ASharpMinor,
    BMinor,
}

impl MusicalKey {
    /// Every key in picker order: majors first, then minors.
    pub const ALL: [MusicalKey; 29] = [
        MusicalKey::C,
        MusicalKey::CSharp,
        MusicalKey::DFlat,
        MusicalKey::D,
        MusicalKey::DSharp,
        MusicalKey::EFlat,
        MusicalKey::E,
        MusicalKey::F,
        MusicalKey::FSharp,
        MusicalKey::GFlat,
        MusicalKey::G,
        MusicalKey::GSharp,
        MusicalKey::AFlat,
        MusicalKey::A,
        MusicalKey::ASharp,
        MusicalKey::BFlat,
        MusicalKey::B,
        MusicalKey::CMinor,
        MusicalKey::CSharpMinor,
        MusicalKey::DMinor,
        MusicalKey::DSharpMinor,
        MusicalKey::EMinor,
        MusicalKey::FMinor,
        MusicalKey::FSharpMinor,
        MusicalKey::GMinor,
        MusicalKey::GSharpMinor,
        MusicalKey::AMinor,
        MusicalKey::ASharpMinor,
        MusicalKey::BMinor,
    ];

    /// Chart label, e.g. `F#` or `Bm`.
    pub fn label(self) -> &'static str {
        match self {
            MusicalKey::C => "C",
            MusicalKey::CSharp => "C#",
            MusicalKey::DFlat => "Db",
            MusicalKey::D => "D",
            MusicalKey::DSharp => "D#",
            MusicalKey::EFlat => "Eb",
            MusicalKey::E => "E",
            MusicalKey::F => "F",
            MusicalKey::FSharp => "F#",
            MusicalKey::GFlat => "Gb",
            MusicalKey::G => "G",
            MusicalKey::GSharp => "G#",
            MusicalKey::AFlat => "Ab",
            MusicalKey::A => "A",
            MusicalKey::ASharp => "A#",
            MusicalKey::BFlat => "Bb",
            MusicalKey::B => "B",
            MusicalKey::CMinor => "Cm",
            MusicalKey::CSharpMinor => "C#m",
            MusicalKey::DMinor => "Dm",
            MusicalKey::DSharpMinor => "D#m",
            MusicalKey::EMinor => "Em",
            MusicalKey::FMinor => "Fm",
            MusicalKey::FSharpMinor => "F#m",
            MusicalKey::GMinor => "Gm",
            MusicalKey::GSharpMinor => "G#m",
            MusicalKey::AMinor => "Am",
            MusicalKey::ASharpMinor => "A#m",
            MusicalKey::BMinor => "Bm",
        }
    }

    pub fn is_minor(self) -> bool {
        self.label().ends_with('m')
    }

    /// Step through the picker list, wrapping at both ends. Used by the song
    /// form where the key field is a selector rather than free text.
    pub fn cycle(current: Option<MusicalKey>, forward: bool) -> Option<MusicalKey> {
        let len = Self::ALL.len();
        match current {
            None if forward => Some(Self::ALL[0]),
            None => Some(Self::ALL[len - 1]),
            Some(key) => {
                let index = Self::ALL.iter().position(|k| *k == key).unwrap_or(0);
                if forward && index + 1 == len {
                    None
                } else if !forward && index == 0 {
                    None
                } else if forward {
                    Some(Self::ALL[index + 1])
                } else {
                    Some(Self::ALL[index - 1])
                }
            }
        }
    }
}

impl fmt::Display for MusicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{0}' is not a recognised key")]
pub struct UnknownKey(pub String);

impl FromStr for MusicalKey {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        MusicalKey::ALL
            .iter()
            .copied()
            .find(|key| key.label() == trimmed)
            .ok_or_else(|| UnknownKey(trimmed.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq)]
/// A user's band. Each account owns at most one.
pub struct Band {
    pub id: i64,
    pub owner_id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BandMember {
    pub id: i64,
    pub band_id: i64,
    pub name: String,
    pub instrument: String,
}

impl fmt::Display for BandMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.instrument)
    }
}

#[derive(Debug, Clone, PartialEq)]
/// Public view of an account. Password material never leaves the identity
/// provider.
pub struct UserAccount {
    pub id: i64,
    pub email: String,
    pub display_name: String,
    pub email_confirmed: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_set_covers_twelve_minor_keys() {
        let minors = MusicalKey::ALL.iter().filter(|k| k.is_minor()).count();
        assert_eq!(minors, 12);
        assert_eq!(MusicalKey::ALL.len() - minors, 17);
    }

    #[test]
    fn key_labels_parse_back() {
        for key in MusicalKey::ALL {
            assert_eq!(key.label().parse::<MusicalKey>(), Ok(key));
        }
        assert!("H".parse::<MusicalKey>().is_err());
        assert!("cm".parse::<MusicalKey>().is_err());
    }

    #[test]
    fn key_cycle_wraps_through_none() {
        assert_eq!(MusicalKey::cycle(None, true), Some(MusicalKey::C));
        assert_eq!(MusicalKey::cycle(Some(MusicalKey::BMinor), true), None);
        assert_eq!(MusicalKey::cycle(Some(MusicalKey::C), false), None);
        assert_eq!(
            MusicalKey::cycle(Some(MusicalKey::C), true),
            Some(MusicalKey::CSharp)
        );
    }

    #[test]
    fn normalized_fields_drop_blank_values() {
        let fields = SongFields {
            title: "  Imagine ".into(),
            artist: Some("   ".into()),
            key: Some(MusicalKey::C),
            chord_text: Some("C   Am\n  F G  \n\n".into()),
            notes: Some(" fade out ".into()),
        };
        let normalized = fields.normalized();
        assert_eq!(normalized.title, "Imagine");
        assert_eq!(normalized.artist, None);
        assert_eq!(normalized.chord_text.as_deref(), Some("C   Am\n  F G"));
        assert_eq!(normalized.notes.as_deref(), Some("fade out"));
    }

    #[test]
    fn display_title_omits_missing_artist() {
        let mut song = Song {
            id: 1,
            repertoire_id: 1,
            title: "Imagine".into(),
            artist: None,
            key: None,
            chord_text: None,
            notes: None,
            position: 0,
        };
        assert_eq!(song.display_title(), "Imagine");
        song.artist = Some("John Lennon".into());
        assert_eq!(song.display_title(), "Imagine - John Lennon");
    }
}
