/// Journal entry data model.
use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::mood::Mood;

/// Placement of an entry in the 3D gallery. Presentation only.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    /// Scatter around the origin: x and y in [-2.5, 2.5), z in [-1, 1).
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            x: (rng.gen::<f64>() - 0.5) * 5.0,
            y: (rng.gen::<f64>() - 0.5) * 5.0,
            z: (rng.gen::<f64>() - 0.5) * 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Millisecond creation timestamp rendered as a string
    pub id: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub mood: Mood,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub position: Position,
}

impl JournalEntry {
    pub fn new(content: impl Into<String>, mood: Mood, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: timestamp.timestamp_millis().to_string(),
            content: content.into(),
            title: None,
            mood,
            timestamp,
            position: Position::default(),
        }
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    /// The only mutation an entry allows after creation.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    pub fn word_count(&self) -> usize {
        self.content.split_whitespace().count()
    }

    pub fn char_count(&self) -> usize {
        self.content.chars().count()
    }
}

/// First `max_chars` characters of `text`, with "..." when cut.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

/// Millisecond id for a new entry, bumped past any id already taken.
pub fn generate_id(timestamp: DateTime<Utc>, existing: &[JournalEntry]) -> String {
    let mut candidate = timestamp.timestamp_millis();
    while existing.iter().any(|e| e.id == candidate.to_string()) {
        candidate += 1;
    }
    candidate.to_string()
}

/// Order of an entry listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Newest first
    #[default]
    DateDesc,
    DateAsc,
    /// Alphabetical by mood name, case-insensitive
    Mood,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::DateDesc => "date-desc",
            SortOrder::DateAsc => "date-asc",
            SortOrder::Mood => "mood",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "date-desc" | "newest" => Ok(SortOrder::DateDesc),
            "date-asc" | "oldest" => Ok(SortOrder::DateAsc),
            "mood" => Ok(SortOrder::Mood),
            other => Err(anyhow!(
                "Unknown sort order '{}'. Expected: date-desc, date-asc or mood",
                other
            )),
        }
    }
}

/// Stable sort; entries that compare equal keep their stored order.
pub fn sort_entries(entries: &mut [JournalEntry], order: SortOrder) {
    match order {
        SortOrder::DateDesc => entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp)),
        SortOrder::DateAsc => entries.sort_by(|a, b| a.timestamp.cmp(&b.timestamp)),
        SortOrder::Mood => {
            entries.sort_by(|a, b| a.mood.name.to_lowercase().cmp(&b.mood.name.to_lowercase()))
        }
    }
}

/// Entries saved with the given mood id.
pub fn entries_with_mood<'a>(entries: &'a [JournalEntry], mood_id: &str) -> Vec<&'a JournalEntry> {
    entries.iter().filter(|e| e.mood.id == mood_id).collect()
}
