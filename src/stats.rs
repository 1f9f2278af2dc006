use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

#[cfg(test)]
use anyhow::bail;
#[cfg(test)]
use jsonschema::{Draft, JSONSchema};

use crate::journal::JournalEntry;
use crate::mood::Mood;

pub const SCHEMA_VERSION: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Weekly,
    Monthly,
    Yearly,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Weekly => "weekly",
            Period::Monthly => "monthly",
            Period::Yearly => "yearly",
        }
    }

    /// "this week", "this month", "this year"
    pub fn this_phrase(&self) -> &'static str {
        match self {
            Period::Weekly => "this week",
            Period::Monthly => "this month",
            Period::Yearly => "this year",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weekly" | "week" => Ok(Period::Weekly),
            "monthly" | "month" => Ok(Period::Monthly),
            "yearly" | "year" => Ok(Period::Yearly),
            other => Err(anyhow!(
                "Unknown period '{}'. Expected: weekly, monthly or yearly",
                other
            )),
        }
    }
}

/// Mood wrap statistics for one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodWrapStats {
    pub schema_version: i32,
    pub key: String,
    pub generated_at: String,
    pub date_range: DateRange,
    pub total_entries: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_mood: Option<Mood>,
    pub mood_breakdown: Vec<MoodShare>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peak_day: Option<PeakDay>,
    pub insights: Vec<String>,
    pub goal: String,
    pub details: PeriodDetails,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodDetails {
    Weekly,
    Monthly(MonthlyStats),
    Yearly(YearlyStats),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodShare {
    pub mood: Mood,
    pub count: usize,
    pub percentage: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakDay {
    pub date: NaiveDate,
    pub mood: Mood,
    pub entry: JournalEntry,
}

/// Totals shared by the monthly and yearly wraps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityStats {
    pub total_words: usize,
    pub total_characters: usize,
    pub days_journaled: u32,
    pub days_missed: u32,
    pub longest_streak: u32,
    pub word_cloud: Vec<WordCount>,
    pub consistency_score: ConsistencyScore,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordCount {
    pub word: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyScore {
    pub grade: String,
    pub percentage: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayCount {
    pub day: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionPoint {
    pub date: NaiveDate,
    /// Short label, e.g. "Oct 5"
    pub label: String,
    pub mood: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformationMoment {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub start_mood: Mood,
    pub end_mood: Mood,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyStats {
    #[serde(flatten)]
    pub activity: ActivityStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub most_active_day: Option<DayCount>,
    pub day_of_week_breakdown: Vec<DayCount>,
    pub emotion_evolution: Vec<EmotionPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transformation_moment: Option<TransformationMoment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreakDates {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthBucket {
    /// Display label, e.g. "October 2026"
    pub month: String,
    /// Sortable key, e.g. "2026-10"
    pub key: String,
    pub entries: Vec<JournalEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_mood: Option<Mood>,
}

/// A month singled out by how many of its entries fall in a mood group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthMoodCount {
    pub month: String,
    pub key: String,
    pub entries: Vec<JournalEntry>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionalGrowth {
    pub start_mood: Mood,
    pub end_mood: Mood,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyStats {
    #[serde(flatten)]
    pub activity: ActivityStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub streak_dates: Option<StreakDates>,
    pub top3_emotions: Vec<MoodShare>,
    pub monthly_breakdown: Vec<MonthBucket>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub most_transformative_month: Option<MonthBucket>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peak_happiness_month: Option<MonthMoodCount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hardest_month: Option<MonthMoodCount>,
    pub gratitude_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub most_reflective_entry: Option<JournalEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emotional_growth: Option<EmotionalGrowth>,
    /// Coarse standing bucket; smaller is better
    pub percentile: u32,
}

impl MoodWrapStats {
    pub fn period(&self) -> Period {
        match self.details {
            PeriodDetails::Weekly => Period::Weekly,
            PeriodDetails::Monthly(_) => Period::Monthly,
            PeriodDetails::Yearly(_) => Period::Yearly,
        }
    }

    pub fn monthly(&self) -> Option<&MonthlyStats> {
        match &self.details {
            PeriodDetails::Monthly(monthly) => Some(monthly),
            _ => None,
        }
    }

    pub fn yearly(&self) -> Option<&YearlyStats> {
        match &self.details {
            PeriodDetails::Yearly(yearly) => Some(yearly),
            _ => None,
        }
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read stats file: {}", path.display()))?;

        let stats: MoodWrapStats = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON from: {}", path.display()))?;

        Ok(stats)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).context("Failed to serialize stats to JSON")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write stats file: {}", path.display()))?;
        Ok(())
    }

    #[cfg(test)]
    /// Validate stats JSON against the JSON schema
    pub fn validate_with_schema(stats_json: &serde_json::Value, schema: &JSONSchema) -> Result<()> {
        match schema.validate(stats_json) {
            Ok(_) => Ok(()),
            Err(errors) => {
                let error_messages: Vec<String> = errors
                    .map(|e| format!("  - {}: {}", e.instance_path, e))
                    .collect();
                bail!("Stats validation failed:\n{}", error_messages.join("\n"))
            }
        }
    }

    #[cfg(test)]
    /// Load and compile the JSON schema
    pub fn load_schema(schema_path: &Path) -> Result<JSONSchema> {
        let schema_content = std::fs::read_to_string(schema_path)
            .with_context(|| format!("Failed to read schema file: {}", schema_path.display()))?;

        let schema_json: serde_json::Value =
            serde_json::from_str(&schema_content).with_context(|| {
                format!(
                    "Failed to parse schema JSON from: {}",
                    schema_path.display()
                )
            })?;

        JSONSchema::options()
            .with_draft(Draft::Draft7)
            .compile(&schema_json)
            .map_err(|e| anyhow!("Failed to compile JSON schema: {}", e))
    }
}
