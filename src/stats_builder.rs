/// Statistics aggregation and generation module.
///
/// Filters a snapshot of journal entries into a period window and derives
/// the mood distribution, streaks, word frequencies, consistency and the
/// period highlights. Pure: "now" is a parameter and nothing is read from
/// disk or the clock.
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Weekday};
use indexmap::IndexMap;
use std::collections::BTreeSet;
use std::hash::Hash;

use crate::config::WrapThresholds;
use crate::journal::JournalEntry;
use crate::mood::{self, Mood, MoodCatalog};
use crate::stats::*;
use crate::timefmt;
use crate::window::PeriodWindow;

/// Positive moods, in peak-day preference order
const PEAK_DAY_MOODS: [&str; 4] = [mood::HAPPY, mood::CALM, mood::GRATEFUL, mood::EXCITED];

const POSITIVE_MOODS: [&str; 4] = [mood::HAPPY, mood::GRATEFUL, mood::EXCITED, mood::CALM];

const NEGATIVE_MOODS: [&str; 3] = [mood::SAD, mood::ANXIOUS, mood::OVERWHELMED];

const STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by", "i",
    "you", "he", "she", "it", "we", "they", "is", "are", "was", "were", "be", "been", "have",
    "has", "had", "do", "does", "did", "will", "would", "could", "should", "may", "might", "must",
    "can",
];

/// Words must be longer than this to reach the word cloud
const MIN_WORD_LEN: usize = 3;

// ============================================================================
// Intermediate structs (private, internal to stats_builder)
// ============================================================================

/// An entry together with its wall-clock time in now's time zone.
#[derive(Clone, Copy)]
struct LocalEntry<'a> {
    entry: &'a JournalEntry,
    local: NaiveDateTime,
}

impl<'a> LocalEntry<'a> {
    fn date(&self) -> NaiveDate {
        self.local.date()
    }

    fn mood_id(&self) -> &'a str {
        &self.entry.mood.id
    }
}

/// Fields every period shares.
struct BaseStats {
    total_entries: usize,
    top_mood: Option<Mood>,
    mood_breakdown: Vec<MoodShare>,
    peak_day: Option<PeakDay>,
    insights: Vec<String>,
    goal: String,
}

/// Longest run of consecutive journaled days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StreakRun {
    length: u32,
    start: NaiveDate,
    end: NaiveDate,
}

// ============================================================================
// Entry points
// ============================================================================

/// Compute the wrap for `period` with the default catalog and thresholds.
pub fn compute_stats<Tz: TimeZone>(
    entries: &[JournalEntry],
    period: Period,
    now: &DateTime<Tz>,
) -> MoodWrapStats {
    compute_stats_with(
        entries,
        period,
        now,
        &MoodCatalog::default(),
        &WrapThresholds::default(),
    )
}

/// Compute the wrap for `period`.
///
/// Entries are bucketed by their wall-clock time in `now`'s time zone.
/// Calling this twice with the same inputs gives equal results.
pub fn compute_stats_with<Tz: TimeZone>(
    entries: &[JournalEntry],
    period: Period,
    now: &DateTime<Tz>,
    catalog: &MoodCatalog,
    thresholds: &WrapThresholds,
) -> MoodWrapStats {
    let window = PeriodWindow::with_weekly_days(period, now, thresholds.weekly_days);
    let in_window = filter_window(entries, &window, &now.timezone());

    let mut chronological = in_window.clone();
    chronological.sort_by_key(|e| e.entry.timestamp);

    let base = build_base(&in_window, period, catalog, thresholds);

    let details = match period {
        Period::Weekly => PeriodDetails::Weekly,
        Period::Monthly => PeriodDetails::Monthly(build_monthly(
            &in_window,
            &chronological,
            &window,
            catalog,
            thresholds,
        )),
        Period::Yearly => PeriodDetails::Yearly(build_yearly(
            &in_window,
            &chronological,
            &base.mood_breakdown,
            catalog,
            thresholds,
        )),
    };

    MoodWrapStats {
        schema_version: SCHEMA_VERSION,
        key: window.key,
        generated_at: now.naive_local().format("%Y-%m-%d %H:%M:%S").to_string(),
        date_range: DateRange {
            start: window.start,
            end: window.end,
        },
        total_entries: base.total_entries,
        top_mood: base.top_mood,
        mood_breakdown: base.mood_breakdown,
        peak_day: base.peak_day,
        insights: base.insights,
        goal: base.goal,
        details,
    }
}

/// All-time share of every catalog mood, in catalog order, zero rows
/// included. Entries with unknown mood ids count towards the total only.
pub fn mood_distribution(entries: &[JournalEntry], catalog: &MoodCatalog) -> Vec<MoodShare> {
    let counts = count_by(entries.iter().map(|e| e.mood.id.as_str()));
    catalog
        .iter()
        .map(|mood| {
            let count = counts.get(mood.id.as_str()).copied().unwrap_or(0);
            MoodShare {
                mood: mood.clone(),
                count,
                percentage: percentage(count, entries.len()),
            }
        })
        .collect()
}

fn filter_window<'a, Tz: TimeZone>(
    entries: &'a [JournalEntry],
    window: &PeriodWindow,
    tz: &Tz,
) -> Vec<LocalEntry<'a>> {
    entries
        .iter()
        .map(|entry| LocalEntry {
            entry,
            local: entry.timestamp.with_timezone(tz).naive_local(),
        })
        .filter(|e| window.contains(e.local))
        .collect()
}

// ============================================================================
// Sections
// ============================================================================

fn build_base(
    entries: &[LocalEntry],
    period: Period,
    catalog: &MoodCatalog,
    thresholds: &WrapThresholds,
) -> BaseStats {
    let total_entries = entries.len();
    let counts = count_by(entries.iter().map(|e| e.mood_id()));
    let mood_breakdown = rank_moods(&counts, total_entries, catalog);

    // Ties resolve to the mood seen first, which the stable sort keeps on top
    let top_mood = mood_breakdown.first().map(|share| share.mood.clone());

    BaseStats {
        total_entries,
        peak_day: find_peak_day(entries, catalog),
        insights: build_insights(top_mood.as_ref(), total_entries, period, thresholds),
        goal: build_goal(top_mood.as_ref(), total_entries, period, thresholds),
        top_mood,
        mood_breakdown,
    }
}

fn build_activity(
    entries: &[LocalEntry],
    days_in_period: u32,
    word_cloud_size: usize,
) -> (ActivityStats, Option<StreakRun>) {
    let days: BTreeSet<NaiveDate> = entries.iter().map(|e| e.date()).collect();
    let days_journaled = days.len() as u32;
    let streak = longest_streak(&days);

    let activity = ActivityStats {
        total_words: entries.iter().map(|e| e.entry.word_count()).sum(),
        total_characters: entries.iter().map(|e| e.entry.char_count()).sum(),
        days_journaled,
        days_missed: days_in_period.saturating_sub(days_journaled),
        longest_streak: streak.map_or(0, |run| run.length),
        word_cloud: word_cloud(entries.iter().map(|e| e.entry.content.as_str()), word_cloud_size),
        consistency_score: consistency_score(days_journaled, days_in_period),
    };

    (activity, streak)
}

fn build_monthly(
    in_window: &[LocalEntry],
    chronological: &[LocalEntry],
    window: &PeriodWindow,
    catalog: &MoodCatalog,
    thresholds: &WrapThresholds,
) -> MonthlyStats {
    let (activity, _) = build_activity(
        in_window,
        window.days_in_month(),
        thresholds.monthly_word_cloud_size,
    );
    let day_of_week_breakdown = rank_weekdays(in_window);

    MonthlyStats {
        activity,
        most_active_day: day_of_week_breakdown.first().cloned(),
        day_of_week_breakdown,
        emotion_evolution: emotion_evolution(chronological),
        transformation_moment: find_transformation(chronological, catalog),
    }
}

fn build_yearly(
    in_window: &[LocalEntry],
    chronological: &[LocalEntry],
    mood_breakdown: &[MoodShare],
    catalog: &MoodCatalog,
    thresholds: &WrapThresholds,
) -> YearlyStats {
    let (activity, streak) = build_activity(
        in_window,
        thresholds.days_in_year,
        thresholds.yearly_word_cloud_size,
    );
    let percentile = percentile_for(activity.consistency_score.percentage);
    let months = bucket_months(chronological, catalog);

    YearlyStats {
        activity,
        streak_dates: streak.map(|run| StreakDates {
            start: run.start,
            end: run.end,
        }),
        top3_emotions: mood_breakdown.iter().take(3).cloned().collect(),
        most_transformative_month: busiest_month(&months),
        peak_happiness_month: month_with_most(&months, &POSITIVE_MOODS, 0),
        hardest_month: month_with_most(
            &months,
            &NEGATIVE_MOODS,
            thresholds.hardest_month_min_entries,
        ),
        monthly_breakdown: months,
        gratitude_count: in_window
            .iter()
            .filter(|e| e.mood_id() == mood::GRATEFUL)
            .count(),
        most_reflective_entry: longest_entry(in_window),
        emotional_growth: find_emotional_growth(chronological, catalog),
        percentile,
    }
}

// ============================================================================
// Base helpers
// ============================================================================

/// Count occurrences, remembering first-seen order.
fn count_by<K: Hash + Eq>(items: impl IntoIterator<Item = K>) -> IndexMap<K, usize> {
    let mut counts = IndexMap::new();
    for item in items {
        *counts.entry(item).or_insert(0) += 1;
    }
    counts
}

/// Highest count; the earliest key wins ties.
fn dominant<K: Hash + Eq + Copy>(counts: &IndexMap<K, usize>) -> Option<K> {
    let mut best: Option<(K, usize)> = None;
    for (key, count) in counts {
        if best.map_or(true, |(_, max)| *count > max) {
            best = Some((*key, *count));
        }
    }
    best.map(|(key, _)| key)
}

fn dominant_mood_id<'a>(ids: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    dominant(&count_by(ids))
}

fn percentage(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    (part as f64 / whole as f64 * 100.0).round() as u32
}

/// Catalog moods by count descending. Unknown ids are left out.
fn rank_moods(
    counts: &IndexMap<&str, usize>,
    total_entries: usize,
    catalog: &MoodCatalog,
) -> Vec<MoodShare> {
    let mut shares: Vec<MoodShare> = counts
        .iter()
        .filter_map(|(id, count)| {
            catalog.find(id).map(|mood| MoodShare {
                mood: mood.clone(),
                count: *count,
                percentage: percentage(*count, total_entries),
            })
        })
        .collect();

    shares.sort_by(|a, b| b.count.cmp(&a.count));
    shares
}

/// First entry whose mood is the most preferred positive mood present.
fn find_peak_day(entries: &[LocalEntry], catalog: &MoodCatalog) -> Option<PeakDay> {
    let rank = |id: &str| PEAK_DAY_MOODS.iter().position(|m| *m == id);

    let (_, best) = entries
        .iter()
        .filter_map(|e| rank(e.mood_id()).map(|r| (r, e)))
        .min_by_key(|(r, _)| *r)?;

    let mood = catalog
        .find(best.mood_id())
        .cloned()
        .unwrap_or_else(|| best.entry.mood.clone());

    Some(PeakDay {
        date: best.date(),
        mood,
        entry: best.entry.clone(),
    })
}

fn build_insights(
    top_mood: Option<&Mood>,
    total_entries: usize,
    period: Period,
    thresholds: &WrapThresholds,
) -> Vec<String> {
    let mut insights = Vec::new();

    if let Some(top) = top_mood {
        let insight = match top.id.as_str() {
            mood::CALM => format!("You've been finding your center {} 🌊", period.this_phrase()),
            mood::HAPPY => "Joy has been your companion ✨".to_string(),
            mood::GRATEFUL => "Gratitude is flowing through you 🙏".to_string(),
            mood::REFLECTIVE => "You're taking time to understand yourself 🤔".to_string(),
            _ => format!("You've been feeling mostly {}", top.name.to_lowercase()),
        };
        insights.push(insight);
    }

    if total_entries >= thresholds.habit_insight_min_entries {
        insights.push("You're building a beautiful journaling habit 📔".to_string());
    }

    insights
}

fn build_goal(
    top_mood: Option<&Mood>,
    total_entries: usize,
    period: Period,
    thresholds: &WrapThresholds,
) -> String {
    match top_mood.map(|m| m.id.as_str()) {
        Some(mood::ANXIOUS) | Some(mood::OVERWHELMED) => {
            "Try morning meditation or breathing exercises 🧘".to_string()
        }
        Some(mood::SAD) => "Consider reaching out to someone you trust 💙".to_string(),
        _ if total_entries < thresholds.consistency_goal_min_entries => format!(
            "Aim for {} entries {} to build consistency 📝",
            thresholds.consistency_goal_min_entries,
            period.this_phrase()
        ),
        _ => "Keep writing! Every entry matters 💫".to_string(),
    }
}

// ============================================================================
// Activity helpers
// ============================================================================

/// Lowercased words longer than three characters, stopwords removed.
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .filter(|word| word.chars().count() > MIN_WORD_LEN && !STOPWORDS.contains(&word.as_str()))
}

/// Most frequent words across `texts`, count descending, first-seen order on
/// ties.
pub fn word_cloud<'a>(texts: impl IntoIterator<Item = &'a str>, limit: usize) -> Vec<WordCount> {
    let counts = count_by(texts.into_iter().flat_map(tokenize));

    let mut words: Vec<WordCount> = counts
        .into_iter()
        .map(|(word, count)| WordCount { word, count })
        .collect();
    words.sort_by(|a, b| b.count.cmp(&a.count));
    words.truncate(limit);
    words
}

/// Longest run of consecutive days; the earliest run wins ties.
fn longest_streak(days: &BTreeSet<NaiveDate>) -> Option<StreakRun> {
    let mut best: Option<StreakRun> = None;
    let mut current: Option<StreakRun> = None;

    for &day in days {
        current = match current {
            Some(run) if run.end.succ_opt() == Some(day) => Some(StreakRun {
                length: run.length + 1,
                end: day,
                ..run
            }),
            _ => Some(StreakRun {
                length: 1,
                start: day,
                end: day,
            }),
        };

        if let Some(run) = current {
            if best.map_or(true, |b| run.length > b.length) {
                best = Some(run);
            }
        }
    }

    best
}

fn consistency_score(days_journaled: u32, days_in_period: u32) -> ConsistencyScore {
    let pct = percentage(days_journaled as usize, days_in_period as usize).min(100);
    ConsistencyScore {
        grade: consistency_grade(pct).to_string(),
        percentage: pct,
    }
}

/// Letter grade for a consistency percentage.
pub fn consistency_grade(pct: u32) -> &'static str {
    match pct {
        90.. => "A+",
        85..=89 => "A",
        80..=84 => "A-",
        75..=79 => "B+",
        70..=74 => "B",
        65..=69 => "B-",
        60..=64 => "C+",
        55..=59 => "C",
        50..=54 => "C-",
        40..=49 => "D",
        _ => "F",
    }
}

/// Coarse "top N%" bucket for a yearly consistency percentage.
pub fn percentile_for(pct: u32) -> u32 {
    match pct {
        80.. => 15,
        60..=79 => 30,
        40..=59 => 50,
        _ => 75,
    }
}

// ============================================================================
// Monthly helpers
// ============================================================================

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Sun => "Sunday",
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
    }
}

fn rank_weekdays(entries: &[LocalEntry]) -> Vec<DayCount> {
    let counts = count_by(entries.iter().map(|e| weekday_name(e.date().weekday())));

    let mut days: Vec<DayCount> = counts
        .into_iter()
        .map(|(day, count)| DayCount {
            day: day.to_string(),
            count,
        })
        .collect();
    days.sort_by(|a, b| b.count.cmp(&a.count));
    days
}

/// Dominant mood per journaled day, oldest day first.
fn emotion_evolution(chronological: &[LocalEntry]) -> Vec<EmotionPoint> {
    let mut by_day: IndexMap<NaiveDate, Vec<&str>> = IndexMap::new();
    for e in chronological {
        by_day.entry(e.date()).or_default().push(e.mood_id());
    }

    by_day
        .into_iter()
        .filter_map(|(date, ids)| {
            dominant_mood_id(ids).map(|id| EmotionPoint {
                date,
                label: timefmt::short_date(date),
                mood: id.to_string(),
            })
        })
        .collect()
}

/// First and last quarter of a chronological list, each ceil(n/4) long.
fn quarters<'s, 'a>(
    chronological: &'s [LocalEntry<'a>],
) -> Option<(&'s [LocalEntry<'a>], &'s [LocalEntry<'a>])> {
    if chronological.is_empty() {
        return None;
    }
    let size = chronological.len().div_ceil(4);
    Some((
        &chronological[..size],
        &chronological[chronological.len() - size..],
    ))
}

/// Dominant moods of the first and last quarter, when both are catalog moods.
fn quarter_moods<'s, 'a>(
    chronological: &'s [LocalEntry<'a>],
    catalog: &MoodCatalog,
) -> Option<(&'s [LocalEntry<'a>], &'s [LocalEntry<'a>], Mood, Mood)> {
    let (first, last) = quarters(chronological)?;
    let start_id = dominant_mood_id(first.iter().map(|e| e.mood_id()))?;
    let end_id = dominant_mood_id(last.iter().map(|e| e.mood_id()))?;
    let start_mood = catalog.find(start_id)?.clone();
    let end_mood = catalog.find(end_id)?.clone();
    Some((first, last, start_mood, end_mood))
}

fn find_transformation(
    chronological: &[LocalEntry],
    catalog: &MoodCatalog,
) -> Option<TransformationMoment> {
    if chronological.len() < 2 {
        return None;
    }
    let (first, last, start_mood, end_mood) = quarter_moods(chronological, catalog)?;
    if start_mood.id == end_mood.id {
        return None;
    }

    Some(TransformationMoment {
        start_date: first.first()?.entry.timestamp,
        end_date: last.last()?.entry.timestamp,
        start_mood,
        end_mood,
    })
}

// ============================================================================
// Yearly helpers
// ============================================================================

/// Calendar months that have entries, oldest first.
fn bucket_months(chronological: &[LocalEntry], catalog: &MoodCatalog) -> Vec<MonthBucket> {
    let mut by_month: IndexMap<(i32, u32), (NaiveDate, Vec<&LocalEntry>)> = IndexMap::new();
    for e in chronological {
        let date = e.date();
        by_month
            .entry((date.year(), date.month()))
            .or_insert_with(|| (date, Vec::new()))
            .1
            .push(e);
    }

    by_month
        .into_values()
        .map(|(date, month_entries)| {
            let top_mood = dominant_mood_id(month_entries.iter().map(|e| e.mood_id()))
                .and_then(|id| catalog.find(id).cloned());
            MonthBucket {
                month: timefmt::month_label(date),
                key: date.format("%Y-%m").to_string(),
                entries: month_entries.iter().map(|e| e.entry.clone()).collect(),
                top_mood,
            }
        })
        .collect()
}

/// Month with the most entries, only when more than one month has entries.
fn busiest_month(months: &[MonthBucket]) -> Option<MonthBucket> {
    if months.len() < 2 {
        return None;
    }

    let mut best: Option<&MonthBucket> = None;
    for month in months {
        if best.map_or(true, |b| month.entries.len() > b.entries.len()) {
            best = Some(month);
        }
    }
    best.cloned()
}

/// Month with the most entries in `group` (at least one), among months with
/// at least `min_entries` entries. Earlier months win ties.
fn month_with_most(
    months: &[MonthBucket],
    group: &[&str],
    min_entries: usize,
) -> Option<MonthMoodCount> {
    let mut best: Option<(&MonthBucket, usize)> = None;

    for month in months {
        if month.entries.len() < min_entries {
            continue;
        }
        let count = month
            .entries
            .iter()
            .filter(|e| group.contains(&e.mood.id.as_str()))
            .count();
        if count > best.map_or(0, |(_, max)| max) {
            best = Some((month, count));
        }
    }

    best.map(|(month, count)| MonthMoodCount {
        month: month.month.clone(),
        key: month.key.clone(),
        entries: month.entries.clone(),
        count,
    })
}

/// Entry with the most characters; the earliest in the window wins ties.
fn longest_entry(entries: &[LocalEntry]) -> Option<JournalEntry> {
    let mut longest: Option<&JournalEntry> = None;
    for e in entries {
        if longest.map_or(true, |l| e.entry.char_count() > l.char_count()) {
            longest = Some(e.entry);
        }
    }
    longest.filter(|e| !e.content.is_empty()).cloned()
}

fn find_emotional_growth(
    chronological: &[LocalEntry],
    catalog: &MoodCatalog,
) -> Option<EmotionalGrowth> {
    let (_, _, start_mood, end_mood) = quarter_moods(chronological, catalog)?;
    Some(EmotionalGrowth {
        start_mood,
        end_mood,
    })
}
