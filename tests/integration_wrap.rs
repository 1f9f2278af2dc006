use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};

use soulspace::config::{Config, CONFIG_FILE};
use soulspace::journal::{generate_id, JournalEntry};
use soulspace::mood::MoodCatalog;
use soulspace::renderer::md;
use soulspace::stats::{MoodWrapStats, Period};
use soulspace::stats_builder::{compute_stats, compute_stats_with};
use soulspace::store::{EntryStore, SqliteEntryStore};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap()
}

fn add(store: &SqliteEntryStore, mood_id: &str, day: u32, content: &str) -> Result<()> {
    let catalog = MoodCatalog::default();
    let mood = catalog.find(mood_id).cloned().unwrap();
    let ts = Utc.with_ymd_and_hms(2026, 10, day, 20, 0, 0).unwrap();
    let mut entry = JournalEntry::new(content, mood, ts);
    entry.id = generate_id(ts, &store.load()?);
    store.append(entry)
}

fn seeded_store(path: &std::path::Path) -> Result<SqliteEntryStore> {
    let store = SqliteEntryStore::open(path, MoodCatalog::default())?;
    add(&store, "anxious", 1, "Deadline week. Too many meetings and not enough sleep.")?;
    add(&store, "anxious", 2, "Still behind on the deadline, meetings everywhere.")?;
    add(&store, "anxious", 3, "Woke up worried about the presentation.")?;
    add(&store, "calm", 4, "Long walk in the park, phone off.")?;
    add(&store, "grateful", 5, "Grateful for friends who brought soup.")?;
    add(&store, "happy", 6, "Shipped the project! Dinner with friends.")?;
    add(&store, "happy", 7, "Morning run in the park with friends.")?;
    Ok(store)
}

#[test]
fn test_monthly_wrap_end_to_end() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let store = seeded_store(&dir.path().join("entries.sqlite"))?;

    let entries = store.load()?;
    assert_eq!(entries.len(), 7);
    // Newest first
    assert_eq!(entries[0].mood.id, "happy");

    let stats = compute_stats(&entries, Period::Monthly, &now());
    let monthly = stats.monthly().expect("monthly details");

    assert_eq!(stats.key, "2026-10");
    assert_eq!(stats.total_entries, 7);
    assert_eq!(stats.top_mood.as_ref().unwrap().id, "anxious");
    assert_eq!(stats.goal, "Try morning meditation or breathing exercises 🧘");
    assert_eq!(monthly.activity.longest_streak, 7);
    assert_eq!(monthly.activity.days_journaled, 7);
    assert_eq!(monthly.activity.word_cloud[0].word, "friends");

    let moment = monthly.transformation_moment.as_ref().expect("transformation");
    assert_eq!(moment.start_mood.id, "anxious");
    assert_eq!(moment.end_mood.id, "happy");

    // JSON round trip
    let json_path = dir.path().join("wrap.json");
    stats.save_to_file(&json_path)?;
    let loaded = MoodWrapStats::load_from_file(&json_path)?;
    assert_eq!(loaded, stats);

    // Markdown report from the loaded stats
    let report_path = dir.path().join(md::report_filename(&loaded));
    std::fs::write(&report_path, md::render(&loaded)?)?;
    let report = std::fs::read_to_string(&report_path)?;

    assert!(report_path.ends_with("soulspace-monthly-2026-10.md"));
    assert!(report.contains("You wrote **7** entries this month."));
    assert!(report.contains("### 🦋 Transformation"));

    Ok(())
}

#[test]
fn test_title_backfill_persists() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("entries.sqlite");
    let id = {
        let store = seeded_store(&path)?;
        let id = store.load()?[2].id.clone();
        assert!(store.backfill_title(&id, "A Turning Point")?);
        id
    };

    let store = SqliteEntryStore::open(&path, MoodCatalog::default())?;
    let entry = store.load()?.into_iter().find(|e| e.id == id).unwrap();
    assert_eq!(entry.title.as_deref(), Some("A Turning Point"));
    Ok(())
}

#[test]
fn test_config_thresholds_apply() -> Result<()> {
    let dir = tempfile::tempdir()?;
    std::fs::write(
        dir.path().join(CONFIG_FILE),
        r#"{ "thresholds": { "monthly_word_cloud_size": 2, "habit_insight_min_entries": 10 } }"#,
    )?;
    let config = Config::load_from(&dir.path().join(CONFIG_FILE))?;

    let store = seeded_store(&config.db_path(dir.path()))?;
    let stats = compute_stats_with(
        &store.load()?,
        Period::Monthly,
        &now(),
        &MoodCatalog::default(),
        &config.thresholds,
    );

    let monthly = stats.monthly().unwrap();
    assert_eq!(monthly.activity.word_cloud.len(), 2);
    assert_eq!(stats.insights, vec!["You've been feeling mostly anxious"]);
    Ok(())
}
