use crate::journal::{excerpt, JournalEntry};
use crate::mood::Mood;
use crate::stats::*;
use crate::timefmt;
use anyhow::Result;

/// Characters of an entry quoted in the report
const QUOTE_CHARS: usize = 280;

/// Render a mood wrap to Markdown
pub fn render(stats: &MoodWrapStats) -> Result<String> {
    let mut output = String::new();
    let period = stats.period();

    // 1. Title and date range
    render_header(&mut output, stats);

    // 2. Entry count; an empty period ends here with its goal
    render_entry_count(&mut output, stats);
    if stats.total_entries == 0 {
        render_goal(&mut output, &stats.goal);
        return Ok(output);
    }

    // 3. Top emotion and breakdown
    if let Some(ref top) = stats.top_mood {
        render_top_mood(&mut output, top, period);
    }
    render_breakdown(&mut output, &stats.mood_breakdown);

    // 4. Period details
    match &stats.details {
        PeriodDetails::Weekly => {}
        PeriodDetails::Monthly(monthly) => render_monthly(&mut output, monthly),
        PeriodDetails::Yearly(yearly) => render_yearly(&mut output, yearly),
    }

    // 5. Peak moment
    if let Some(ref peak) = stats.peak_day {
        render_peak_day(&mut output, peak);
    }

    // 6. Insights and goal
    render_insights(&mut output, &stats.insights);
    render_goal(&mut output, &stats.goal);

    Ok(output)
}

/// File name for a rendered report, e.g. `soulspace-monthly-2026-10.md`
pub fn report_filename(stats: &MoodWrapStats) -> String {
    format!("soulspace-{}-{}.md", stats.period(), stats.key)
}

fn render_header(output: &mut String, stats: &MoodWrapStats) {
    output.push_str(&format!("# 🌙 Your {}\n", period_label(stats)));
    output.push_str(&format!(
        "*{} to {}*\n\n",
        timefmt::long_date(stats.date_range.start.date()),
        timefmt::long_date(stats.date_range.end.date())
    ));
}

fn render_entry_count(output: &mut String, stats: &MoodWrapStats) {
    let phrase = stats.period().this_phrase();
    output.push_str("### 📔 Entries\n");
    match stats.total_entries {
        0 => output.push_str(&format!(
            "No entries {} yet. Every story starts with a single line.\n\n",
            phrase
        )),
        1 => output.push_str(&format!("You wrote **1** entry {}.\n\n", phrase)),
        n => output.push_str(&format!(
            "You wrote **{}** entries {}.\n\n",
            format_number(n),
            phrase
        )),
    }
}

fn render_top_mood(output: &mut String, top: &Mood, period: Period) {
    output.push_str("### 💫 Top Emotion\n");
    output.push_str(&format!(
        "{} you felt mostly **{}**.\n",
        uppercase_first_char(period.this_phrase()),
        top.label()
    ));
    if let Some(ref description) = top.description {
        output.push_str(&format!("*{}*\n", description));
    }
    output.push('\n');
}

fn render_breakdown(output: &mut String, breakdown: &[MoodShare]) {
    if breakdown.is_empty() {
        return;
    }

    output.push_str("### 🎨 Mood Breakdown\n");
    output.push_str("| Mood | Entries | Share |\n");
    output.push_str("| ---- | ------- | ----- |\n");
    for share in breakdown {
        output.push_str(&format!(
            "| {} | {} | {}% |\n",
            share.mood.label(),
            format_number(share.count),
            share.percentage
        ));
    }
    output.push('\n');
}

fn render_numbers(output: &mut String, title: &str, activity: &ActivityStats) {
    output.push_str(&format!("### 🔢 {}\n", title));
    output.push_str(&format!(
        "- ✍️ **Words written:** {}\n",
        format_number(activity.total_words)
    ));
    output.push_str(&format!(
        "- 🔤 **Characters:** {}\n",
        format_number(activity.total_characters)
    ));
    output.push_str(&format!(
        "- 📅 **Days journaled:** {}\n",
        activity.days_journaled
    ));
    output.push_str(&format!("- 💤 **Days missed:** {}\n", activity.days_missed));
    output.push_str(&format!(
        "- 🔥 **Longest streak:** {} {}\n",
        activity.longest_streak,
        plural(activity.longest_streak as usize, "day", "days")
    ));
    output.push_str(&format!(
        "- 🏅 **Consistency:** {} ({}% of days)\n",
        activity.consistency_score.grade, activity.consistency_score.percentage
    ));
    output.push('\n');
}

fn render_word_cloud(output: &mut String, words: &[WordCount]) {
    if words.is_empty() {
        return;
    }

    output.push_str("### ☁️ Your Words\n");
    let cloud: Vec<String> = words
        .iter()
        .map(|w| format!("**{}** ({})", w.word, w.count))
        .collect();
    output.push_str(&cloud.join(" · "));
    output.push_str("\n\n");
}

fn render_monthly(output: &mut String, monthly: &MonthlyStats) {
    render_numbers(output, "This Month in Numbers", &monthly.activity);

    if let Some(ref day) = monthly.most_active_day {
        output.push_str("### 🗓️ Most Active Day\n");
        output.push_str(&format!(
            "You wrote most on **{}s** ({} {}).\n\n",
            day.day,
            day.count,
            plural(day.count, "entry", "entries")
        ));
    }

    render_word_cloud(output, &monthly.activity.word_cloud);

    if !monthly.emotion_evolution.is_empty() {
        output.push_str("### 🌈 Emotion Timeline\n");
        for point in &monthly.emotion_evolution {
            output.push_str(&format!("- **{}:** {}\n", point.label, point.mood));
        }
        output.push('\n');
    }

    if let Some(ref moment) = monthly.transformation_moment {
        output.push_str("### 🦋 Transformation\n");
        output.push_str(&format!(
            "You moved from **{}** ({}) to **{}** ({}).\n\n",
            moment.start_mood.label(),
            timefmt::short_date(moment.start_date.date_naive()),
            moment.end_mood.label(),
            timefmt::short_date(moment.end_date.date_naive())
        ));
    }
}

fn render_yearly(output: &mut String, yearly: &YearlyStats) {
    if !yearly.top3_emotions.is_empty() {
        output.push_str("### 🏆 Top Emotions\n");
        for (i, share) in yearly.top3_emotions.iter().enumerate() {
            output.push_str(&format!(
                "{}. {} ({}%)\n",
                i + 1,
                share.mood.label(),
                share.percentage
            ));
        }
        output.push('\n');
    }

    render_numbers(output, "Your Year in Numbers", &yearly.activity);

    if let Some(ref streak) = yearly.streak_dates {
        output.push_str(&format!(
            "Your longest streak ran from {} to {}.\n\n",
            timefmt::long_date(streak.start),
            timefmt::long_date(streak.end)
        ));
    }

    if !yearly.monthly_breakdown.is_empty() {
        output.push_str("### 📆 Month by Month\n");
        output.push_str("| Month | Entries | Top mood |\n");
        output.push_str("| ----- | ------- | -------- |\n");
        for month in &yearly.monthly_breakdown {
            let top = month
                .top_mood
                .as_ref()
                .map(|m| m.label())
                .unwrap_or_else(|| "-".to_string());
            output.push_str(&format!(
                "| {} | {} | {} |\n",
                month.month,
                format_number(month.entries.len()),
                top
            ));
        }
        output.push('\n');
    }

    let mut highlights: Vec<String> = Vec::new();
    if let Some(ref month) = yearly.most_transformative_month {
        highlights.push(format!(
            "- 🌀 **Most transformative month:** {} ({} entries)",
            month.month,
            format_number(month.entries.len())
        ));
    }
    if let Some(ref month) = yearly.peak_happiness_month {
        highlights.push(format!(
            "- ☀️ **Happiest month:** {} ({} bright {})",
            month.month,
            month.count,
            plural(month.count, "entry", "entries")
        ));
    }
    if let Some(ref month) = yearly.hardest_month {
        highlights.push(format!(
            "- 🌧️ **Hardest month:** {} ({} heavy {}). You made it through.",
            month.month,
            month.count,
            plural(month.count, "entry", "entries")
        ));
    }
    if yearly.gratitude_count > 0 {
        highlights.push(format!(
            "- 🙏 **Moments of gratitude:** {}",
            format_number(yearly.gratitude_count)
        ));
    }
    if !highlights.is_empty() {
        output.push_str("### ✨ Highlights\n");
        for line in highlights {
            output.push_str(&line);
            output.push('\n');
        }
        output.push('\n');
    }

    if let Some(ref entry) = yearly.most_reflective_entry {
        output.push_str("### 🤔 Most Reflective Entry\n");
        render_quote(output, entry);
    }

    if let Some(ref growth) = yearly.emotional_growth {
        output.push_str("### 🌱 Emotional Growth\n");
        output.push_str(&format!(
            "You started the year feeling **{}** and are ending it feeling **{}**.\n\n",
            growth.start_mood.label(),
            growth.end_mood.label()
        ));
    }

    output.push_str(&format!(
        "You journaled more consistently than most: **top {}%** of writers.\n\n",
        yearly.percentile
    ));
}

fn render_peak_day(output: &mut String, peak: &PeakDay) {
    output.push_str("### ⭐ Peak Moment\n");
    output.push_str(&format!(
        "On **{}** you felt {}.\n",
        timefmt::long_date(peak.date),
        peak.mood.label()
    ));
    render_quote(output, &peak.entry);
}

fn render_quote(output: &mut String, entry: &JournalEntry) {
    if let Some(ref title) = entry.title {
        output.push_str(&format!("**{}**\n", title));
    }
    for line in excerpt(&entry.content, QUOTE_CHARS).lines() {
        output.push_str(&format!("> {}\n", line));
    }
    output.push_str(&format!(
        "> *{}*\n\n",
        timefmt::format_timestamp(&entry.timestamp)
    ));
}

fn render_insights(output: &mut String, insights: &[String]) {
    if insights.is_empty() {
        return;
    }

    output.push_str("### 💡 Insights\n");
    for insight in insights {
        output.push_str(&format!("- {}\n", insight));
    }
    output.push('\n');
}

fn render_goal(output: &mut String, goal: &str) {
    output.push_str("### 🎯 Next Goal\n");
    output.push_str(goal);
    output.push('\n');
}

fn period_label(stats: &MoodWrapStats) -> String {
    match stats.period() {
        Period::Weekly => format!(
            "Week in Moods (ending {})",
            timefmt::long_date(stats.date_range.end.date())
        ),
        Period::Monthly => format!(
            "{} Mood Wrap",
            timefmt::month_label(stats.date_range.start.date())
        ),
        Period::Yearly => format!("{} Mood Wrap", stats.key),
    }
}

fn plural<'a>(n: usize, one: &'a str, many: &'a str) -> &'a str {
    if n == 1 {
        one
    } else {
        many
    }
}

/// Format a number with thousand separators
fn format_number(n: usize) -> String {
    let digits = n.to_string();
    let mut grouped_rev = String::new();

    // Insert commas every three digits, starting from the right
    for (count, ch) in digits.chars().rev().enumerate() {
        if count > 0 && count % 3 == 0 {
            grouped_rev.push(',');
        }
        grouped_rev.push(ch);
    }

    grouped_rev.chars().rev().collect()
}

/// Uppercase the first character of a string
fn uppercase_first_char(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mood::MoodCatalog;
    use crate::stats_builder::compute_stats;
    use chrono::{DateTime, TimeZone, Utc};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap()
    }

    fn entry(mood_id: &str, month: u32, day: u32, content: &str) -> JournalEntry {
        let mood = MoodCatalog::default().find(mood_id).cloned().unwrap();
        let ts = Utc.with_ymd_and_hms(2026, month, day, 10, 0, 0).unwrap();
        JournalEntry::new(content, mood, ts)
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
    }

    #[test]
    fn test_render_empty_month() {
        let stats = compute_stats(&[], Period::Monthly, &now());
        let md = render(&stats).unwrap();

        assert!(md.starts_with("# 🌙 Your October 2026 Mood Wrap\n"));
        assert!(md.contains("*Oct 1, 2026 to Oct 31, 2026*"));
        assert!(md.contains("No entries this month yet."));
        assert!(md.contains("Aim for 3 entries this month to build consistency 📝"));
        assert!(!md.contains("Mood Breakdown"));
    }

    #[test]
    fn test_render_weekly() {
        let entries = vec![
            entry("happy", 10, 15, "Sunny walk"),
            entry("happy", 10, 14, "Good talk"),
            entry("sad", 10, 13, "Rainy"),
        ];
        let stats = compute_stats(&entries, Period::Weekly, &now());
        let md = render(&stats).unwrap();

        assert!(md.contains("Week in Moods (ending Oct 16, 2026)"));
        assert!(md.contains("You wrote **3** entries this week."));
        assert!(md.contains("This week you felt mostly **😊 Happy**."));
        assert!(md.contains("| 😊 Happy | 2 | 67% |"));
        assert!(md.contains("| 😢 Sad | 1 | 33% |"));
        assert!(md.contains("### ⭐ Peak Moment"));
        assert!(md.contains("> Sunny walk"));
        assert!(md.contains("*Oct 9, 2026 to Oct 16, 2026*"));
        assert!(md.contains("- Joy has been your companion ✨"));
        assert!(!md.contains("in Numbers"));
    }

    #[test]
    fn test_render_monthly_sections() {
        let entries = vec![
            entry("sad", 10, 1, "Heavy morning, coffee helped"),
            entry("calm", 10, 2, "Coffee on the balcony"),
            entry("happy", 10, 3, "Coffee with friends"),
        ];
        let stats = compute_stats(&entries, Period::Monthly, &now());
        let md = render(&stats).unwrap();

        assert!(md.contains("### 🔢 This Month in Numbers"));
        assert!(md.contains("- 🔥 **Longest streak:** 3 days"));
        assert!(md.contains("**coffee** (3)"));
        assert!(md.contains("- **Oct 1:** sad"));
        assert!(md.contains("### 🦋 Transformation"));
    }

    #[test]
    fn test_render_yearly_sections() {
        let mut reflective = entry("grateful", 6, 1, "A long evening spent writing about everything that changed.");
        reflective.set_title("Looking Back");
        let entries = vec![
            entry("sad", 1, 10, "Cold"),
            entry("sad", 1, 11, "Grey"),
            entry("calm", 1, 12, "Tea"),
            entry("happy", 2, 1, "Sun"),
            reflective,
        ];
        let stats = compute_stats(&entries, Period::Yearly, &now());
        let md = render(&stats).unwrap();

        assert!(md.starts_with("# 🌙 Your 2026 Mood Wrap\n"));
        assert!(md.contains("### 🏆 Top Emotions\n1. 😢 Sad (40%)"));
        assert!(md.contains("| January 2026 | 3 | 😢 Sad |"));
        assert!(md.contains("- 🌧️ **Hardest month:** January 2026 (2 heavy entries)"));
        assert!(md.contains("- 🙏 **Moments of gratitude:** 1"));
        assert!(md.contains("**Looking Back**"));
        assert!(md.contains("top 75%"));
    }

    #[test]
    fn test_report_filename() {
        let stats = compute_stats(&[], Period::Yearly, &now());
        assert_eq!(report_filename(&stats), "soulspace-yearly-2026.md");
    }
}
