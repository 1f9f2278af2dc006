/// Prompt builders for the text generation collaborator.
///
/// Everything here is plain string assembly; the generator behind
/// `TextGenerator` is supplied by the caller.
use anyhow::{bail, Context, Result};
use chrono::{DateTime, TimeZone, Timelike};
use tracing::{debug, info};

use crate::journal::{excerpt, JournalEntry};
use crate::timefmt;

/// Recent entries quoted in the journal prompts request
pub const RECENT_ENTRY_LIMIT: usize = 10;
/// Characters kept from each quoted entry
pub const EXCERPT_CHARS: usize = 150;
/// Characters kept from the concatenated history
pub const THEMES_CHARS: usize = 500;
/// Entries after which deeper questions are requested
pub const DEEPER_PROMPTS_MIN_ENTRIES: usize = 10;
/// Content shorter than this (trimmed) is not titled
pub const TITLE_MIN_CHARS: usize = 10;

/// Free-form text generation backend.
pub trait TextGenerator {
    fn generate(&self, prompt: &str) -> Result<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeOfDay {
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => TimeOfDay::Morning,
            12..=16 => TimeOfDay::Afternoon,
            17..=20 => TimeOfDay::Evening,
            _ => TimeOfDay::Night,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeOfDay::Morning => "morning",
            TimeOfDay::Afternoon => "afternoon",
            TimeOfDay::Evening => "evening",
            TimeOfDay::Night => "night",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExperienceLevel {
    FirstTime,
    New,
    Regular,
    Experienced,
}

impl ExperienceLevel {
    pub fn from_entry_count(count: usize) -> Self {
        match count {
            0 => ExperienceLevel::FirstTime,
            1..=4 => ExperienceLevel::New,
            5..=19 => ExperienceLevel::Regular,
            _ => ExperienceLevel::Experienced,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ExperienceLevel::FirstTime => "a first-time journaler",
            ExperienceLevel::New => "new to journaling",
            ExperienceLevel::Regular => "a regular journaler",
            ExperienceLevel::Experienced => "an experienced journaler",
        }
    }
}

pub fn suggestions_prompt(mood_name: &str) -> String {
    format!(
        "I'm feeling {} today. Give me 3 thoughtful journal prompts or questions to help me \
         explore this feeling. Keep them concise (1-2 sentences each) and empathetic.",
        mood_name
    )
}

pub fn reflection_prompt(content: &str, mood_name: &str) -> String {
    format!(
        "I wrote this journal entry while feeling {}:\n\n\"{}\"\n\nProvide a brief, supportive \
         reflection (2-3 sentences) that helps me understand my thoughts better. Be empathetic \
         and insightful.",
        mood_name, content
    )
}

pub fn expansion_prompt(content: &str, mood_name: &str) -> String {
    format!(
        "I wrote this journal entry while feeling {}:\n\n\"{}\"\n\nHelp me expand on this \
         thought. Suggest what I might explore further, or help me put what I'm feeling into \
         words. Keep it in my voice and style.",
        mood_name, content
    )
}

/// Conversational feedback on a saved entry.
pub fn feedback_prompt(content: &str, mood_name: &str, title: Option<&str>) -> String {
    let mut prompt = String::new();

    prompt.push_str(
        "You are a compassionate companion helping someone reflect on their journal entry. \
         Give warm, conversational feedback. Do not judge.\n\n",
    );
    match title {
        Some(title) => prompt.push_str(&format!("Journal entry (title: \"{}\"):\n", title)),
        None => prompt.push_str("Journal entry:\n"),
    }
    prompt.push_str(&format!("\"{}\"\n\n", content));
    prompt.push_str(&format!("Detected emotion: {}\n\n", mood_name));
    prompt.push_str("Structure the reply as:\n");
    prompt.push_str("1. Acknowledge their emotions\n");
    prompt.push_str("2. What they did well (self-awareness, honesty, growth)\n");
    prompt.push_str("3. Gentle suggestions for reflection or self-care\n\n");
    prompt.push_str("Keep it to 2-3 paragraphs, specific to what they wrote, and start directly with the feedback.");

    prompt
}

pub fn title_prompt(content: &str) -> String {
    format!(
        "Read this journal entry and write a short, meaningful title (3-8 words) that captures \
         its main theme or emotional tone. Avoid generic titles like \"My Thoughts\".\n\n\
         Journal entry:\n\"{}\"\n\nReply with the title only. No quotes, no explanation.",
        content
    )
}

/// Request for five personalized journal prompts.
///
/// `entries` is the stored list, newest first. The request adapts to the
/// writer's experience, the time of day at `now`, and quotes up to ten
/// recent entries.
pub fn journal_prompts_prompt<Tz: TimeZone>(entries: &[JournalEntry], now: &DateTime<Tz>) -> String {
    let level = ExperienceLevel::from_entry_count(entries.len());
    let time_of_day = TimeOfDay::from_hour(now.hour());

    let mut prompt = format!(
        "Generate 5 new, varied and engaging journal prompts for someone who is {}. \
         It's {} where they are.",
        level.description(),
        time_of_day.as_str()
    );

    if !entries.is_empty() {
        let noun = if entries.len() == 1 { "entry" } else { "entries" };
        prompt.push_str(&format!(
            "\n\nThey have written {} {} so far.",
            entries.len(),
            noun
        ));

        prompt.push_str("\n\nTheir recent journal entries:\n");
        for (i, entry) in entries.iter().take(RECENT_ENTRY_LIMIT).enumerate() {
            let local = entry.timestamp.with_timezone(&now.timezone());
            let days_ago = now
                .clone()
                .signed_duration_since(entry.timestamp)
                .num_days()
                .max(0);
            prompt.push_str(&format!(
                "{}. ({} days ago, {}, felt {}): \"{}\"\n",
                i + 1,
                days_ago,
                timefmt::long_date(local.date_naive()),
                entry.mood.name,
                excerpt(&entry.content, EXCERPT_CHARS)
            ));
        }

        let history: Vec<&str> = entries.iter().map(|e| e.content.as_str()).collect();
        prompt.push_str(&format!(
            "\nAll themes and topics from their entries: {}\n",
            excerpt(&history.join(" "), THEMES_CHARS)
        ));

        prompt.push_str(
            "\nInclude 1-2 follow-up prompts that refer to specific events, people, goals or \
             feelings from the entries above.",
        );

        if entries.len() >= DEEPER_PROMPTS_MIN_ENTRIES {
            prompt.push_str(
                "\n\nSince they're experienced, ask deeper, more reflective questions that \
                 build on their journaling journey.",
            );
        }
    }

    prompt.push_str(
        "\n\nMix reflection, gratitude, growth, emotions and goals. Each prompt is 1-2 \
         sentences, easy to start and non-judgmental.\n\n\
         Format them as a numbered list:\n1. ...\n2. ...\n3. ...\n4. ...\n5. ...\n\n\
         Output only the numbered list.",
    );

    prompt
}

/// Items of a "1. ..." numbered list reply; other lines are ignored.
pub fn parse_numbered_list(reply: &str) -> Vec<String> {
    reply
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            let (number, rest) = line.split_once('.')?;
            if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            let item = rest.trim();
            (!item.is_empty()).then(|| item.to_string())
        })
        .collect()
}

/// Trim a generated title and drop one pair of surrounding quotes.
pub fn clean_title(reply: &str) -> String {
    let title = reply.trim();
    let title = title.strip_prefix(['"', '\'']).unwrap_or(title);
    let title = title.strip_suffix(['"', '\'']).unwrap_or(title);
    title.trim().to_string()
}

/// Ask the generator for a title for `content`.
pub fn generate_title<G: TextGenerator + ?Sized>(generator: &G, content: &str) -> Result<String> {
    if content.trim().chars().count() < TITLE_MIN_CHARS {
        bail!("Please write at least a few sentences before generating a title.");
    }

    let reply = generator
        .generate(&title_prompt(content))
        .context("Failed to generate title. Please try again.")?;
    debug!("Title reply: {}", reply);

    let title = clean_title(&reply);
    if title.is_empty() {
        bail!("The title generator returned an empty title.");
    }

    info!("Generated title '{}'", title);
    Ok(title)
}
