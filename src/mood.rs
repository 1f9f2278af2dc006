/// Mood catalog
///
/// Moods are fixed reference values looked up by their stable `id`.
/// Entries embed the mood they were saved with; aggregation resolves ids
/// against the catalog and ignores ids it does not know.
use serde::{Deserialize, Serialize};

pub const NEUTRAL: &str = "neutral";
pub const CALM: &str = "calm";
pub const REFLECTIVE: &str = "reflective";
pub const ANXIOUS: &str = "anxious";
pub const HAPPY: &str = "happy";
pub const SAD: &str = "sad";
pub const GRATEFUL: &str = "grateful";
pub const EXCITED: &str = "excited";
pub const OVERWHELMED: &str = "overwhelmed";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mood {
    pub id: String,
    pub name: String,
    /// Presentation only
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Mood {
    pub fn new(id: &str, name: &str, color: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            color: color.to_string(),
            emoji: None,
            description: None,
        }
    }

    fn with_details(mut self, emoji: &str, description: &str) -> Self {
        self.emoji = Some(emoji.to_string());
        self.description = Some(description.to_string());
        self
    }

    /// Emoji followed by the display name, or just the name.
    pub fn label(&self) -> String {
        match &self.emoji {
            Some(emoji) => format!("{} {}", emoji, self.name),
            None => self.name.clone(),
        }
    }
}

/// Ordered set of known moods.
#[derive(Debug, Clone)]
pub struct MoodCatalog {
    moods: Vec<Mood>,
}

impl MoodCatalog {
    pub fn new(moods: Vec<Mood>) -> Self {
        Self { moods }
    }

    pub fn find(&self, id: &str) -> Option<&Mood> {
        self.moods.iter().find(|m| m.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mood> {
        self.moods.iter()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.moods.iter().map(|m| m.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.moods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moods.is_empty()
    }

    /// Mood used when detection fails: `neutral`, else the first catalog entry.
    pub fn fallback(&self) -> Mood {
        self.find(NEUTRAL)
            .or_else(|| self.moods.first())
            .cloned()
            .unwrap_or_else(|| Mood::new(NEUTRAL, "Neutral", "#A8B5C0"))
    }
}

impl Default for MoodCatalog {
    fn default() -> Self {
        Self::new(vec![
            Mood::new(NEUTRAL, "Neutral", "#A8B5C0")
                .with_details("😐", "Balanced and observational"),
            Mood::new(CALM, "Calm", "#7D9BAF").with_details("😌", "Peaceful and centered"),
            Mood::new(REFLECTIVE, "Reflective", "#9B95B8")
                .with_details("🤔", "Thoughtful and introspective"),
            Mood::new("energized", "Energized", "#D4A574")
                .with_details("⚡", "Motivated and active"),
            Mood::new("melancholic", "Melancholic", "#6B7C8F")
                .with_details("🌧️", "Contemplative and somber"),
            Mood::new("hopeful", "Hopeful", "#8FB89C")
                .with_details("🌱", "Optimistic and looking forward"),
            Mood::new(ANXIOUS, "Anxious", "#9B8FA8").with_details("😰", "Worried or uncertain"),
            Mood::new("content", "Content", "#A5B599")
                .with_details("🙂", "Satisfied and at peace"),
            Mood::new("joyful", "Joyful", "#D4B88A").with_details("😄", "Happy and uplifted"),
            Mood::new(HAPPY, "Happy", "#E3C16F").with_details("😊", "Cheerful and light"),
            Mood::new(SAD, "Sad", "#5E7388").with_details("😢", "Down or heavy-hearted"),
            Mood::new(GRATEFUL, "Grateful", "#B8A77E")
                .with_details("🙏", "Thankful and appreciative"),
            Mood::new(EXCITED, "Excited", "#DE9A5B")
                .with_details("🤩", "Eager and full of anticipation"),
            Mood::new(OVERWHELMED, "Overwhelmed", "#8A7B94")
                .with_details("😵", "Stretched thin and overloaded"),
        ])
    }
}
