use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::mood::{Mood, MoodCatalog};

pub const PREFERENCES_FILE: &str = "preferences.json";

/// Preferences for mood selection, stored in the data root.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Preferences {
    /// Mood picked last time, used as the starting cursor
    #[serde(default)]
    pub last_mood: Option<String>,
}

impl Preferences {
    /// Load preferences from the data root
    pub fn load(data_root: &Path) -> Result<Self> {
        let prefs_file = data_root.join(PREFERENCES_FILE);

        if !prefs_file.exists() {
            return Ok(Self::default());
        }

        let contents =
            fs::read_to_string(&prefs_file).context("Failed to read preferences file")?;
        let prefs: Self =
            serde_json::from_str(&contents).context("Failed to parse preferences file")?;
        Ok(prefs)
    }

    /// Save preferences to the data root
    pub fn save(&self, data_root: &Path) -> Result<()> {
        fs::create_dir_all(data_root).context("Failed to create data directory")?;

        let prefs_file = data_root.join(PREFERENCES_FILE);
        let contents =
            serde_json::to_string_pretty(self).context("Failed to serialize preferences")?;
        fs::write(&prefs_file, contents).context("Failed to write preferences file")?;
        Ok(())
    }
}

/// Look up a mood id given on the command line.
pub fn resolve_mood(catalog: &MoodCatalog, id: &str) -> Result<Mood> {
    catalog.find(id.trim()).cloned().ok_or_else(|| {
        anyhow!(
            "Unknown mood '{}'. Available: {}",
            id,
            catalog.ids().join(", ")
        )
    })
}

/// Mood selector handles the user-selected mood with preference memory.
pub struct MoodSelector<'a> {
    catalog: &'a MoodCatalog,
    data_root: PathBuf,
    preferences: Preferences,
}

impl<'a> MoodSelector<'a> {
    /// Create a new mood selector, loading preferences
    pub fn new(catalog: &'a MoodCatalog, data_root: &Path) -> Result<Self> {
        let preferences = Preferences::load(data_root)?;
        Ok(Self {
            catalog,
            data_root: data_root.to_path_buf(),
            preferences,
        })
    }

    /// Select a mood.
    ///
    /// Behavior:
    /// - If mood_flag is Some, resolves that id (no UI)
    /// - Otherwise shows a single-select list starting at the last used mood
    ///
    /// The chosen mood is remembered either way.
    pub fn select(&mut self, mood_flag: Option<String>) -> Result<Mood> {
        let mood = match mood_flag {
            Some(id) => resolve_mood(self.catalog, &id)?,
            None => self.select_interactive()?,
        };

        self.preferences.last_mood = Some(mood.id.clone());
        self.preferences.save(&self.data_root)?;

        Ok(mood)
    }

    /// Index of the remembered mood in the catalog, if it still exists
    pub fn starting_cursor(&self) -> usize {
        self.preferences
            .last_mood
            .as_ref()
            .and_then(|last| self.catalog.iter().position(|m| &m.id == last))
            .unwrap_or(0)
    }

    fn select_interactive(&self) -> Result<Mood> {
        let labels: Vec<String> = self
            .catalog
            .iter()
            .map(|m| match &m.description {
                Some(description) => format!("{} ({})", m.label(), description),
                None => m.label(),
            })
            .collect();

        let choice = inquire::Select::new("How are you feeling?", labels)
            .with_starting_cursor(self.starting_cursor())
            .raw_prompt()?;

        self.catalog
            .iter()
            .nth(choice.index)
            .cloned()
            .ok_or_else(|| anyhow!("Invalid mood selection"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preferences_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Preferences::load(dir.path()).unwrap(), Preferences::default());

        let prefs = Preferences {
            last_mood: Some("calm".to_string()),
        };
        prefs.save(dir.path()).unwrap();
        assert_eq!(Preferences::load(dir.path()).unwrap(), prefs);
    }

    #[test]
    fn test_select_with_flag_remembers_mood() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = MoodCatalog::default();

        let mut selector = MoodSelector::new(&catalog, dir.path()).unwrap();
        assert_eq!(selector.starting_cursor(), 0);
        let mood = selector.select(Some("grateful".to_string())).unwrap();
        assert_eq!(mood.id, "grateful");

        let selector = MoodSelector::new(&catalog, dir.path()).unwrap();
        let expected = catalog.iter().position(|m| m.id == "grateful").unwrap();
        assert_eq!(selector.starting_cursor(), expected);
    }

    #[test]
    fn test_unknown_mood_flag() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = MoodCatalog::default();
        let mut selector = MoodSelector::new(&catalog, dir.path()).unwrap();

        let err = selector.select(Some("ecstatic".to_string())).unwrap_err();
        assert!(err.to_string().contains("Unknown mood 'ecstatic'"));
        assert!(!dir.path().join(PREFERENCES_FILE).exists());
    }

    #[test]
    fn test_stale_preference_falls_back_to_first() {
        let dir = tempfile::tempdir().unwrap();
        Preferences {
            last_mood: Some("retired".to_string()),
        }
        .save(dir.path())
        .unwrap();

        let catalog = MoodCatalog::default();
        let selector = MoodSelector::new(&catalog, dir.path()).unwrap();
        assert_eq!(selector.starting_cursor(), 0);
    }
}
