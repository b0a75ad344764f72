use crate::news::NewsStory;

/// Saved stories in insertion order, keyed by URL.
///
/// Stories without a URL never enter the list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SavedStories {
    stories: Vec<NewsStory>,
}

/// Outcome of toggling a story's saved state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveToggle {
    Saved,
    Removed,
    /// The story has no URL and cannot be saved.
    NoUrl,
}

impl SavedStories {
    /// Build from a persisted list, dropping URL-less and duplicate entries.
    pub fn from_stories(stories: Vec<NewsStory>) -> Self {
        let mut saved = Self::default();
        for story in stories {
            if story.url().is_some() && !saved.contains(&story) {
                saved.stories.push(story);
            }
        }
        saved
    }

    pub fn contains(&self, story: &NewsStory) -> bool {
        story.url().is_some_and(|url| self.contains_url(url))
    }

    pub fn contains_url(&self, url: &str) -> bool {
        self.stories.iter().any(|s| s.url() == Some(url))
    }

    pub fn toggle(&mut self, story: &NewsStory) -> SaveToggle {
        let Some(url) = story.url() else {
            return SaveToggle::NoUrl;
        };
        if let Some(pos) = self.stories.iter().position(|s| s.url() == Some(url)) {
            self.stories.remove(pos);
            SaveToggle::Removed
        } else {
            self.stories.push(story.clone());
            SaveToggle::Saved
        }
    }

    pub fn as_slice(&self) -> &[NewsStory] {
        &self.stories
    }

    pub fn len(&self) -> usize {
        self.stories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stories.is_empty()
    }

    /// JSON array of stories, the persisted form.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.stories)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let stories: Vec<NewsStory> = serde_json::from_str(json)?;
        Ok(Self::from_stories(stories))
    }
}
