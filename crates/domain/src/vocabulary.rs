use serde::{Deserialize, Serialize};

use crate::error::PracticeError;

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Accent {
    Uk,
    #[default]
    Us,
}

/// Reference recordings for the two regional variants of a term.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegionalAudio {
    pub uk: String,
    pub us: String,
}

impl RegionalAudio {
    pub fn url(&self, accent: Accent) -> &str {
        match accent {
            Accent::Uk => &self.uk,
            Accent::Us => &self.us,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExampleSentence {
    pub sentence: String,
    #[serde(default)]
    pub translation: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Collocation {
    pub phrase: String,
    #[serde(default)]
    pub meaning: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct VocabularyItem {
    pub id: String,
    pub term: String,
    #[serde(default)]
    pub ipa: Option<String>,
    pub meaning: String,
    #[serde(default)]
    pub examples: Vec<ExampleSentence>,
    #[serde(default)]
    pub collocations: Vec<Collocation>,
    #[serde(default)]
    pub audio: Option<RegionalAudio>,
}

impl VocabularyItem {
    pub fn new(
        id: impl Into<String>,
        term: impl Into<String>,
        meaning: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            term: term.into(),
            ipa: None,
            meaning: meaning.into(),
            examples: Vec::new(),
            collocations: Vec::new(),
            audio: None,
        }
    }

    pub fn with_ipa(mut self, ipa: impl Into<String>) -> Self {
        self.ipa = Some(ipa.into());
        self
    }

    pub fn with_audio(mut self, uk: impl Into<String>, us: impl Into<String>) -> Self {
        self.audio = Some(RegionalAudio {
            uk: uk.into(),
            us: us.into(),
        });
        self
    }

    pub fn with_example(
        mut self,
        sentence: impl Into<String>,
        translation: Option<String>,
    ) -> Self {
        self.examples.push(ExampleSentence {
            sentence: sentence.into(),
            translation,
        });
        self
    }

    pub fn audio_url(&self, accent: Accent) -> Option<&str> {
        self.audio.as_ref().map(|audio| audio.url(accent))
    }

    pub fn validate(&self) -> Result<(), PracticeError> {
        if self.id.trim().is_empty() {
            return Err(PracticeError::validation("vocabulary item id is empty"));
        }
        if self.term.trim().is_empty() {
            return Err(PracticeError::validation(format!(
                "vocabulary item {} has an empty term",
                self.id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_optional_fields() {
        let item = VocabularyItem::new("w1", "apple", "a fruit")
            .with_ipa("ˈæp.əl")
            .with_audio("https://cdn/uk/apple.mp3", "https://cdn/us/apple.mp3")
            .with_example("I ate an apple.", None);
        assert_eq!(item.ipa.as_deref(), Some("ˈæp.əl"));
        assert_eq!(item.audio_url(Accent::Uk), Some("https://cdn/uk/apple.mp3"));
        assert_eq!(item.examples.len(), 1);
    }

    #[test]
    fn validation_rejects_blank_terms() {
        assert!(VocabularyItem::new("w1", "  ", "nothing").validate().is_err());
        assert!(VocabularyItem::new("", "apple", "fruit").validate().is_err());
        assert!(VocabularyItem::new("w1", "apple", "fruit").validate().is_ok());
    }

    #[test]
    fn deserializes_minimal_item() {
        let json = r#"{"id":"w2","term":"pear","meaning":"a fruit"}"#;
        let item: VocabularyItem = serde_json::from_str(json).unwrap();
        assert!(item.audio.is_none());
        assert!(item.collocations.is_empty());
        assert_eq!(item.audio_url(Accent::Us), None);
    }
}
