use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DrillError;

/// Vocabulary categories a learner can drill. Progress is tracked per
/// language x category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Colours,
    Adjectives,
    Animals,
    Food,
    Weather,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Colours,
        Category::Adjectives,
        Category::Animals,
        Category::Food,
        Category::Weather,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            Category::Colours => "colours",
            Category::Adjectives => "adjectives",
            Category::Animals => "animals",
            Category::Food => "food",
            Category::Weather => "weather",
        }
    }

    pub fn kind(self) -> CategoryKind {
        match self {
            Category::Colours => CategoryKind::Colour,
            Category::Adjectives => CategoryKind::Adjective,
            Category::Animals | Category::Food | Category::Weather => CategoryKind::Noun,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Colours => "Colours",
            Category::Adjectives => "Adjectives",
            Category::Animals => "Animals",
            Category::Food => "Food",
            Category::Weather => "Weather",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Category {
    type Err = DrillError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.slug() == wanted || (wanted == "colors" && *c == Category::Colours))
            .ok_or_else(|| DrillError::UnknownCategory(s.to_string()))
    }
}

/// Drives which grammatical forms unlock and how the pool is sized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    /// Base form only; pool grows with the cycle.
    Colour,
    /// Articles and plurals unlock by cycle.
    Noun,
    /// Feminine forms unlock by cycle.
    Adjective,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Form {
    Base,
    Article,
    Plural,
    Feminine,
}

impl Form {
    pub fn as_str(self) -> &'static str {
        match self {
            Form::Base => "base",
            Form::Article => "article",
            Form::Plural => "plural",
            Form::Feminine => "feminine",
        }
    }

    pub fn is_base(self) -> bool {
        self == Form::Base
    }
}

impl fmt::Display for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An item paired with the form it is asked in. Used both as the mastery map
/// key and as the question handed to the front end.
///
/// `K` is opaque: vocabulary keys for the normal drill, but any ordered key
/// (pronouns for a conjugation drill, say) works with the same machinery.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MasteryKey<K> {
    pub item: K,
    pub form: Form,
}

pub type Question<K> = MasteryKey<K>;

impl<K> MasteryKey<K> {
    pub fn new(item: K, form: Form) -> Self {
        Self { item, form }
    }

    pub fn base(item: K) -> Self {
        Self { item, form: Form::Base }
    }
}

/// Renders as `item` for the base form and `item:form` otherwise.
impl<K: fmt::Display> fmt::Display for MasteryKey<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.form.is_base() {
            write!(f, "{}", self.item)
        } else {
            write!(f, "{}:{}", self.item, self.form)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_display_omits_base_form() {
        assert_eq!(MasteryKey::base("dog").to_string(), "dog");
        assert_eq!(MasteryKey::new("dog", Form::Plural).to_string(), "dog:plural");
    }

    #[test]
    fn category_parses_slugs_and_american_spelling() {
        assert_eq!("Animals".parse::<Category>().unwrap(), Category::Animals);
        assert_eq!("colors".parse::<Category>().unwrap(), Category::Colours);
        assert!("verbs".parse::<Category>().is_err());
    }

    #[test]
    fn kinds_follow_category() {
        assert_eq!(Category::Colours.kind(), CategoryKind::Colour);
        assert_eq!(Category::Adjectives.kind(), CategoryKind::Adjective);
        assert_eq!(Category::Weather.kind(), CategoryKind::Noun);
    }
}
