use log::{debug, info};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use super::category::{Category, CategoryKind, Form};
use crate::error::{DrillError, Result};

const BUILTIN_CATEGORIES: &str = include_str!("../../data/categories.toml");

const BUILTIN_LANGUAGES: [&str; 6] = [
    include_str!("../../data/lang/es.toml"),
    include_str!("../../data/lang/fr.toml"),
    include_str!("../../data/lang/de.toml"),
    include_str!("../../data/lang/it.toml"),
    include_str!("../../data/lang/cy.toml"),
    include_str!("../../data/lang/pt.toml"),
];

#[derive(Deserialize, Debug, Clone)]
struct CategoryFileEntry {
    items: Vec<String>,
    #[serde(default)]
    display: BTreeMap<String, String>,
}

/// Language-independent definition of a category: which items exist and how
/// each is shown (a CSS colour for colours, an emoji otherwise).
#[derive(Debug, Clone)]
pub struct CategoryDefinition {
    pub category: Category,
    pub kind: CategoryKind,
    pub items: Vec<String>,
    pub display: BTreeMap<String, String>,
}

/// Extra grammatical data for one item in one language. An item missing a
/// field simply does not take part in that form's rounds.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct FormData {
    pub article: Option<String>,
    pub plural: Option<String>,
    pub plural_article: Option<String>,
    pub feminine: Option<String>,
}

impl FormData {
    pub fn supports(&self, form: Form) -> bool {
        match form {
            Form::Base => true,
            Form::Article => self.article.is_some(),
            Form::Plural => self.plural.is_some(),
            Form::Feminine => self.feminine.is_some(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct LanguageCategoryData {
    pub translations: BTreeMap<String, String>,
    #[serde(default)]
    pub forms: BTreeMap<String, FormData>,
    /// Extra spoken spellings accepted by speech matching (colours only in practice).
    #[serde(default)]
    pub aliases: BTreeMap<String, Vec<String>>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct LanguagePack {
    pub code: String,
    pub name: String,
    pub speech_locale: String,
    #[serde(default)]
    pub accents: Vec<String>,
    pub categories: BTreeMap<Category, LanguageCategoryData>,
}

/// All categories plus every loaded language, validated against each other.
#[derive(Debug, Clone)]
pub struct VocabularyRegistry {
    categories: BTreeMap<Category, CategoryDefinition>,
    languages: BTreeMap<String, LanguagePack>,
}

impl VocabularyRegistry {
    /// Registry backed by the data files compiled into the binary.
    pub fn builtin() -> Result<Self> {
        let mut registry = Self::from_category_toml(BUILTIN_CATEGORIES)?;
        for source in BUILTIN_LANGUAGES {
            registry.add_language_toml(source)?;
        }
        Ok(registry)
    }

    pub fn from_category_toml(source: &str) -> Result<Self> {
        let raw: BTreeMap<Category, CategoryFileEntry> = toml::from_str(source)?;
        let mut categories = BTreeMap::new();
        for category in Category::ALL {
            let entry = raw.get(&category).ok_or_else(|| {
                DrillError::Vocabulary(format!("category '{}' missing from category file", category))
            })?;
            if entry.items.is_empty() {
                return Err(DrillError::Vocabulary(format!("category '{}' has no items", category)));
            }
            categories.insert(
                category,
                CategoryDefinition {
                    category,
                    kind: category.kind(),
                    items: entry.items.clone(),
                    display: entry.display.clone(),
                },
            );
        }
        Ok(Self { categories, languages: BTreeMap::new() })
    }

    /// Parses and validates a language pack, replacing any pack with the same code.
    pub fn add_language_toml(&mut self, source: &str) -> Result<()> {
        let pack: LanguagePack = toml::from_str(source)?;
        self.validate_pack(&pack)?;
        debug!("Loaded language pack '{}' ({})", pack.code, pack.name);
        self.languages.insert(pack.code.clone(), pack);
        Ok(())
    }

    /// Loads every `*.toml` in `dir` as an additional language pack.
    pub fn load_language_dir(&mut self, dir: &Path) -> Result<usize> {
        let mut loaded = 0;
        let entries = fs::read_dir(dir).map_err(|e| DrillError::io(dir, e))?;
        for entry in entries {
            let path = entry.map_err(|e| DrillError::io(dir, e))?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("toml") {
                continue;
            }
            let source = fs::read_to_string(&path).map_err(|e| DrillError::io(&path, e))?;
            self.add_language_toml(&source).map_err(|e| {
                DrillError::Vocabulary(format!("{}: {}", path.display(), e))
            })?;
            loaded += 1;
        }
        info!("Loaded {} language pack(s) from {}", loaded, dir.display());
        Ok(loaded)
    }

    fn validate_pack(&self, pack: &LanguagePack) -> Result<()> {
        if pack.code.trim().is_empty() {
            return Err(DrillError::Vocabulary("language pack with empty code".to_string()));
        }
        for (category, definition) in &self.categories {
            let data = pack.categories.get(category).ok_or_else(|| {
                DrillError::Vocabulary(format!("'{}' has no data for category '{}'", pack.code, category))
            })?;
            for item in &definition.items {
                if !data.translations.contains_key(item) {
                    return Err(DrillError::Vocabulary(format!(
                        "'{}' is missing a translation for {}/{}",
                        pack.code, category, item
                    )));
                }
            }
            for item in data.forms.keys().chain(data.aliases.keys()) {
                if !definition.items.contains(item) {
                    return Err(DrillError::Vocabulary(format!(
                        "'{}' has form or alias data for unknown item {}/{}",
                        pack.code, category, item
                    )));
                }
            }
            if definition.kind == CategoryKind::Colour && !data.forms.is_empty() {
                return Err(DrillError::Vocabulary(format!(
                    "'{}' defines grammatical forms for colours, which are base-only",
                    pack.code
                )));
            }
        }
        Ok(())
    }

    pub fn language_codes(&self) -> impl Iterator<Item = &str> {
        self.languages.keys().map(String::as_str)
    }

    pub fn language(&self, code: &str) -> Result<&LanguagePack> {
        self.languages
            .get(code)
            .ok_or_else(|| DrillError::UnknownLanguage(code.to_string()))
    }

    pub fn definition(&self, category: Category) -> &CategoryDefinition {
        // Every Category variant is inserted by from_category_toml.
        &self.categories[&category]
    }

    pub fn view(&self, language: &str, category: Category) -> Result<CategoryView<'_>> {
        let pack = self.language(language)?;
        let data = pack
            .categories
            .get(&category)
            .ok_or_else(|| DrillError::UnknownCategory(category.to_string()))?;
        Ok(CategoryView { definition: self.definition(category), pack, data })
    }
}

/// One category as seen through one language: the lookup the selector and
/// answer matcher work against.
#[derive(Debug, Clone, Copy)]
pub struct CategoryView<'a> {
    pub definition: &'a CategoryDefinition,
    pub pack: &'a LanguagePack,
    pub data: &'a LanguageCategoryData,
}

impl<'a> CategoryView<'a> {
    pub fn category(&self) -> Category {
        self.definition.category
    }

    pub fn kind(&self) -> CategoryKind {
        self.definition.kind
    }

    pub fn items(&self) -> &'a [String] {
        &self.definition.items
    }

    pub fn translation(&self, item: &str) -> Option<&'a str> {
        self.data.translations.get(item).map(String::as_str)
    }

    pub fn form_data(&self, item: &str) -> Option<&'a FormData> {
        self.data.forms.get(item)
    }

    /// Whether `item` can be asked in `form`. Base is always available.
    pub fn has_form(&self, item: &str, form: Form) -> bool {
        form.is_base() || self.form_data(item).is_some_and(|data| data.supports(form))
    }

    pub fn display(&self, item: &str) -> Option<&'a str> {
        self.definition.display.get(item).map(String::as_str)
    }

    pub fn aliases(&self, item: &str) -> &'a [String] {
        self.data.aliases.get(item).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The expected answer text for `item` in `form`, e.g. "Los Perros".
    /// Falls back to the base word when the form has no data.
    pub fn render(&self, item: &str, form: Form) -> Option<String> {
        let base = self.translation(item)?;
        let rendered = match (form, self.form_data(item)) {
            (Form::Base, _) | (_, None) => base.to_string(),
            (Form::Feminine, Some(data)) => data.feminine.clone().unwrap_or_else(|| base.to_string()),
            (Form::Article, Some(data)) => match &data.article {
                Some(article) => join_article(article, base),
                None => base.to_string(),
            },
            (Form::Plural, Some(data)) => match (&data.plural_article, &data.plural) {
                (Some(article), Some(plural)) => join_article(article, plural),
                (None, Some(plural)) => plural.clone(),
                _ => base.to_string(),
            },
        };
        Some(rendered)
    }
}

// Elided articles (L', Dell') attach directly to the noun.
fn join_article(article: &str, word: &str) -> String {
    if article.ends_with('\'') || article.ends_with('’') {
        format!("{}{}", article, word)
    } else {
        format!("{} {}", article, word)
    }
}
