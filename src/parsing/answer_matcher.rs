use regex::Regex;
use std::sync::OnceLock;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::types::category::{Category, Form};
use crate::types::vocabulary::CategoryView;

fn word_splitter() -> &'static Regex {
    static WORDS: OnceLock<Regex> = OnceLock::new();
    WORDS.get_or_init(|| Regex::new(r"[^\s.,!?¡¿;:]+").expect("word pattern is valid"))
}

/// Accent-insensitive comparison key: strips combining marks, folds `ß` to
/// `ss`, lowercases and trims. "Marrón" and " marron" compare equal.
pub fn normalize_for_comparison(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .replace('ß', "ss")
        .to_lowercase()
        .trim()
        .to_string()
}

/// The item behind the `index`-th button. Buttons list the pool in order.
pub fn match_button<K>(pool: &[K], index: usize) -> Option<&K> {
    pool.get(index)
}

/// Finds the pool item whose `form` text equals what was typed, ignoring
/// accents and case. Anything else is a wrong answer.
pub fn match_typed(view: &CategoryView<'_>, pool: &[String], form: Form, typed: &str) -> Option<String> {
    let wanted = normalize_for_comparison(typed);
    if wanted.is_empty() {
        return None;
    }
    pool.iter()
        .find(|item| {
            view.render(item, form)
                .is_some_and(|expected| normalize_for_comparison(&expected) == wanted)
        })
        .cloned()
}

/// Finds the pool item a speech transcript names. Tried in order:
/// colour aliases against the last word, a transcript ending in the
/// `form` text (for "el perro" style answers), then the base word against
/// the last word. `None` means nothing recognisable was said.
pub fn match_spoken(view: &CategoryView<'_>, pool: &[String], form: Form, transcript: &str) -> Option<String> {
    let transcript = transcript.trim().to_lowercase();
    let last_word = word_splitter().find_iter(&transcript).last()?.as_str();

    if view.category() == Category::Colours {
        let by_alias = pool.iter().find(|item| {
            view.aliases(item)
                .iter()
                .any(|alias| alias.to_lowercase() == last_word)
        });
        if let Some(item) = by_alias {
            return Some(item.clone());
        }
    }

    if !form.is_base() {
        let by_form = pool.iter().find(|item| {
            view.render(item, form)
                .is_some_and(|expected| transcript.ends_with(&expected.to_lowercase()))
        });
        if let Some(item) = by_form {
            return Some(item.clone());
        }
    }

    pool.iter()
        .find(|item| {
            view.translation(item)
                .is_some_and(|word| word.to_lowercase() == last_word)
        })
        .cloned()
}

/// The last two words of a transcript, for "Heard: ..." feedback.
pub fn heard_excerpt(transcript: &str) -> String {
    let lowered = transcript.trim().to_lowercase();
    let words: Vec<&str> = word_splitter().find_iter(&lowered).map(|m| m.as_str()).collect();
    let start = words.len().saturating_sub(2);
    words[start..].join(" ")
}
