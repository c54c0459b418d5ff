use crate::progression::phase::Phase;
use crate::types::category::{CategoryKind, Form};

/// Instruction shown above a question.
pub fn question_prompt(phase: Phase, form: Form, kind: CategoryKind, feminine_active: bool) -> &'static str {
    let colour = kind == CategoryKind::Colour;
    match phase {
        Phase::Typing => match form {
            Form::Feminine => "Type the feminine!",
            Form::Article => "Type it with the article!",
            Form::Plural => "Type the plural!",
            Form::Base if colour => "Type the colour!",
            Form::Base => "Type the word!",
        },
        Phase::Speech => match form {
            Form::Feminine => "Say the feminine!",
            Form::Article => "Say it with the article!",
            Form::Plural => "Say the plural!",
            Form::Base if colour => "Say the colour!",
            Form::Base => "Say the word!",
        },
        Phase::Learning | Phase::Practice => match form {
            Form::Feminine => "How does she feel?",
            Form::Article => "What is this with its article?",
            Form::Plural => "What are these?",
            Form::Base if kind == CategoryKind::Adjective && feminine_active => "How does he feel?",
            Form::Base if colour => "What colour is this?",
            Form::Base => "What does this emoji mean?",
        },
    }
}

/// The picture for a question: the emoji, doubled for plurals, with a person
/// in front once adjectives have a feminine form. Colours have no glyph.
pub fn question_picture(display: &str, form: Form, kind: CategoryKind, feminine_active: bool) -> Option<String> {
    match (kind, form) {
        (CategoryKind::Colour, _) => None,
        (_, Form::Plural) => Some(format!("{}{}", display, display)),
        (_, Form::Feminine) => Some(format!("👩 {}", display)),
        (CategoryKind::Adjective, _) if feminine_active => Some(format!("👨 {}", display)),
        _ => Some(display.to_string()),
    }
}

pub fn level_up_title(phase_changed: bool) -> &'static str {
    if phase_changed {
        "Phase Complete!"
    } else {
        "Level Up!"
    }
}

/// What the learner should do differently in a phase they just entered.
pub fn phase_intro(phase: Phase, kind: CategoryKind) -> String {
    match phase {
        Phase::Learning => format!("Welcome to {} Mode!", phase),
        Phase::Practice => "Now try without the words!".to_string(),
        Phase::Typing => "Now type the answer! Accented letters are listed below the prompt".to_string(),
        Phase::Speech => {
            let what = if kind == CategoryKind::Colour { "the colour" } else { "the word" };
            format!("Now it's your turn to speak {}!", what)
        }
    }
}

pub fn form_label(form: Form) -> &'static str {
    match form {
        Form::Base => "Words",
        Form::Article => "Articles",
        Form::Plural => "Plurals",
        Form::Feminine => "Feminine forms",
    }
}

/// "New items selected!", naming the extra forms in play if there are any.
pub fn new_items_note(forms: &[Form]) -> String {
    let extras: Vec<&str> = forms.iter().filter(|f| !f.is_base()).map(|&f| form_label(f)).collect();
    if extras.is_empty() {
        "New items selected!".to_string()
    } else {
        format!("New items selected! ({} active)", extras.join(" & "))
    }
}

pub fn time_note(seconds: u64, time_changed: bool, step_seconds: u32) -> String {
    if time_changed {
        format!("Time: {}s (-{} seconds)", seconds, step_seconds)
    } else {
        format!("Time: {}s", seconds)
    }
}

/// Headline for what a new cycle brings. `new_colour_names` are the
/// translated names of colours unlocked this cycle.
pub fn cycle_unlock_note(kind: CategoryKind, newly_unlocked: &[Form], new_colour_names: &[String]) -> String {
    if let Some(&form) = newly_unlocked.first() {
        return format!("{} unlocked!", form_label(form));
    }
    match kind {
        CategoryKind::Colour if !new_colour_names.is_empty() => {
            format!("New colours unlocked! {}", new_colour_names.join(", "))
        }
        CategoryKind::Colour => "All colours mastered!".to_string(),
        _ => "New items selected!".to_string(),
    }
}

pub fn mercy_message(time_seconds: u64, min_seconds: u32) -> String {
    if time_seconds <= u64::from(min_seconds) {
        format!("That {}-second timer is no joke!", time_seconds)
    } else {
        format!("Tricky at {} seconds!", time_seconds)
    }
}

/// Closing line for a finished game. A score of zero shows the answer that
/// was missed instead of encouragement.
pub fn end_message(score: u64, missed_answer: Option<&str>) -> String {
    match score {
        0 => match missed_answer {
            Some(answer) => format!("The answer was {}", answer),
            None => "Out of time!".to_string(),
        },
        1..=4 => "Good start! Keep practising!".to_string(),
        5..=9 => "Nice work! You're getting the hang of it!".to_string(),
        10..=19 => "Excellent! Your vocabulary is growing!".to_string(),
        _ => "Amazing! You're a word master!".to_string(),
    }
}
