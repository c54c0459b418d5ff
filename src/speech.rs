use log::info;
use std::cell::RefCell;
use std::rc::Rc;

/// Text-to-speech seam. The engine itself lives outside the crate.
pub trait Speaker {
    fn speak(&mut self, text: &str, locale: &str);
}

/// Says nothing. Used when audio is off.
#[derive(Debug, Default)]
pub struct SilentSpeaker;

impl Speaker for SilentSpeaker {
    fn speak(&mut self, _text: &str, _locale: &str) {}
}

/// Writes what would be spoken to the log, for terminals without TTS.
#[derive(Debug, Default)]
pub struct LogSpeaker;

impl Speaker for LogSpeaker {
    fn speak(&mut self, text: &str, locale: &str) {
        info!("[{}] {}", locale, text);
    }
}

/// Keeps every `(text, locale)` it was asked to say. Clones share one log,
/// so a copy kept outside a session sees what the session said.
#[derive(Debug, Clone, Default)]
pub struct RecordingSpeaker {
    spoken: Rc<RefCell<Vec<(String, String)>>>,
}

impl RecordingSpeaker {
    pub fn spoken(&self) -> Vec<(String, String)> {
        self.spoken.borrow().clone()
    }
}

impl Speaker for RecordingSpeaker {
    fn speak(&mut self, text: &str, locale: &str) {
        self.spoken.borrow_mut().push((text.to_string(), locale.to_string()));
    }
}
