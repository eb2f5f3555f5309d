// Spoken announcement of the majority emotion

use crate::error::Result;
use crate::models::EmotionLabel;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Immutable mapping from label to the phrase that is spoken for it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhraseBook {
    phrases: BTreeMap<EmotionLabel, String>,
}

impl PhraseBook {
    pub fn new(phrases: BTreeMap<EmotionLabel, String>) -> Self {
        Self { phrases }
    }

    /// Phrase for `label`, falling back to the label name
    pub fn phrase(&self, label: EmotionLabel) -> &str {
        self.phrases
            .get(&label)
            .map(String::as_str)
            .unwrap_or_else(|| label.as_str())
    }

    pub fn entries(&self) -> impl Iterator<Item = (EmotionLabel, &str)> {
        self.phrases
            .iter()
            .map(|(label, phrase)| (*label, phrase.as_str()))
    }

    /// Turkish phrases the application ships with
    pub fn turkish() -> Self {
        let phrases = [
            (EmotionLabel::Anger, "kızgın"),
            (EmotionLabel::Contempt, "küçümseyici"),
            (EmotionLabel::Disgust, "iğrenmiş"),
            (EmotionLabel::Fear, "korkmuş"),
            (EmotionLabel::Happy, "mutlu"),
            (EmotionLabel::Neutral, "normal"),
            (EmotionLabel::Sad, "üzgün"),
            (EmotionLabel::Surprise, "şaşırmış"),
        ]
        .into_iter()
        .map(|(label, phrase)| (label, phrase.to_string()))
        .collect();
        Self::new(phrases)
    }
}

impl Default for PhraseBook {
    fn default() -> Self {
        Self::turkish()
    }
}

/// Speech output device
pub trait Speaker {
    /// True while a previous utterance is still being delivered
    fn is_speaking(&self) -> bool;

    fn speak(&mut self, text: &str) -> Result<()>;
}

impl<S: Speaker + ?Sized> Speaker for Box<S> {
    fn is_speaking(&self) -> bool {
        (**self).is_speaking()
    }

    fn speak(&mut self, text: &str) -> Result<()> {
        (**self).speak(text)
    }
}

/// What happened to an announcement request
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Announcement {
    Spoken(String),
    /// The speaker was busy; the request was dropped, not queued
    Suppressed,
}

/// Turns majority labels into speech without overlapping utterances
pub struct Announcer<S> {
    phrases: PhraseBook,
    speaker: S,
}

impl<S: Speaker> Announcer<S> {
    pub fn new(phrases: PhraseBook, speaker: S) -> Self {
        Self { phrases, speaker }
    }

    pub fn announce(&mut self, label: EmotionLabel) -> Result<Announcement> {
        if self.speaker.is_speaking() {
            debug!("Speaker busy, dropping announcement for {}", label);
            return Ok(Announcement::Suppressed);
        }

        let phrase = self.phrases.phrase(label).to_string();
        self.speaker.speak(&phrase)?;
        info!("Majority {} announced as '{}'", label, phrase);
        Ok(Announcement::Spoken(phrase))
    }

    pub fn speaker(&self) -> &S {
        &self.speaker
    }
}

/// Speaker that writes utterances to the log and stays busy for a fixed time
#[derive(Debug)]
pub struct LogSpeaker {
    utterance: Duration,
    busy_until: Option<Instant>,
}

impl LogSpeaker {
    pub fn new(utterance: Duration) -> Self {
        Self {
            utterance,
            busy_until: None,
        }
    }
}

impl Speaker for LogSpeaker {
    fn is_speaking(&self) -> bool {
        self.busy_until
            .map(|until| Instant::now() < until)
            .unwrap_or(false)
    }

    fn speak(&mut self, text: &str) -> Result<()> {
        info!("Speaking: {}", text);
        self.busy_until = Some(Instant::now() + self.utterance);
        Ok(())
    }
}
