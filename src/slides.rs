//! Slide Store - Ordered Text Buffers
//!
//! A deck is never empty while a session is alive. Slides are addressed by
//! position only; labels are derived from the position on demand.

use serde::{Deserialize, Serialize};

/// Soft limit on the number of lines a slide shows on screen.
pub const MAX_LINES: usize = 27;

/// Soft limit on the number of columns per line.
pub const MAX_COLUMNS: usize = 26;

/// One slide: a mutable text buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slide {
    text: String,
}

impl Slide {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Mutable access for the editor widget.
    pub fn text_mut(&mut self) -> &mut String {
        &mut self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Lines as the codec sees them: split on line feeds, trailing feed
    /// yields an empty final line.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.split('\n')
    }
}

impl From<&str> for Slide {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for Slide {
    fn from(text: String) -> Self {
        Self { text }
    }
}

/// Ordered collection of slides. First slide is the intro, last is terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deck {
    slides: Vec<Slide>,
}

impl Deck {
    /// Fresh deck holding one empty slide.
    pub fn new() -> Self {
        Self {
            slides: vec![Slide::default()],
        }
    }

    /// Build a deck from existing slides. An empty input yields a fresh deck.
    pub fn from_slides(slides: Vec<Slide>) -> Self {
        let mut deck = Self::new();
        deck.replace_all(slides);
        deck
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    /// Never true for a deck built through this API.
    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn get(&self, index: usize) -> Option<&Slide> {
        self.slides.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Slide> {
        self.slides.get_mut(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Slide> {
        self.slides.iter()
    }

    /// Append an empty slide and return its index (the new active slide).
    pub fn add_slide(&mut self) -> usize {
        self.slides.push(Slide::default());
        self.slides.len() - 1
    }

    /// Remove the slide at `index`. No-op when only one slide is left or the
    /// index is out of range. Returns whether a slide was removed.
    pub fn delete_slide(&mut self, index: usize) -> bool {
        if self.slides.len() <= 1 || index >= self.slides.len() {
            return false;
        }
        self.slides.remove(index);
        true
    }

    /// Back to the one-empty-slide state.
    pub fn reset(&mut self) {
        self.slides.clear();
        self.slides.push(Slide::default());
    }

    /// Swap in a whole new set of slides (used by load). Empty input resets.
    pub fn replace_all(&mut self, slides: Vec<Slide>) {
        if slides.is_empty() {
            self.reset();
        } else {
            self.slides = slides;
        }
    }

    /// Tab label for the slide at `index`.
    pub fn label(&self, index: usize) -> String {
        default_label(index)
    }

    pub fn labels(&self) -> Vec<String> {
        (0..self.slides.len()).map(default_label).collect()
    }

    /// Nearest valid index for a possibly stale one.
    pub fn clamp(&self, index: usize) -> usize {
        index.min(self.slides.len().saturating_sub(1))
    }

    pub fn into_slides(self) -> Vec<Slide> {
        self.slides
    }
}

impl Default for Deck {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> IntoIterator for &'a Deck {
    type Item = &'a Slide;
    type IntoIter = std::slice::Iter<'a, Slide>;

    fn into_iter(self) -> Self::IntoIter {
        self.slides.iter()
    }
}

fn default_label(index: usize) -> String {
    if index == 0 {
        "Intro".to_string()
    } else {
        format!("Slide {}", index)
    }
}
