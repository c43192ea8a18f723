//! Editing Session
//!
//! Owns the deck and the active slide index for one editor window. The view
//! layer keeps its own presentation state and calls in here with plain
//! triggers; dialogs are reached through the `Confirm` and `PathPicker`
//! traits.

use crate::persistence::{self, LoadOutcome, PathPicker, PersistError, SaveOutcome};
use crate::pipeline::{BuildFailure, BuildPipeline, BuildReport};
use crate::slides::{Deck, Slide};
use crate::toolchain::ToolRunner;

/// Yes/no question to the user, e.g. a message box.
pub trait Confirm {
    fn confirm(&mut self, question: &str) -> bool;
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    deck: Deck,
    active: usize,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    pub fn active(&self) -> usize {
        self.active
    }

    /// Select a slide; out-of-range indices land on the last slide.
    pub fn select(&mut self, index: usize) {
        self.active = self.deck.clamp(index);
    }

    pub fn active_slide(&self) -> Option<&Slide> {
        self.deck.get(self.active)
    }

    pub fn active_slide_mut(&mut self) -> Option<&mut Slide> {
        self.deck.get_mut(self.active)
    }

    pub fn add_slide(&mut self) -> usize {
        self.active = self.deck.add_slide();
        self.active
    }

    /// Delete after confirmation. Returns whether a slide was removed.
    pub fn delete_slide(&mut self, index: usize, confirm: &mut impl Confirm) -> bool {
        if self.deck.len() <= 1 || index >= self.deck.len() {
            return false;
        }
        let question = format!("Delete {}?", self.deck.label(index));
        if !confirm.confirm(&question) {
            return false;
        }
        if !self.deck.delete_slide(index) {
            return false;
        }
        if index < self.active {
            self.active -= 1;
        }
        self.active = self.deck.clamp(self.active);
        true
    }

    pub fn reset(&mut self) {
        self.deck.reset();
        self.active = 0;
    }

    pub fn save(&self, picker: &mut impl PathPicker) -> Result<SaveOutcome, PersistError> {
        persistence::save(&self.deck, picker)
    }

    pub fn load(&mut self, picker: &mut impl PathPicker) -> LoadOutcome {
        let outcome = persistence::load(&mut self.deck, picker);
        if outcome.is_loaded() {
            self.active = 0;
        }
        outcome
    }

    pub fn export<R, S, E>(
        &self,
        pipeline: &mut BuildPipeline<R>,
        on_success: S,
        on_error: E,
    ) -> bool
    where
        R: ToolRunner,
        S: FnOnce(&BuildReport),
        E: FnOnce(&BuildFailure),
    {
        pipeline.export_with(&self.deck, on_success, on_error)
    }
}
