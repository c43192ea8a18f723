//! Layout Lint - Rule/Report Separation
//!
//! Rules produce structured violations about how a slide will look on the
//! device. The lint is advisory: encode and save never consult it.

use serde::{Deserialize, Serialize};

use crate::codec::{LITERAL_DELIMITER, SLIDE_TERMINATOR};
use crate::slides::{Deck, Slide, MAX_COLUMNS, MAX_LINES};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Output will be broken (corrupt artifact, lossy save).
    Error,
    /// Output is valid but will not fit the screen.
    Warning,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutViolation {
    pub rule: String,
    pub severity: Severity,
    pub slide: usize,
    /// Zero-based line, when the rule is about a single line.
    pub line: Option<usize>,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayoutReport {
    pub violations: Vec<LayoutViolation>,
}

impl LayoutReport {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.violations.iter().any(|v| v.severity == Severity::Error)
    }

    pub fn for_slide(&self, slide: usize) -> impl Iterator<Item = &LayoutViolation> {
        self.violations.iter().filter(move |v| v.slide == slide)
    }
}

pub trait LayoutRule {
    fn name(&self) -> &'static str;
    fn check(&self, index: usize, slide: &Slide) -> Vec<LayoutViolation>;
}

pub struct LineCountRule;

impl LayoutRule for LineCountRule {
    fn name(&self) -> &'static str { "line_count" }

    fn check(&self, index: usize, slide: &Slide) -> Vec<LayoutViolation> {
        let count = slide.lines().count();
        if count <= MAX_LINES {
            return vec![];
        }
        vec![LayoutViolation {
            rule: self.name().to_string(),
            severity: Severity::Warning,
            slide: index,
            line: None,
            message: format!("{} lines, screen fits {}", count, MAX_LINES),
        }]
    }
}

pub struct LineWidthRule;

impl LayoutRule for LineWidthRule {
    fn name(&self) -> &'static str { "line_width" }

    fn check(&self, index: usize, slide: &Slide) -> Vec<LayoutViolation> {
        slide
            .lines()
            .enumerate()
            .filter_map(|(line, text)| {
                let width = text.chars().count();
                (width > MAX_COLUMNS).then(|| LayoutViolation {
                    rule: self.name().to_string(),
                    severity: Severity::Warning,
                    slide: index,
                    line: Some(line),
                    message: format!("{} columns, screen fits {}", width, MAX_COLUMNS),
                })
            })
            .collect()
    }
}

pub struct LiteralDelimiterRule;

impl LayoutRule for LiteralDelimiterRule {
    fn name(&self) -> &'static str { "literal_delimiter" }

    fn check(&self, index: usize, slide: &Slide) -> Vec<LayoutViolation> {
        slide
            .lines()
            .enumerate()
            .filter(|(_, text)| text.contains(LITERAL_DELIMITER))
            .map(|(line, _)| LayoutViolation {
                rule: self.name().to_string(),
                severity: Severity::Error,
                slide: index,
                line: Some(line),
                message: format!(
                    "'{}' is not escaped and breaks the generated source",
                    LITERAL_DELIMITER
                ),
            })
            .collect()
    }
}

pub struct ZeroByteRule;

impl LayoutRule for ZeroByteRule {
    fn name(&self) -> &'static str { "zero_byte" }

    fn check(&self, index: usize, slide: &Slide) -> Vec<LayoutViolation> {
        if !slide.text().bytes().any(|b| b == SLIDE_TERMINATOR) {
            return vec![];
        }
        vec![LayoutViolation {
            rule: self.name().to_string(),
            severity: Severity::Error,
            slide: index,
            line: None,
            message: "NUL splits this slide when the deck is saved".to_string(),
        }]
    }
}

/// Runs every rule over every slide.
pub struct LayoutChecker {
    rules: Vec<Box<dyn LayoutRule>>,
}

impl LayoutChecker {
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(LineCountRule),
                Box::new(LineWidthRule),
                Box::new(LiteralDelimiterRule),
                Box::new(ZeroByteRule),
            ],
        }
    }

    pub fn check(&self, deck: &Deck) -> LayoutReport {
        let mut violations = vec![];
        for (index, slide) in deck.iter().enumerate() {
            for rule in &self.rules {
                violations.extend(rule.check(index, slide));
            }
        }
        LayoutReport { violations }
    }
}

impl Default for LayoutChecker {
    fn default() -> Self {
        Self::new()
    }
}
