//! NES Slides Core - Slide Deck Compiler
//!
//! Turns text slides into a ca65 data segment and drives the external
//! make/ca65/ld65 toolchain to produce a ROM.
//!
//! # Pieces
//! 1. `slides` - the deck, never empty
//! 2. `codec` - deck to assembly, deck to/from saved blob
//! 3. `pipeline` - write artifact, make clean, make all
//! 4. `persistence` - deck files on disk

pub mod slides;
pub mod codec;
pub mod layout;
pub mod config;
pub mod toolchain;
pub mod pipeline;
pub mod persistence;
pub mod session;
pub mod hashing;
pub mod logging;

pub use slides::{Deck, Slide, MAX_COLUMNS, MAX_LINES};
pub use codec::{
    decode_binary, encode, encode_binary, encode_binary_versioned, CodecError, FormatVersion,
};
pub use layout::{LayoutChecker, LayoutReport, LayoutViolation, Severity};
pub use config::{BuildConfig, ConfigError};
pub use toolchain::{Invocation, SystemRunner, ToolError, ToolRunner};
pub use pipeline::{
    BuildFailure, BuildPipeline, BuildReport, BuildStage, FailureReason, PipelineError,
};
pub use persistence::{LoadOutcome, PathPicker, PersistError, SaveOutcome, DECK_EXTENSION};
pub use session::{Confirm, Session};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
