//! PPTX (Office Open XML) backend for Markdown-to-deck conversion.
//!
//! Holds the in-memory [`Deck`] model and its package writer, a reader used
//! for style analysis and template reuse, and the two slide renderers.

pub mod analyzer;
pub mod deck;
pub mod designer;
pub mod generator;
pub mod reader;
pub mod writer;

pub use analyzer::StyleAnalyzer;
pub use deck::{Deck, Shape, Slide};
pub use designer::{DeckDesigner, DesignOptions};
pub use generator::DeckGenerator;
pub use reader::{PptxPackage, PptxReader};
pub use writer::PptxWriter;
