//! Declarative rule documents for extracting structured records from HTML pages.
//!
//! A raw document is validated once into an immutable [`RuleDocument`], then
//! evaluated against any number of page trees through a [`dom::SelectorAdapter`].

pub mod config;
pub mod dom;
pub mod evaluator;
pub mod redirect;
pub mod registry;
pub mod schema;

pub use evaluator::{
    EvaluationError, Extraction, ExtractionError, ExtractionRecord, ExtractionValue,
    evaluate_document,
};
pub use redirect::resolve_redirect;
pub use registry::{ParserRegistry, RegistryError};
pub use schema::{RuleDocument, ValidationError, validate};
