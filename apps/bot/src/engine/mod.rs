//! The form-filling decision engine: scanner, rule tables, lexicon,
//! widget appliers, and the tiered resolution pipeline.

pub mod appliers;
pub mod lexicon;
pub mod pipeline;
pub mod rules;
pub mod scanner;

pub use pipeline::{resolve, ResolutionOutcome, ResolutionTier};
pub use rules::{RuleSet, RuleTable};
pub use scanner::{scan, FieldDescriptor, WidgetKind};
