//! Technique model and style expression evaluation.
//!
//! Techniques are the declarative style rules attached to map features.
//! Their fields are literals or JSON expressions evaluated against a
//! feature's attributes and the current zoom level.

pub mod expressions;
pub mod types;

pub use expressions::{evaluate_expression, Env, ExpressionResolver, StyleExpressionResolver};
pub use types::{
    color_from_packed, parse_color_string, FontStyle, FontVariant, HorizontalAlignment,
    StyleValue, Technique, TechniqueName, VerticalAlignment, WrappingMode,
};
