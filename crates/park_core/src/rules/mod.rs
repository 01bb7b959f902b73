//! Rule System
//!
//! Declarative driving rules for the parking maneuver.
//!
//! ## Structure
//! - `types`: predicate/expression interpreter, [`Rule`], [`Decision`]
//! - `table`: the fixed parking rule table and its evaluation order
//! - `engine`: [`RuleEngine`], picks the winning rule for a fact store
//!
//! ## Selection
//! Highest [`Priority`] wins; ties go to the rule declared first. The table
//! always contains a catch-all, so every phase yields a decision.

pub mod engine;
pub mod table;
pub mod types;

pub use engine::RuleEngine;
pub use table::{parking_rules, RuleTable, RULE_TABLE};
pub use types::{
    Action, CmpOp, ConfigParam, Decision, EvalContext, Expr, Predicate, Priority, Rule, SpotField,
    VehicleDim,
};
