//! Scoring rules: the typed rule set and the evaluator that applies it.

pub mod evaluator;
pub mod ruleset;

pub use evaluator::BonusEvaluator;
pub use ruleset::{
    labels, overlay, PointsDistribution, RawRuleValue, RuleSet, RuleSetBuild, RuleTable,
    RuleValue, RuleWarning,
};
