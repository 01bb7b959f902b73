//! Rule System Types
//!
//! Rules are plain data: predicates and action expressions are closed enums
//! evaluated by a small interpreter. Nothing here can execute arbitrary code.

use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

use crate::config::{ParkingConfig, VehicleConfig};
use crate::facts::{Fact, FactStore};
use crate::phase::Phase;

// ============================================================================
// Priority
// ============================================================================

/// Rule priority. Higher wins; equal priorities fall back to declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    Low = 1,
    Medium = 2,
    High = 3,
}

impl Priority {
    pub fn value(self) -> u8 {
        self as u8
    }
}

// ============================================================================
// Evaluation context
// ============================================================================

/// Everything an expression may read.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'f, 'a> {
    pub facts: &'f FactStore<'a>,
    pub config: &'f ParkingConfig,
    pub vehicle: &'f VehicleConfig,
}

// ============================================================================
// Expressions
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigParam {
    MaxSpeed,
    MaxReverseSpeed,
    SafetyMargin,
    SteeringSensitivity,
    SensorRange,
    TurnRadiusRatio,
}

impl ConfigParam {
    fn read(self, cfg: &ParkingConfig) -> f32 {
        match self {
            ConfigParam::MaxSpeed => cfg.max_speed,
            ConfigParam::MaxReverseSpeed => cfg.max_reverse_speed,
            ConfigParam::SafetyMargin => cfg.safety_margin,
            ConfigParam::SteeringSensitivity => cfg.steering_sensitivity,
            ConfigParam::SensorRange => cfg.sensor_range,
            ConfigParam::TurnRadiusRatio => cfg.turn_radius_ratio,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VehicleDim {
    Length,
    Width,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpotField {
    X,
    Y,
    Width,
    Length,
}

/// Arithmetic over facts, config, and vehicle dimensions.
///
/// Evaluation yields `None` when a referenced fact or the selected spot is absent.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Const(f32),
    Fact(Fact),
    Config(ConfigParam),
    Vehicle(VehicleDim),
    Spot(SpotField),
    Neg(Box<Expr>),
    Abs(Box<Expr>),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn fact(fact: Fact) -> Self {
        Expr::Fact(fact)
    }

    pub fn config(param: ConfigParam) -> Self {
        Expr::Config(param)
    }

    pub fn vehicle(dim: VehicleDim) -> Self {
        Expr::Vehicle(dim)
    }

    pub fn spot(field: SpotField) -> Self {
        Expr::Spot(field)
    }

    pub fn abs(self) -> Self {
        Expr::Abs(Box::new(self))
    }

    pub fn eval(&self, ctx: &EvalContext<'_, '_>) -> Option<f32> {
        let value = match self {
            Expr::Const(v) => *v,
            Expr::Fact(f) => ctx.facts.get(*f)?,
            Expr::Config(p) => p.read(ctx.config),
            Expr::Vehicle(VehicleDim::Length) => ctx.vehicle.length,
            Expr::Vehicle(VehicleDim::Width) => ctx.vehicle.width,
            Expr::Spot(field) => {
                let spot = ctx.facts.selected_spot()?;
                match field {
                    SpotField::X => spot.x,
                    SpotField::Y => spot.y,
                    SpotField::Width => spot.width,
                    SpotField::Length => spot.length,
                }
            }
            Expr::Neg(e) => -e.eval(ctx)?,
            Expr::Abs(e) => e.eval(ctx)?.abs(),
            Expr::Add(a, b) => a.eval(ctx)? + b.eval(ctx)?,
            Expr::Sub(a, b) => a.eval(ctx)? - b.eval(ctx)?,
            Expr::Mul(a, b) => a.eval(ctx)? * b.eval(ctx)?,
        };
        value.is_finite().then_some(value)
    }
}

impl From<f32> for Expr {
    fn from(v: f32) -> Self {
        Expr::Const(v)
    }
}

macro_rules! impl_binary_op {
    ($trait:ident, $method:ident, $variant:ident) => {
        impl $trait<Expr> for Expr {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                Expr::$variant(Box::new(self), Box::new(rhs))
            }
        }

        impl $trait<f32> for Expr {
            type Output = Expr;
            fn $method(self, rhs: f32) -> Expr {
                Expr::$variant(Box::new(self), Box::new(Expr::Const(rhs)))
            }
        }
    };
}

impl_binary_op!(Add, add, Add);
impl_binary_op!(Sub, sub, Sub);
impl_binary_op!(Mul, mul, Mul);

impl Neg for Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        Expr::Neg(Box::new(self))
    }
}

// ============================================================================
// Predicates
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CmpOp {
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    pub fn apply(self, lhs: f32, rhs: f32) -> bool {
        match self {
            CmpOp::Lt => lhs < rhs,
            CmpOp::Le => lhs <= rhs,
            CmpOp::Gt => lhs > rhs,
            CmpOp::Ge => lhs >= rhs,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
        }
    }
}

/// One condition of a rule. Never panics; anything unevaluable is false.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    PhaseIs(Phase),
    PhaseIsNot(Phase),
    SpotSelected,
    NoSpotSelected,
    Compare { lhs: Expr, op: CmpOp, rhs: Expr },
    /// `|a − b| > threshold`
    AbsDiffExceeds { a: Fact, b: Fact, threshold: f32 },
    /// Logical OR of the inner predicates.
    AnyOf(Vec<Predicate>),
}

impl Predicate {
    pub fn compare(lhs: Expr, op: CmpOp, rhs: Expr) -> Self {
        Predicate::Compare { lhs, op, rhs }
    }

    /// `fact <op> value`
    pub fn fact(fact: Fact, op: CmpOp, value: f32) -> Self {
        Predicate::Compare { lhs: Expr::Fact(fact), op, rhs: Expr::Const(value) }
    }

    pub fn holds(&self, ctx: &EvalContext<'_, '_>) -> bool {
        match self {
            Predicate::PhaseIs(p) => ctx.facts.phase() == *p,
            Predicate::PhaseIsNot(p) => ctx.facts.phase() != *p,
            Predicate::SpotSelected => ctx.facts.selected_spot().is_some(),
            Predicate::NoSpotSelected => ctx.facts.selected_spot().is_none(),
            Predicate::Compare { lhs, op, rhs } => match (lhs.eval(ctx), rhs.eval(ctx)) {
                (Some(l), Some(r)) => op.apply(l, r),
                _ => false,
            },
            Predicate::AbsDiffExceeds { a, b, threshold } => {
                match (ctx.facts.get(*a), ctx.facts.get(*b)) {
                    (Some(a), Some(b)) => (a - b).abs() > *threshold,
                    _ => false,
                }
            }
            Predicate::AnyOf(options) => options.iter().any(|p| p.holds(ctx)),
        }
    }
}

// ============================================================================
// Rules and decisions
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub throttle: Expr,
    pub steering: Expr,
    pub emergency: bool,
    pub reasoning: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    /// Stable identifier reported in decisions.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    pub priority: Priority,
    /// All must hold (AND), checked in order.
    pub predicates: Vec<Predicate>,
    pub action: Action,
    pub description: &'static str,
}

impl Rule {
    /// Short-circuits at the first false predicate.
    pub fn matches(&self, ctx: &EvalContext<'_, '_>) -> bool {
        self.predicates.iter().all(|p| p.holds(ctx))
    }
}

/// Per-tick control output with provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub throttle: f32,
    /// Degrees.
    pub steering: f32,
    pub reasoning: String,
    pub emergency: bool,
    pub rule_id: String,
}

impl Decision {
    pub const NO_RULE: &'static str = "none";

    /// Fallback when nothing matched.
    pub fn waiting() -> Self {
        Self {
            throttle: 0.0,
            steering: 0.0,
            reasoning: "waiting".to_string(),
            emergency: false,
            rule_id: Self::NO_RULE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lot::ParkingSpot;

    fn ctx<'f, 'a>(facts: &'f FactStore<'a>, config: &'f ParkingConfig, vehicle: &'f VehicleConfig) -> EvalContext<'f, 'a> {
        EvalContext { facts, config, vehicle }
    }

    #[test]
    fn priority_ordering() {
        assert!(Priority::High > Priority::Medium);
        assert!(Priority::Medium > Priority::Low);
        assert_eq!(Priority::High.value(), 3);
    }

    #[test]
    fn expression_arithmetic() {
        let config = ParkingConfig::default();
        let vehicle = VehicleConfig::default();
        let facts = FactStore::new(Phase::Searching).with(Fact::CarY, 500.0);
        let c = ctx(&facts, &config, &vehicle);

        let e = Expr::config(ConfigParam::MaxSpeed) * 0.7;
        assert!((e.eval(&c).unwrap() - 1.75).abs() < 1e-5);

        let e = -(Expr::config(ConfigParam::MaxReverseSpeed) * 0.3);
        assert!((e.eval(&c).unwrap() + 0.45).abs() < 1e-5);

        let e = Expr::fact(Fact::CarY) - Expr::vehicle(VehicleDim::Width) * 1.5;
        assert!((e.eval(&c).unwrap() - 440.0).abs() < 1e-4);
    }

    #[test]
    fn missing_inputs_make_expressions_unevaluable() {
        let config = ParkingConfig::default();
        let vehicle = VehicleConfig::default();
        let facts = FactStore::new(Phase::Searching);
        let c = ctx(&facts, &config, &vehicle);

        assert_eq!(Expr::fact(Fact::CarX).eval(&c), None);
        assert_eq!((Expr::spot(SpotField::X) + 1.0).eval(&c), None);
    }

    #[test]
    fn non_finite_results_are_rejected() {
        let config = ParkingConfig::default();
        let vehicle = VehicleConfig::default();
        let facts = FactStore::new(Phase::Searching).with(Fact::CarX, f32::MAX);
        let c = ctx(&facts, &config, &vehicle);
        assert_eq!((Expr::fact(Fact::CarX) * 10.0).eval(&c), None);
    }

    #[test]
    fn predicates_on_missing_facts_are_false() {
        let config = ParkingConfig::default();
        let vehicle = VehicleConfig::default();
        let facts = FactStore::new(Phase::Searching);
        let c = ctx(&facts, &config, &vehicle);

        assert!(!Predicate::fact(Fact::FrontSensor, CmpOp::Lt, 30.0).holds(&c));
        // the negated comparison is false as well, not true
        assert!(!Predicate::fact(Fact::FrontSensor, CmpOp::Ge, 30.0).holds(&c));
        assert!(!Predicate::AbsDiffExceeds { a: Fact::LeftSensor, b: Fact::RightSensor, threshold: 50.0 }
            .holds(&c));
    }

    #[test]
    fn spot_predicates() {
        let config = ParkingConfig::default();
        let vehicle = VehicleConfig::default();
        let spot = ParkingSpot::new(400.0, 550.0);

        let none = FactStore::new(Phase::Searching);
        assert!(Predicate::NoSpotSelected.holds(&ctx(&none, &config, &vehicle)));
        assert!(!Predicate::SpotSelected.holds(&ctx(&none, &config, &vehicle)));

        let some = FactStore::new(Phase::Searching).with_spot(Some(&spot));
        assert!(Predicate::SpotSelected.holds(&ctx(&some, &config, &vehicle)));
    }

    #[test]
    fn any_of_is_disjunction() {
        let config = ParkingConfig::default();
        let vehicle = VehicleConfig::default();
        let facts = FactStore::new(Phase::Positioning).with(Fact::CarAngle, 1.0);
        let c = ctx(&facts, &config, &vehicle);

        let p = Predicate::AnyOf(vec![
            Predicate::compare(Expr::fact(Fact::CarAngle).abs(), CmpOp::Gt, Expr::Const(2.0)),
            Predicate::PhaseIs(Phase::Positioning),
        ]);
        assert!(p.holds(&c));
        assert!(!Predicate::AnyOf(vec![]).holds(&c));
    }

    #[test]
    fn abs_diff_threshold_is_strict() {
        let config = ParkingConfig::default();
        let vehicle = VehicleConfig::default();
        let facts =
            FactStore::new(Phase::Searching).with(Fact::LeftSensor, 100.0).with(Fact::RightSensor, 150.0);
        let c = ctx(&facts, &config, &vehicle);
        let p = Predicate::AbsDiffExceeds { a: Fact::LeftSensor, b: Fact::RightSensor, threshold: 50.0 };
        assert!(!p.holds(&c));
    }
}
