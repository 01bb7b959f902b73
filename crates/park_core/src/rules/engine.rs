//! Rule Engine
//!
//! Selects the first matching rule in evaluation order and turns its action
//! into a [`Decision`]. Inference is a pure function of the fact store and
//! the configuration: no clock, no randomness, no hidden state.

use tracing::{debug, warn};

use super::table::{RuleTable, RULE_TABLE};
use super::types::{Decision, EvalContext, Expr, Rule};
use crate::config::{ParkingConfig, SimConfig, VehicleConfig};
use crate::facts::{Fact, FactStore};

#[derive(Debug, Clone)]
pub struct RuleEngine<'t> {
    table: &'t RuleTable,
    config: ParkingConfig,
    vehicle: VehicleConfig,
}

impl RuleEngine<'static> {
    /// Engine over the shared parking rule table.
    pub fn new(config: &SimConfig) -> Self {
        Self::with_table(&RULE_TABLE, config)
    }
}

impl<'t> RuleEngine<'t> {
    pub fn with_table(table: &'t RuleTable, config: &SimConfig) -> Self {
        Self { table, config: config.parking.clone(), vehicle: config.vehicle.clone() }
    }

    pub fn table(&self) -> &'t RuleTable {
        self.table
    }

    fn context<'f, 'a>(&'f self, facts: &'f FactStore<'a>) -> EvalContext<'f, 'a> {
        EvalContext { facts, config: &self.config, vehicle: &self.vehicle }
    }

    /// First rule, in evaluation order, whose predicates all hold.
    pub fn select(&self, facts: &FactStore<'_>) -> Option<&'t Rule> {
        let ctx = self.context(facts);
        self.table.in_evaluation_order().find(|rule| rule.matches(&ctx))
    }

    /// Decide this tick's controls.
    ///
    /// Falls back to [`Decision::waiting`] when no rule matches. An action
    /// expression that cannot be evaluated keeps the previous tick's value
    /// for that control.
    pub fn infer(&self, facts: &FactStore<'_>) -> Decision {
        let Some(rule) = self.select(facts) else {
            warn!(phase = %facts.phase(), "no rule matched, waiting");
            return Decision::waiting();
        };

        let ctx = self.context(facts);
        let throttle = eval_or_previous(&rule.action.throttle, &ctx, Fact::Throttle, rule.id);
        let steering = eval_or_previous(&rule.action.steering, &ctx, Fact::Steering, rule.id);

        debug!(
            rule = rule.id,
            phase = %facts.phase(),
            throttle,
            steering,
            emergency = rule.action.emergency,
            "rule selected"
        );

        Decision {
            throttle,
            steering,
            reasoning: rule.action.reasoning.to_string(),
            emergency: rule.action.emergency,
            rule_id: rule.id.to_string(),
        }
    }
}

fn eval_or_previous(expr: &Expr, ctx: &EvalContext<'_, '_>, previous: Fact, rule: &str) -> f32 {
    expr.eval(ctx).unwrap_or_else(|| {
        let fallback = ctx.facts.get(previous).unwrap_or(0.0);
        warn!(rule, control = previous.name(), fallback, "action expression unevaluable");
        fallback
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lot::ParkingSpot;
    use crate::phase::Phase;
    use crate::rules::types::{Action, CmpOp, ConfigParam, Predicate, Priority, SpotField};
    use proptest::prelude::*;

    fn engine() -> RuleEngine<'static> {
        RuleEngine::new(&SimConfig::deterministic_test())
    }

    fn searching_at(x: f32) -> FactStore<'static> {
        FactStore::baseline(Phase::Searching, 400.0).with(Fact::CarX, x).with(Fact::CarY, 500.0)
    }

    #[test]
    fn initial_start_near_origin() {
        let d = engine().infer(&searching_at(250.0).with(Fact::Throttle, 0.0));
        assert_eq!(d.rule_id, "initial_start");
        assert!((d.throttle - 1.75).abs() < 1e-5);
        assert_eq!(d.steering, 0.0);
        assert!(!d.emergency);
    }

    #[test]
    fn straight_search_without_spot() {
        let d = engine().infer(&searching_at(320.0));
        assert_eq!(d.rule_id, "straight_search");
        assert!((d.throttle - 1.75).abs() < 1e-5);
    }

    #[test]
    fn emergency_stop_beats_everything_else() {
        let facts = searching_at(500.0).with(Fact::FrontSensor, 25.0).with(Fact::Throttle, 1.0);
        let d = engine().infer(&facts);
        assert_eq!(d.rule_id, "emergency_stop");
        assert!(d.emergency);
        assert_eq!(d.throttle, 0.0);
        assert_eq!(d.steering, 0.0);
    }

    #[test]
    fn obstacle_without_forward_throttle_is_not_an_emergency() {
        let facts = searching_at(500.0).with(Fact::FrontSensor, 25.0).with(Fact::Throttle, 0.0);
        let d = engine().infer(&facts);
        assert_eq!(d.rule_id, "straight_search");
    }

    #[test]
    fn slow_down_halves_previous_throttle() {
        let facts = searching_at(500.0).with(Fact::FrontSensor, 80.0).with(Fact::Throttle, 1.5);
        let d = engine().infer(&facts);
        assert_eq!(d.rule_id, "slow_down");
        assert!((d.throttle - 0.75).abs() < 1e-6);
    }

    #[test]
    fn start_reverse_while_shallow() {
        let facts = FactStore::baseline(Phase::ReverseRight, 400.0).with(Fact::CarAngle, -10.0);
        let d = engine().infer(&facts);
        assert_eq!(d.rule_id, "start_reverse");
        assert!((d.throttle + 0.45).abs() < 1e-6);
        assert_eq!(d.steering, 20.0);
    }

    #[test]
    fn start_reverse_shadows_align_until_minus_35() {
        // both rules match in (-35, -30]; declaration order keeps start_reverse
        let facts = FactStore::baseline(Phase::ReverseRight, 400.0).with(Fact::CarAngle, -31.0);
        assert_eq!(engine().infer(&facts).rule_id, "start_reverse");

        let facts = FactStore::baseline(Phase::ReverseRight, 400.0).with(Fact::CarAngle, -35.0);
        let d = engine().infer(&facts);
        assert_eq!(d.rule_id, "transition_to_align");
        assert!((d.throttle + 0.3).abs() < 1e-6);
        assert_eq!(d.steering, 0.0);
    }

    #[test]
    fn approach_steers_toward_lane() {
        let spot = ParkingSpot::new(700.0, 550.0);
        // lane y = 550 - 60 = 490, car 10 below it
        let facts = FactStore::baseline(Phase::Approach, 400.0)
            .with(Fact::CarX, 700.0)
            .with(Fact::CarY, 500.0)
            .with_spot(Some(&spot));
        let d = engine().infer(&facts);
        assert_eq!(d.rule_id, "approach_spot");
        assert!((d.throttle - 1.25).abs() < 1e-6);
        assert!((d.steering + 0.08).abs() < 1e-5);
    }

    #[test]
    fn stop_for_maneuver_window() {
        let spot = ParkingSpot::new(700.0, 550.0);
        // maneuver x = 700 + 120 = 820; approach_spot stops matching at 820
        let facts = FactStore::baseline(Phase::Approach, 400.0)
            .with(Fact::CarX, 830.0)
            .with(Fact::CarY, 490.0)
            .with_spot(Some(&spot));
        assert_eq!(engine().infer(&facts).rule_id, "stop_for_maneuver");

        let facts = facts.with(Fact::CarX, 900.0);
        assert_eq!(engine().infer(&facts).rule_id, "default_stop");
    }

    #[test]
    fn positioning_aligns_then_waits() {
        let spot = ParkingSpot::new(700.0, 550.0);
        let facts = FactStore::baseline(Phase::Positioning, 400.0)
            .with(Fact::CarX, 800.0)
            .with(Fact::CarY, 490.0)
            .with(Fact::CarAngle, 4.0)
            .with_spot(Some(&spot));
        let d = engine().infer(&facts);
        assert_eq!(d.rule_id, "align_parallel");
        assert!((d.steering + 0.6).abs() < 1e-5);

        let facts = facts.with(Fact::CarAngle, 1.0).with(Fact::FrontRightSensor, 100.0);
        assert_eq!(engine().infer(&facts).rule_id, "ready_for_reverse");
    }

    #[test]
    fn reverse_align_counter_steers() {
        let facts = FactStore::baseline(Phase::ReverseLeft, 400.0).with(Fact::CarAngle, -20.0);
        let d = engine().infer(&facts);
        assert_eq!(d.rule_id, "reverse_align");
        assert!((d.throttle + 0.375).abs() < 1e-6);
        assert!((d.steering + 10.0).abs() < 1e-5);
    }

    #[test]
    fn every_phase_gets_a_rule_on_baseline_facts() {
        let engine = engine();
        for phase in Phase::ALL {
            let d = engine.infer(&FactStore::baseline(phase, 400.0));
            assert_ne!(d.rule_id, Decision::NO_RULE, "no rule for {phase}");
        }
        assert_eq!(engine.infer(&FactStore::new(Phase::Parked)).rule_id, "parking_complete");
        assert_eq!(engine.infer(&FactStore::new(Phase::Aborted)).rule_id, "default_stop");
    }

    #[test]
    fn inference_is_deterministic() {
        let engine = engine();
        let facts = searching_at(420.0).with(Fact::LeftSensor, 100.0).with(Fact::RightSensor, 300.0);
        let first = engine.infer(&facts);
        for _ in 0..10 {
            assert_eq!(engine.infer(&facts), first);
        }
    }

    #[test]
    fn empty_table_waits() {
        let table = RuleTable::new(Vec::new());
        let engine = RuleEngine::with_table(&table, &SimConfig::default());
        assert_eq!(engine.infer(&searching_at(500.0)), Decision::waiting());
    }

    #[test]
    fn unevaluable_action_keeps_previous_controls() {
        let rule = Rule {
            id: "needs_spot",
            name: "Needs Spot",
            priority: Priority::High,
            predicates: vec![Predicate::fact(Fact::CarX, CmpOp::Gt, 0.0)],
            action: Action {
                throttle: Expr::spot(SpotField::X) * 0.01,
                steering: Expr::config(ConfigParam::SteeringSensitivity),
                emergency: false,
                reasoning: "test",
            },
            description: "",
        };
        let table = RuleTable::new(vec![rule]);
        let engine = RuleEngine::with_table(&table, &SimConfig::default());

        let d = engine.infer(&searching_at(500.0).with(Fact::Throttle, 0.9));
        assert_eq!(d.rule_id, "needs_spot");
        assert_eq!(d.throttle, 0.9);
        assert!((d.steering - 0.3).abs() < 1e-6);

        // no previous value at all
        let d = engine.infer(&FactStore::new(Phase::Searching).with(Fact::CarX, 1.0));
        assert_eq!(d.throttle, 0.0);
    }

    #[test]
    fn select_reports_without_building_decision() {
        let engine = engine();
        let rule = engine.select(&FactStore::baseline(Phase::PrepareReverse, 400.0));
        assert_eq!(rule.map(|r| r.id), Some("default_stop"));
    }

    proptest! {
        #[test]
        fn prop_inference_is_total_and_repeatable(
            phase_idx in 0usize..Phase::ALL.len(),
            x in 0.0f32..1400.0,
            y in 400.0f32..650.0,
            angle in -90.0f32..90.0,
            front in 0.0f32..400.0,
            left in 0.0f32..400.0,
            right in 0.0f32..400.0,
            throttle in -2.0f32..3.0,
            with_spot in any::<bool>(),
        ) {
            let spot = ParkingSpot::new(700.0, 550.0);
            let facts = FactStore::baseline(Phase::ALL[phase_idx], 400.0)
                .with(Fact::CarX, x)
                .with(Fact::CarY, y)
                .with(Fact::CarAngle, angle)
                .with(Fact::FrontSensor, front)
                .with(Fact::LeftSensor, left)
                .with(Fact::RightSensor, right)
                .with(Fact::Throttle, throttle)
                .with(Fact::Steering, 0.0)
                .with_spot(with_spot.then_some(&spot));

            let engine = engine();
            let first = engine.infer(&facts);
            prop_assert_ne!(first.rule_id.as_str(), Decision::NO_RULE);
            prop_assert!(first.throttle.is_finite() && first.steering.is_finite());
            prop_assert_eq!(engine.infer(&facts), first);
        }
    }
}
