//! Parking Rule Table
//!
//! ## Declaration order (tie-break within a priority)
//! 1. initial_start          HIGH
//! 2. emergency_stop         HIGH
//! 3. slow_down              HIGH
//! 4. straight_search        MEDIUM
//! 5. center_correction      MEDIUM
//! 6. spot_found             MEDIUM
//! 7. approach_spot          MEDIUM
//! 8. stop_for_maneuver      MEDIUM
//! 9. align_parallel         MEDIUM
//! 10. ready_for_reverse     MEDIUM
//! 11. start_reverse         HIGH
//! 12. transition_to_align   HIGH
//! 13. reverse_align         MEDIUM
//! 14. default_stop          LOW
//! 15. parking_complete      MEDIUM
//!
//! Evaluation goes by priority (High first), then by the numbers above.
//! `default_stop` and `parking_complete` together cover every phase, so the
//! table is total on any fact store that has a phase.

use std::cmp::Reverse;

use once_cell::sync::Lazy;

use super::types::{
    Action, CmpOp, ConfigParam, Expr, Predicate, Priority, Rule, SpotField, VehicleDim,
};
use crate::facts::Fact;
use crate::phase::Phase;

/// Obstacle distance that forces an emergency stop.
const EMERGENCY_DISTANCE: f32 = 30.0;
/// Obstacle distance that halves the throttle.
const SLOW_DOWN_DISTANCE: f32 = 100.0;
/// Before this x the car just drives off the start line.
const INITIAL_START_X: f32 = 300.0;
/// Lateral sensor imbalance that triggers centring.
const CENTERING_IMBALANCE: f32 = 50.0;
/// Heading at which the right-lock reverse hands over to counter-steer.
const REVERSE_SWITCH_ANGLE: f32 = -35.0;
const ALIGN_TRIGGER_ANGLE: f32 = -30.0;

/// The compiled rule table plus its evaluation order.
#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: Vec<Rule>,
    order: Vec<usize>,
}

impl RuleTable {
    pub fn new(rules: Vec<Rule>) -> Self {
        let mut order: Vec<usize> = (0..rules.len()).collect();
        // stable sort keeps declaration order within a priority
        order.sort_by_key(|&i| Reverse(rules[i].priority));
        Self { rules, order }
    }

    /// Rules in declaration order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Rules in evaluation order.
    pub fn in_evaluation_order(&self) -> impl Iterator<Item = &Rule> + '_ {
        self.order.iter().map(move |&i| &self.rules[i])
    }

    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Built once, shared by every engine.
pub static RULE_TABLE: Lazy<RuleTable> = Lazy::new(|| RuleTable::new(parking_rules()));

fn max_speed() -> Expr {
    Expr::config(ConfigParam::MaxSpeed)
}

fn max_reverse() -> Expr {
    Expr::config(ConfigParam::MaxReverseSpeed)
}

/// Signed distance of the car from the parking lane, `car_y − (spot.y − 1.5 × width)`.
fn lane_offset() -> Expr {
    Expr::fact(Fact::CarY) - (Expr::spot(SpotField::Y) - Expr::vehicle(VehicleDim::Width) * 1.5)
}

/// x at which the car should stop before reversing, `spot.x + 1.5 × length`.
fn maneuver_x() -> Expr {
    Expr::spot(SpotField::X) + Expr::vehicle(VehicleDim::Length) * 1.5
}

fn stop() -> Action {
    Action { throttle: Expr::Const(0.0), steering: Expr::Const(0.0), emergency: false, reasoning: "" }
}

/// Straight ahead at `fraction × max_speed`.
fn cruise(fraction: f32, reasoning: &'static str) -> Action {
    Action { throttle: max_speed() * fraction, steering: Expr::Const(0.0), emergency: false, reasoning }
}

/// The parallel-parking rule table, in declaration order.
pub fn parking_rules() -> Vec<Rule> {
    vec![
        Rule {
            id: "initial_start",
            name: "Initial Start",
            priority: Priority::High,
            predicates: vec![
                Predicate::PhaseIs(Phase::Searching),
                Predicate::fact(Fact::CarX, CmpOp::Lt, INITIAL_START_X),
            ],
            action: cruise(0.7, "Starting the search, driving forward"),
            description: "Drive off the start line into the search lane",
        },
        Rule {
            id: "emergency_stop",
            name: "Emergency Stop",
            priority: Priority::High,
            predicates: vec![
                Predicate::fact(Fact::FrontSensor, CmpOp::Lt, EMERGENCY_DISTANCE),
                Predicate::fact(Fact::Throttle, CmpOp::Gt, 0.0),
            ],
            action: Action {
                emergency: true,
                reasoning: "Emergency stop: obstacle directly ahead",
                ..stop()
            },
            description: "Stop immediately when an obstacle is too close ahead",
        },
        Rule {
            id: "slow_down",
            name: "Slow Down",
            priority: Priority::High,
            predicates: vec![
                Predicate::fact(Fact::FrontSensor, CmpOp::Lt, SLOW_DOWN_DISTANCE),
                Predicate::fact(Fact::Throttle, CmpOp::Gt, 0.0),
            ],
            action: Action {
                throttle: Expr::fact(Fact::Throttle) * 0.5,
                reasoning: "Obstacle ahead, slowing down",
                ..stop()
            },
            description: "Halve the throttle when approaching an obstacle",
        },
        Rule {
            id: "straight_search",
            name: "Straight Search",
            priority: Priority::Medium,
            predicates: vec![Predicate::PhaseIs(Phase::Searching), Predicate::NoSpotSelected],
            action: cruise(0.7, "Searching for a parking spot"),
            description: "Keep driving straight while no spot is selected",
        },
        Rule {
            id: "center_correction",
            name: "Center Correction",
            priority: Priority::Medium,
            predicates: vec![
                Predicate::PhaseIs(Phase::Searching),
                Predicate::AbsDiffExceeds {
                    a: Fact::LeftSensor,
                    b: Fact::RightSensor,
                    threshold: CENTERING_IMBALANCE,
                },
            ],
            action: Action {
                steering: (Expr::fact(Fact::RightSensor) - Expr::fact(Fact::LeftSensor)) * 0.01,
                ..cruise(0.7, "Correcting toward the lane centre")
            },
            description: "Steer away from the closer side",
        },
        Rule {
            id: "spot_found",
            name: "Spot Found",
            priority: Priority::Medium,
            predicates: vec![
                Predicate::PhaseIs(Phase::Searching),
                Predicate::SpotSelected,
                Predicate::compare(Expr::fact(Fact::CarX), CmpOp::Lt, Expr::spot(SpotField::X) - 100.0),
            ],
            action: cruise(0.6, "Parking spot found, heading for it"),
            description: "Ease off once a spot ahead has been selected",
        },
        Rule {
            id: "approach_spot",
            name: "Approach Spot",
            priority: Priority::Medium,
            predicates: vec![
                Predicate::PhaseIs(Phase::Approach),
                Predicate::SpotSelected,
                Predicate::compare(Expr::fact(Fact::CarX), CmpOp::Lt, maneuver_x()),
            ],
            action: Action {
                throttle: max_speed() * 0.5,
                steering: -lane_offset() * 0.008,
                emergency: false,
                reasoning: "Approaching the spot, holding the lane",
            },
            description: "Drive past the spot while tracking the parking lane",
        },
        Rule {
            id: "stop_for_maneuver",
            name: "Stop For Maneuver",
            priority: Priority::Medium,
            predicates: vec![
                Predicate::PhaseIs(Phase::Approach),
                Predicate::SpotSelected,
                Predicate::compare(Expr::fact(Fact::CarX), CmpOp::Ge, maneuver_x() - 40.0),
                Predicate::compare(Expr::fact(Fact::CarX), CmpOp::Le, maneuver_x() + 40.0),
            ],
            action: Action { reasoning: "In position, stopping for the maneuver", ..stop() },
            description: "Stop alongside the car ahead of the spot",
        },
        Rule {
            id: "align_parallel",
            name: "Align Parallel",
            priority: Priority::Medium,
            predicates: vec![
                Predicate::PhaseIs(Phase::Positioning),
                Predicate::SpotSelected,
                Predicate::AnyOf(vec![
                    Predicate::compare(Expr::fact(Fact::CarAngle).abs(), CmpOp::Gt, Expr::Const(2.0)),
                    Predicate::compare(lane_offset().abs(), CmpOp::Gt, Expr::Const(15.0)),
                ]),
            ],
            action: Action {
                throttle: max_speed() * 0.3,
                steering: -Expr::fact(Fact::CarAngle) * 0.15 - lane_offset() * 0.01,
                emergency: false,
                reasoning: "Aligning parallel to the curb",
            },
            description: "Straighten up and close the lane gap before reversing",
        },
        Rule {
            id: "ready_for_reverse",
            name: "Ready For Reverse",
            priority: Priority::Medium,
            predicates: vec![
                Predicate::PhaseIs(Phase::Positioning),
                Predicate::SpotSelected,
                Predicate::compare(Expr::fact(Fact::CarAngle).abs(), CmpOp::Lt, Expr::Const(3.0)),
                Predicate::compare(lane_offset().abs(), CmpOp::Lt, Expr::Const(15.0)),
                Predicate::fact(Fact::FrontRightSensor, CmpOp::Lt, 120.0),
            ],
            action: Action { reasoning: "Aligned, ready to reverse", ..stop() },
            description: "Hold still once parallel and beside the leading car",
        },
        Rule {
            id: "start_reverse",
            name: "Start Reverse",
            priority: Priority::High,
            predicates: vec![
                Predicate::PhaseIs(Phase::ReverseRight),
                Predicate::fact(Fact::CarAngle, CmpOp::Gt, REVERSE_SWITCH_ANGLE),
            ],
            action: Action {
                throttle: -(max_reverse() * 0.3),
                steering: Expr::Const(20.0),
                emergency: false,
                reasoning: "Reversing with right lock into the spot",
            },
            description: "Swing the rear into the spot",
        },
        Rule {
            id: "transition_to_align",
            name: "Transition To Align",
            priority: Priority::High,
            predicates: vec![
                Predicate::PhaseIs(Phase::ReverseRight),
                Predicate::fact(Fact::CarAngle, CmpOp::Le, ALIGN_TRIGGER_ANGLE),
            ],
            action: Action {
                throttle: -(max_reverse() * 0.2),
                reasoning: "Deep enough, straightening the wheels",
                ..stop()
            },
            description: "Stop steering once the heading is deep enough",
        },
        Rule {
            id: "reverse_align",
            name: "Reverse Align",
            priority: Priority::Medium,
            predicates: vec![
                Predicate::PhaseIs(Phase::ReverseLeft),
                Predicate::compare(Expr::fact(Fact::CarAngle).abs(), CmpOp::Gt, Expr::Const(3.0)),
            ],
            action: Action {
                throttle: -(max_reverse() * 0.25),
                steering: Expr::Const(-12.0) - Expr::fact(Fact::CarAngle) * 0.1,
                emergency: false,
                reasoning: "Counter-steering to straighten in the spot",
            },
            description: "Bring the heading back to zero while reversing",
        },
        Rule {
            id: "default_stop",
            name: "Default Stop",
            priority: Priority::Low,
            predicates: vec![Predicate::PhaseIsNot(Phase::Parked)],
            action: Action { reasoning: "No specific action, holding position", ..stop() },
            description: "Fallback when nothing else applies",
        },
        Rule {
            id: "parking_complete",
            name: "Parking Complete",
            priority: Priority::Medium,
            predicates: vec![Predicate::PhaseIs(Phase::Parked)],
            action: Action { reasoning: "Parking complete", ..stop() },
            description: "Stay put once parked",
        },
    ]
}
