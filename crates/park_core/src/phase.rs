//! Maneuver Phase State Machine
//!
//! Sequences the parking maneuver from road search to final alignment.
//! Automatic transitions come from a fixed table, checked once per tick after
//! the vehicle has moved. Every transition (automatic or manual) zeroes the
//! phase timer.
//!
//! ```text
//! SEARCHING ─▶ APPROACH ─▶ POSITIONING ─▶ PREPARE_REVERSE ─▶ REVERSE_RIGHT
//!                                                                 │
//!                          PARKED ◀─ FINAL_ADJUST ◀─ REVERSE_LEFT ◀┘
//! ```
//!
//! ABORTED is only reachable through [`PhaseStateMachine::abort`].

use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Searching,
    Approach,
    Positioning,
    PrepareReverse,
    ReverseRight,
    ReverseLeft,
    FinalAdjust,
    Parked,
    Aborted,
}

impl Phase {
    /// Declaration order; manual advance walks this list.
    pub const ALL: [Phase; 9] = [
        Phase::Searching,
        Phase::Approach,
        Phase::Positioning,
        Phase::PrepareReverse,
        Phase::ReverseRight,
        Phase::ReverseLeft,
        Phase::FinalAdjust,
        Phase::Parked,
        Phase::Aborted,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Searching => "searching",
            Phase::Approach => "approach",
            Phase::Positioning => "positioning",
            Phase::PrepareReverse => "prepare_reverse",
            Phase::ReverseRight => "reverse_right",
            Phase::ReverseLeft => "reverse_left",
            Phase::FinalAdjust => "final_adjust",
            Phase::Parked => "parked",
            Phase::Aborted => "aborted",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Parked | Phase::Aborted)
    }

    /// Successor for the manual trigger.
    ///
    /// The cycle length excludes the last phase, so PARKED wraps to SEARCHING
    /// and ABORTED lands on APPROACH.
    pub fn manual_successor(self) -> Phase {
        let cycle = Phase::ALL.len() - 1;
        Phase::ALL[(self.index() + 1) % cycle]
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Geometric inputs for transition checks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseInputs {
    pub car_x: f32,
    /// Heading in degrees.
    pub car_angle: f32,
    /// x of the selected spot, if any.
    pub spot_x: Option<f32>,
    pub vehicle_length: f32,
}

/// Condition guarding one automatic transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransitionCondition {
    /// Spot selected and `car_x > spot.x + offset`.
    PastSpot { offset: f32 },
    /// Spot selected and `car_x > spot.x + lengths × vehicle_length`.
    PastSpotByLengths { lengths: f32 },
    /// Phase timer strictly above the limit.
    ElapsedOver { seconds: f32 },
    /// Heading strictly below the limit.
    HeadingBelow { degrees: f32 },
    /// `|heading| < degrees` or phase timer above `seconds`.
    HeadingSettledOrElapsed { degrees: f32, seconds: f32 },
}

impl TransitionCondition {
    pub fn holds(&self, inputs: &PhaseInputs, elapsed: f32) -> bool {
        match *self {
            TransitionCondition::PastSpot { offset } => {
                inputs.spot_x.is_some_and(|sx| inputs.car_x > sx + offset)
            }
            TransitionCondition::PastSpotByLengths { lengths } => inputs
                .spot_x
                .is_some_and(|sx| inputs.car_x > sx + inputs.vehicle_length * lengths),
            TransitionCondition::ElapsedOver { seconds } => elapsed > seconds,
            TransitionCondition::HeadingBelow { degrees } => inputs.car_angle < degrees,
            TransitionCondition::HeadingSettledOrElapsed { degrees, seconds } => {
                inputs.car_angle.abs() < degrees || elapsed > seconds
            }
        }
    }
}

/// Automatic transitions: (from, condition, to). At most one entry per source phase.
pub const TRANSITIONS: [(Phase, TransitionCondition, Phase); 7] = [
    (Phase::Searching, TransitionCondition::PastSpot { offset: -50.0 }, Phase::Approach),
    (
        Phase::Approach,
        TransitionCondition::PastSpotByLengths { lengths: 1.2 },
        Phase::Positioning,
    ),
    (
        Phase::Positioning,
        TransitionCondition::ElapsedOver { seconds: 3.0 },
        Phase::PrepareReverse,
    ),
    (
        Phase::PrepareReverse,
        TransitionCondition::ElapsedOver { seconds: 0.5 },
        Phase::ReverseRight,
    ),
    (
        Phase::ReverseRight,
        TransitionCondition::HeadingBelow { degrees: -25.0 },
        Phase::ReverseLeft,
    ),
    (
        Phase::ReverseLeft,
        TransitionCondition::HeadingSettledOrElapsed { degrees: 5.0, seconds: 4.0 },
        Phase::FinalAdjust,
    ),
    (Phase::FinalAdjust, TransitionCondition::ElapsedOver { seconds: 3.0 }, Phase::Parked),
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseTransition {
    pub from: Phase,
    pub to: Phase,
    /// Time spent in `from`.
    pub elapsed: f32,
    pub manual: bool,
}

#[derive(Debug, Clone)]
pub struct PhaseStateMachine {
    phase: Phase,
    elapsed: f32,
}

impl PhaseStateMachine {
    pub fn new() -> Self {
        Self { phase: Phase::Searching, elapsed: 0.0 }
    }

    /// Start in an arbitrary phase with a zeroed timer.
    pub fn starting_at(phase: Phase) -> Self {
        Self { phase, elapsed: 0.0 }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Accumulate phase time. Called at the start of each tick.
    pub fn advance_timer(&mut self, dt: f32) {
        self.elapsed += dt;
    }

    /// Apply the automatic transition for the current phase, if its condition holds.
    pub fn check_transition(&mut self, inputs: &PhaseInputs) -> Option<PhaseTransition> {
        let (_, condition, to) = TRANSITIONS.iter().find(|(from, _, _)| *from == self.phase)?;
        if !condition.holds(inputs, self.elapsed) {
            return None;
        }
        Some(self.enter(*to, false))
    }

    /// Operator override: step to the next phase regardless of conditions.
    pub fn advance_manual(&mut self) -> PhaseTransition {
        let next = self.phase.manual_successor();
        self.enter(next, true)
    }

    /// Operator-forced stop. Never triggered by the core itself.
    pub fn abort(&mut self) -> PhaseTransition {
        self.enter(Phase::Aborted, true)
    }

    fn enter(&mut self, to: Phase, manual: bool) -> PhaseTransition {
        let transition = PhaseTransition { from: self.phase, to, elapsed: self.elapsed, manual };
        self.phase = to;
        self.elapsed = 0.0;
        info!(
            from = %transition.from,
            to = %transition.to,
            elapsed = transition.elapsed,
            manual,
            "phase transition"
        );
        transition
    }
}

impl Default for PhaseStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(car_x: f32, car_angle: f32, spot_x: Option<f32>) -> PhaseInputs {
        PhaseInputs { car_x, car_angle, spot_x, vehicle_length: 80.0 }
    }

    #[test]
    fn searching_waits_for_spot() {
        let mut sm = PhaseStateMachine::new();
        assert_eq!(sm.check_transition(&inputs(900.0, 0.0, None)), None);
        assert_eq!(sm.check_transition(&inputs(649.0, 0.0, Some(700.0))), None);
        let t = sm.check_transition(&inputs(651.0, 0.0, Some(700.0))).unwrap();
        assert_eq!((t.from, t.to), (Phase::Searching, Phase::Approach));
    }

    #[test]
    fn approach_needs_one_point_two_lengths_past_spot() {
        let mut sm = PhaseStateMachine::starting_at(Phase::Approach);
        // threshold is 700 + 96
        assert_eq!(sm.check_transition(&inputs(795.0, 0.0, Some(700.0))), None);
        assert!(sm.check_transition(&inputs(797.0, 0.0, Some(700.0))).is_some());
        assert_eq!(sm.phase(), Phase::Positioning);
    }

    #[test]
    fn approach_without_spot_stays_put() {
        let mut sm = PhaseStateMachine::starting_at(Phase::Approach);
        assert_eq!(sm.check_transition(&inputs(5000.0, 0.0, None)), None);
    }

    #[test]
    fn positioning_held_past_three_seconds_resets_timer() {
        let mut sm = PhaseStateMachine::starting_at(Phase::Positioning);
        sm.advance_timer(3.0);
        assert_eq!(sm.check_transition(&inputs(0.0, 0.0, None)), None);
        sm.advance_timer(0.1);
        let t = sm.check_transition(&inputs(0.0, 0.0, None)).unwrap();
        assert_eq!(t.to, Phase::PrepareReverse);
        assert!((t.elapsed - 3.1).abs() < 1e-4);
        assert_eq!(sm.phase(), Phase::PrepareReverse);
        assert_eq!(sm.elapsed(), 0.0);
    }

    #[test]
    fn reverse_right_switches_on_heading() {
        let mut sm = PhaseStateMachine::starting_at(Phase::ReverseRight);
        assert_eq!(sm.check_transition(&inputs(0.0, -25.0, None)), None);
        assert!(sm.check_transition(&inputs(0.0, -31.0, None)).is_some());
        assert_eq!(sm.phase(), Phase::ReverseLeft);
    }

    #[test]
    fn reverse_left_exits_on_heading_or_timeout() {
        let mut sm = PhaseStateMachine::starting_at(Phase::ReverseLeft);
        assert!(sm.check_transition(&inputs(0.0, -4.0, None)).is_some());

        let mut sm = PhaseStateMachine::starting_at(Phase::ReverseLeft);
        sm.advance_timer(4.0);
        assert_eq!(sm.check_transition(&inputs(0.0, -20.0, None)), None);
        sm.advance_timer(0.05);
        assert!(sm.check_transition(&inputs(0.0, -20.0, None)).is_some());
        assert_eq!(sm.phase(), Phase::FinalAdjust);
    }

    #[test]
    fn terminal_phases_have_no_automatic_exit() {
        for phase in [Phase::Parked, Phase::Aborted] {
            let mut sm = PhaseStateMachine::starting_at(phase);
            sm.advance_timer(100.0);
            assert_eq!(sm.check_transition(&inputs(1e6, -90.0, Some(0.0))), None);
        }
    }

    #[test]
    fn automatic_transitions_follow_declaration_order() {
        for (from, _, to) in TRANSITIONS {
            assert_eq!(to.index(), from.index() + 1);
        }
    }

    #[test]
    fn manual_advance_cycles_and_wraps() {
        let mut sm = PhaseStateMachine::new();
        sm.advance_timer(2.0);
        let t = sm.advance_manual();
        assert!(t.manual);
        assert_eq!(sm.phase(), Phase::Approach);
        assert_eq!(sm.elapsed(), 0.0);

        assert_eq!(Phase::FinalAdjust.manual_successor(), Phase::Parked);
        assert_eq!(Phase::Parked.manual_successor(), Phase::Searching);
        assert_eq!(Phase::Aborted.manual_successor(), Phase::Approach);
    }

    #[test]
    fn abort_is_terminal() {
        let mut sm = PhaseStateMachine::starting_at(Phase::ReverseRight);
        sm.abort();
        assert_eq!(sm.phase(), Phase::Aborted);
        assert!(sm.phase().is_terminal());
    }
}
