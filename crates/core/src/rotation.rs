//! Carousel rotation reconciliation.
//!
//! The carousel is a ring of slots addressed by index; slot `i` faces the
//! viewer when the ring is rotated to `-(i * angle_per_slot)` degrees. The
//! renderer owns the live angle and feeds it back through
//! [`Carousel::observe`]; this module never samples a render loop itself.
//!
//! Angles are cumulative and unbounded. A spin that has wound the ring to
//! `-1070°` must settle on a nearby target, not unwind three full turns.

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, EntityId};
use crate::event::UiSignal;

pub const FULL_TURN: f64 = 360.0;
const HALF_TURN: f64 = FULL_TURN / 2.0;

/// Default duration of one full spin loop while a turn is in flight.
pub const DEFAULT_SPIN_PERIOD_SECS: f64 = 2.0;

/// Absolute angle that brings `target_index` to the front via the shortest path.
///
/// The correction keeps `delta` in `[-180, 180)`, so a target exactly half a
/// turn away is reached by rotating in the negative direction.
pub fn next_target(current_angle: f64, target_index: usize, angle_per_slot: f64) -> f64 {
    let normalized_current = current_angle % FULL_TURN;
    let target_angle = -(target_index as f64 * angle_per_slot);

    let mut delta = (target_angle - normalized_current).rem_euclid(FULL_TURN);
    if delta >= HALF_TURN {
        delta -= FULL_TURN;
    }

    current_angle + delta
}

/// The angle register written by the renderer's animation feedback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RotationState {
    pub current_angle: f64,
}

/// What the carousel is currently doing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CarouselMode {
    /// Holding the current angle.
    Idle,
    /// Looping full turns while the agent is working.
    Spinning,
    /// Settling on (or settled on) a highlighted entity.
    Targeted { entity_id: EntityId },
}

/// An animation instruction for the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RotationCommand {
    /// Loop linearly from `from` to `to` every `period_secs`, indefinitely.
    Spin { from: f64, to: f64, period_secs: f64 },
    /// Animate to an absolute angle.
    SeekTo { angle: f64 },
    /// Stop any running animation where it is.
    Stop,
}

/// Rotation controller for one carousel instance.
#[derive(Debug, Clone)]
pub struct Carousel {
    slots: Vec<EntityId>,
    state: RotationState,
    mode: CarouselMode,
    spin_period_secs: f64,
}

impl Carousel {
    pub fn new(slots: Vec<EntityId>) -> Self {
        Self {
            slots,
            state: RotationState::default(),
            mode: CarouselMode::Idle,
            spin_period_secs: DEFAULT_SPIN_PERIOD_SECS,
        }
    }

    /// One slot per catalog entry, in catalog order.
    pub fn from_catalog(catalog: &Catalog) -> Self {
        Self::new(catalog.entries().iter().map(|e| e.id.clone()).collect())
    }

    pub fn with_spin_period(mut self, secs: f64) -> Self {
        self.spin_period_secs = secs;
        self
    }

    pub fn angle_per_slot(&self) -> f64 {
        if self.slots.is_empty() {
            return 0.0;
        }
        FULL_TURN / self.slots.len() as f64
    }

    pub fn state(&self) -> RotationState {
        self.state
    }

    pub fn mode(&self) -> &CarouselMode {
        &self.mode
    }

    /// Record the angle the renderer actually reached.
    pub fn observe(&mut self, angle: f64) {
        self.state.current_angle = angle;
    }

    pub fn start_spin(&mut self) -> RotationCommand {
        self.mode = CarouselMode::Spinning;
        let from = self.state.current_angle;
        RotationCommand::Spin {
            from,
            to: from - FULL_TURN,
            period_secs: self.spin_period_secs,
        }
    }

    /// Settle on `entity_id`, or stop when there is nothing to highlight.
    ///
    /// Returns `None` when the id is not one of the slots: no command is
    /// issued and the mode is left as it was.
    pub fn highlight(&mut self, entity_id: Option<&str>) -> Option<RotationCommand> {
        let Some(id) = entity_id else {
            self.mode = CarouselMode::Idle;
            return Some(RotationCommand::Stop);
        };

        let index = self.slots.iter().position(|slot| slot == id)?;
        let angle = next_target(self.state.current_angle, index, self.angle_per_slot());
        tracing::debug!(entity_id = %id, index, from = self.state.current_angle, to = angle, "Carousel seeking");

        self.mode = CarouselMode::Targeted {
            entity_id: id.to_string(),
        };
        Some(RotationCommand::SeekTo { angle })
    }

    /// React to a signal from the operation router.
    pub fn apply(&mut self, signal: &UiSignal) -> Option<RotationCommand> {
        match signal {
            UiSignal::TurnStarted { .. } => Some(self.start_spin()),
            UiSignal::EntityHighlighted { entity_id } => self.highlight(entity_id.as_deref()),
        }
    }
}
