//! Aggregate barring state and pending selections

use serde::{Deserialize, Serialize};

use super::{BarringCategory, Direction};

/// Currently active barring, at most one category per direction
///
/// Fields are private: `outgoing` can only ever hold an outgoing category and
/// `incoming` an incoming one. Deserialized input that violates this is
/// rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "AggregateRepr")]
pub struct AggregateBarringState {
    outgoing: Option<BarringCategory>,
    incoming: Option<BarringCategory>,
}

impl AggregateBarringState {
    /// Active outgoing category, if any
    pub fn outgoing(&self) -> Option<BarringCategory> {
        self.outgoing
    }

    /// Active incoming category, if any
    pub fn incoming(&self) -> Option<BarringCategory> {
        self.incoming
    }

    /// Active category for a direction
    pub fn get(&self, direction: Direction) -> Option<BarringCategory> {
        match direction {
            Direction::Outgoing => self.outgoing,
            Direction::Incoming => self.incoming,
        }
    }

    /// Whether `category` is the active one for its direction
    pub fn is_active(&self, category: BarringCategory) -> bool {
        category
            .direction()
            .is_some_and(|d| self.get(d) == Some(category))
    }

    /// No barring active in either direction
    pub fn is_clear(&self) -> bool {
        self.outgoing.is_none() && self.incoming.is_none()
    }

    /// Make `category` the active one for its direction, replacing any other.
    ///
    /// Returns `false` (and changes nothing) for [`BarringCategory::AllBarring`].
    pub fn activate(&mut self, category: BarringCategory) -> bool {
        match category.direction() {
            Some(Direction::Outgoing) => self.outgoing = Some(category),
            Some(Direction::Incoming) => self.incoming = Some(category),
            None => return false,
        }
        true
    }

    /// Clear `category` if it is the active one for its direction
    pub fn deactivate(&mut self, category: BarringCategory) {
        if self.outgoing == Some(category) {
            self.outgoing = None;
        }
        if self.incoming == Some(category) {
            self.incoming = None;
        }
    }

    /// Clear both directions
    pub fn clear(&mut self) {
        self.outgoing = None;
        self.incoming = None;
    }
}

#[derive(Deserialize)]
struct AggregateRepr {
    outgoing: Option<BarringCategory>,
    incoming: Option<BarringCategory>,
}

impl TryFrom<AggregateRepr> for AggregateBarringState {
    type Error = String;

    fn try_from(repr: AggregateRepr) -> Result<Self, Self::Error> {
        if let Some(c) = repr.outgoing {
            if c.direction() != Some(Direction::Outgoing) {
                return Err(format!("{:?} is not an outgoing category", c));
            }
        }
        if let Some(c) = repr.incoming {
            if c.direction() != Some(Direction::Incoming) {
                return Err(format!("{:?} is not an incoming category", c));
            }
        }
        Ok(Self {
            outgoing: repr.outgoing,
            incoming: repr.incoming,
        })
    }
}

/// A user choice that has not yet been committed to the network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingSelection {
    pub target: BarringCategory,
    pub direction: Direction,
    pub desired_enabled: bool,
}

impl PendingSelection {
    /// Create a selection, rejecting targets outside `direction`
    pub fn new(
        direction: Direction,
        target: BarringCategory,
        desired_enabled: bool,
    ) -> Result<Self, String> {
        if target.direction() != Some(direction) {
            return Err(format!("{} is not an {} category", target, direction));
        }
        Ok(Self {
            target,
            direction,
            desired_enabled,
        })
    }

    /// Whether applying this selection would leave `state` unchanged
    pub fn is_noop(&self, state: &AggregateBarringState) -> bool {
        state.is_active(self.target) == self.desired_enabled
    }
}
