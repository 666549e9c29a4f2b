//! # procsim-engine::entity
//!
//! `Entity`: a unit flowing through the model, carrying named attributes and
//! an optional routing sequence (a fixed itinerary of activities to visit,
//! rather than following each activity's static `route_to`).

use procsim_types::id::{ElementId, EntityId, EntityTypeId};
use procsim_types::time::SimTime;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct EntityType {
    pub id: EntityTypeId,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub entity_type: EntityTypeId,
    pub created_at: SimTime,
    attributes: HashMap<String, f64>,
    /// A fixed itinerary of activities, consumed one step at a time by
    /// `next_receiver`. `None` means routing follows each activity's own
    /// static `route_to` instead.
    sequence: Option<Vec<ElementId>>,
    sequence_cursor: usize,
}

impl Entity {
    pub fn new(id: EntityId, entity_type: EntityTypeId, created_at: SimTime) -> Self {
        Self {
            id,
            entity_type,
            created_at,
            attributes: HashMap::new(),
            sequence: None,
            sequence_cursor: 0,
        }
    }

    pub fn with_sequence(mut self, sequence: Vec<ElementId>) -> Self {
        self.sequence = Some(sequence);
        self.sequence_cursor = 0;
        self
    }

    pub fn attribute(&self, name: &str) -> Option<f64> {
        self.attributes.get(name).copied()
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: f64) {
        self.attributes.insert(name.into(), value);
    }

    /// `true` exactly when this entity is following an explicit sequence and
    /// has steps left in it. A positive reading (vs. "no sequence OR
    /// exhausted") so callers can distinguish "use the sequence's next stop"
    /// from "fall through to the activity's static route" without a second
    /// check.
    pub fn has_receiver_sequence(&self) -> bool {
        matches!(&self.sequence, Some(seq) if self.sequence_cursor < seq.len())
    }

    /// Returns the next stop in the sequence and advances the cursor.
    /// Panics if `has_receiver_sequence` is `false`; callers must check first.
    pub fn next_sequence_stop(&mut self) -> ElementId {
        let seq = self.sequence.as_ref().expect("no sequence assigned");
        let next = seq[self.sequence_cursor];
        self.sequence_cursor += 1;
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_cursor_advances_and_then_reports_exhausted() {
        let mut e = Entity::new(0, 0, 0.0).with_sequence(vec![1, 2]);
        assert!(e.has_receiver_sequence());
        assert_eq!(e.next_sequence_stop(), 1);
        assert!(e.has_receiver_sequence());
        assert_eq!(e.next_sequence_stop(), 2);
        assert!(!e.has_receiver_sequence());
    }

    #[test]
    fn entity_without_sequence_reports_none() {
        let e = Entity::new(0, 0, 0.0);
        assert!(!e.has_receiver_sequence());
    }
}
