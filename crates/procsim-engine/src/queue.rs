//! # procsim-engine::queue
//!
//! `Queue`: an ordered holding area for waiting entities, parameterized by a
//! `QueueDiscipline`. Queue length is a time-weighted `Variable`; each
//! entity's wait time is an observational one, recorded when it leaves.

use crate::variable::{Observer, Variable, VariableKind};
use procsim_types::errors::SimError;
use procsim_types::id::{ElementId, EntityId};
use procsim_types::time::SimTime;
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueDiscipline {
    Fifo,
    Lifo,
    /// Lowest `rank` leaves first; ties broken FIFO by arrival order.
    Ranked,
}

struct Waiting {
    entity: EntityId,
    arrival_time: SimTime,
    rank: i64,
    /// Tie-break for `Ranked`: insertion order among equal ranks.
    insert_seq: u64,
}

pub struct Queue {
    id: ElementId,
    discipline: QueueDiscipline,
    members: VecDeque<Waiting>,
    next_insert_seq: u64,
    length: Variable,
    wait_time: Variable,
}

impl Queue {
    pub fn new(id: ElementId, name: impl Into<String>, discipline: QueueDiscipline, start_time: SimTime) -> Self {
        let name = name.into();
        Self {
            id,
            discipline,
            members: VecDeque::new(),
            next_insert_seq: 0,
            length: Variable::new(format!("{name}.length"), VariableKind::TimeWeighted, 0.0, start_time),
            wait_time: Variable::new(format!("{name}.wait_time"), VariableKind::Observational, 0.0, start_time),
        }
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn discipline(&self) -> QueueDiscipline {
        self.discipline
    }

    /// Changing a queue's discipline mid-replication would retroactively
    /// reorder entities that already joined under the old rule.
    pub fn set_discipline(&mut self, discipline: QueueDiscipline) -> Result<(), SimError> {
        if !self.members.is_empty() {
            return Err(SimError::InvalidState(
                "cannot change queue discipline while entities are waiting".to_string(),
            ));
        }
        self.discipline = discipline;
        Ok(())
    }

    pub fn enqueue(&mut self, time: SimTime, entity: EntityId, rank: i64, observers: &mut [&mut dyn Observer]) -> Result<(), SimError> {
        let insert_seq = self.next_insert_seq;
        self.next_insert_seq += 1;
        let member = Waiting { entity, arrival_time: time, rank, insert_seq };

        match self.discipline {
            QueueDiscipline::Fifo => self.members.push_back(member),
            QueueDiscipline::Lifo => self.members.push_front(member),
            QueueDiscipline::Ranked => {
                let pos = self
                    .members
                    .iter()
                    .position(|m| (m.rank, m.insert_seq) > (member.rank, member.insert_seq))
                    .unwrap_or(self.members.len());
                self.members.insert(pos, member);
            }
        }

        let len = self.members.len() as f64;
        self.length.set_value(time, len, observers)
    }

    /// Removes and returns the front member according to the discipline
    /// (for `Ranked`, members are kept in rank order so this is simply the
    /// head of the deque), recording its wait time.
    pub fn dequeue(&mut self, time: SimTime, observers: &mut [&mut dyn Observer]) -> Result<Option<EntityId>, SimError> {
        let Some(member) = self.members.pop_front() else {
            return Ok(None);
        };
        let wait = time - member.arrival_time;
        self.wait_time.set_value(time, wait, observers)?;
        let len = self.members.len() as f64;
        self.length.set_value(time, len, observers)?;
        Ok(Some(member.entity))
    }

    pub fn clear_statistics(&mut self, time: SimTime) {
        self.length.clear_statistics(time);
        self.wait_time.clear_statistics(time);
    }

    pub fn roll_batch(&mut self, time: SimTime) {
        self.length.roll_batch(time);
        self.wait_time.roll_batch(time);
    }

    pub fn length_summary(&self) -> crate::variable::Summary {
        self.length.summary()
    }

    pub fn wait_time_summary(&self) -> crate::variable::Summary {
        self.wait_time.summary()
    }

    pub fn length_integral(&self, time: SimTime) -> (f64, f64) {
        self.length.integral_through(time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_preserves_arrival_order() {
        let mut q = Queue::new(0, "q", QueueDiscipline::Fifo, 0.0);
        let mut observers: Vec<&mut dyn Observer> = Vec::new();
        q.enqueue(0.0, 1, 0, &mut observers).unwrap();
        q.enqueue(0.0, 2, 0, &mut observers).unwrap();
        assert_eq!(q.dequeue(1.0, &mut observers).unwrap(), Some(1));
        assert_eq!(q.dequeue(1.0, &mut observers).unwrap(), Some(2));
    }

    #[test]
    fn lifo_reverses_order() {
        let mut q = Queue::new(0, "q", QueueDiscipline::Lifo, 0.0);
        let mut observers: Vec<&mut dyn Observer> = Vec::new();
        q.enqueue(0.0, 1, 0, &mut observers).unwrap();
        q.enqueue(0.0, 2, 0, &mut observers).unwrap();
        assert_eq!(q.dequeue(1.0, &mut observers).unwrap(), Some(2));
        assert_eq!(q.dequeue(1.0, &mut observers).unwrap(), Some(1));
    }

    #[test]
    fn ranked_orders_by_rank_then_arrival() {
        let mut q = Queue::new(0, "q", QueueDiscipline::Ranked, 0.0);
        let mut observers: Vec<&mut dyn Observer> = Vec::new();
        q.enqueue(0.0, 1, 5, &mut observers).unwrap();
        q.enqueue(0.0, 2, 1, &mut observers).unwrap();
        q.enqueue(0.0, 3, 1, &mut observers).unwrap();
        assert_eq!(q.dequeue(1.0, &mut observers).unwrap(), Some(2));
        assert_eq!(q.dequeue(1.0, &mut observers).unwrap(), Some(3));
        assert_eq!(q.dequeue(1.0, &mut observers).unwrap(), Some(1));
    }

    #[test]
    fn discipline_change_rejected_while_occupied() {
        let mut q = Queue::new(0, "q", QueueDiscipline::Fifo, 0.0);
        let mut observers: Vec<&mut dyn Observer> = Vec::new();
        q.enqueue(0.0, 1, 0, &mut observers).unwrap();
        assert!(q.set_discipline(QueueDiscipline::Lifo).is_err());
    }
}
