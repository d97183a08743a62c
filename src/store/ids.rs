use chrono::Utc;

use crate::model::EntityId;

/// Hands out millisecond-timestamp ids that never repeat, even when several
/// entities are created within the same millisecond.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: EntityId,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure future ids sort after everything already persisted.
    pub fn observe(&mut self, id: EntityId) {
        self.last = self.last.max(id);
    }

    pub fn next_id(&mut self) -> EntityId {
        self.next_at(Utc::now().timestamp_millis())
    }

    fn next_at(&mut self, now_millis: EntityId) -> EntityId {
        self.last = now_millis.max(self.last.saturating_add(1));
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_millisecond_does_not_collide() {
        let mut ids = IdGenerator::new();
        let a = ids.next_at(1_700_000_000_000);
        let b = ids.next_at(1_700_000_000_000);
        let c = ids.next_at(1_699_999_999_999);
        assert_eq!(a, 1_700_000_000_000);
        assert_eq!(b, a + 1);
        assert_eq!(c, b + 1);
    }

    #[test]
    fn test_observe_moves_floor() {
        let mut ids = IdGenerator::new();
        ids.observe(5_000_000_000_000);
        assert_eq!(ids.next_at(10), 5_000_000_000_001);
    }

    #[test]
    fn test_max_persisted_id_does_not_overflow() {
        let mut ids = IdGenerator::new();
        ids.observe(EntityId::MAX);
        assert_eq!(ids.next_at(10), EntityId::MAX);
    }
}
