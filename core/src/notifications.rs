use std::collections::VecDeque;
use std::time::Duration;

use serde::Serialize;

use crate::models::Food;

/// How often the feed should be ticked. 50 ticks of 2 points each gives a
/// notification roughly 2.5 s of life.
pub const TICK_INTERVAL: Duration = Duration::from_millis(50);
pub const PROGRESS_START: u8 = 100;
pub const PROGRESS_STEP: u8 = 2;
pub const MAX_NOTIFICATIONS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub id: String,
    pub food: Food,
    pub progress: u8,
}

/// Transient "food added" notices that fade out on a fixed tick.
///
/// Bounded at [`MAX_NOTIFICATIONS`]; pushing past the cap drops the oldest.
#[derive(Debug, Clone, Default)]
pub struct NotificationFeed {
    items: VecDeque<Notification>,
    seq: u64,
}

impl NotificationFeed {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a notice for `food`. `now_ms` only feeds the id.
    pub fn push(&mut self, food: Food, now_ms: i64) -> &Notification {
        self.seq += 1;
        if self.items.len() == MAX_NOTIFICATIONS {
            self.items.pop_front();
        }
        self.items.push_back(Notification {
            id: format!("{}-{now_ms}-{}", food.id, self.seq),
            food,
            progress: PROGRESS_START,
        });
        &self.items[self.items.len() - 1]
    }

    /// Advance every notice by one step and drop the ones that reached zero.
    pub fn tick(&mut self) {
        for n in &mut self.items {
            n.progress = n.progress.saturating_sub(PROGRESS_STEP);
        }
        self.items.retain(|n| n.progress > 0);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.items.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
