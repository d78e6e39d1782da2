//! FIFO event queue owned by one backtest run.

use crate::domain::Event;
use std::collections::VecDeque;

#[derive(Debug, Default)]
pub struct EventQueue {
    events: VecDeque<Event>,
    pushed: usize,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: impl Into<Event>) {
        self.events.push_back(event.into());
        self.pushed += 1;
    }

    pub fn pop(&mut self) -> Option<Event> {
        self.events.pop_front()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events ever pushed.
    pub fn total_pushed(&self) -> usize {
        self.pushed
    }
}
