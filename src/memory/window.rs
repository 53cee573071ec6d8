use crate::types::Exchange;
use serde::{Serialize, Serializer};
use std::collections::VecDeque;

/// Bounded, oldest-first window of exchanges.
///
/// Pushing past the capacity evicts from the front, so the window always
/// holds the most recent `capacity` exchanges in chronological order.
#[derive(Debug, Clone)]
pub struct HistoryWindow {
    capacity: usize,
    exchanges: VecDeque<Exchange>,
}

impl HistoryWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            exchanges: VecDeque::with_capacity(capacity.max(1)),
        }
    }

    pub fn push(&mut self, exchange: Exchange) {
        self.exchanges.push_back(exchange);
        self.trim_if_needed();
    }

    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn to_vec(&self) -> Vec<Exchange> {
        self.exchanges.iter().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Exchange> {
        self.exchanges.iter()
    }

    fn trim_if_needed(&mut self) {
        while self.exchanges.len() > self.capacity {
            self.exchanges.pop_front();
        }
    }
}

impl Serialize for HistoryWindow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.exchanges.iter())
    }
}
