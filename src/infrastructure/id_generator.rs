// Id Generator - time-ordered 64-bit ids for users, groups, posts and comments
// Layout: [timestamp:42][node_id:10][sequence:12]

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{AppError, AppResult};

const NODE_BITS: u64 = 10;
const SEQUENCE_BITS: u64 = 12;
const MAX_NODE_ID: u16 = (1 << NODE_BITS) as u16;
const SEQUENCE_MASK: u64 = (1 << SEQUENCE_BITS) - 1;
const TIMESTAMP_SHIFT: u64 = NODE_BITS + SEQUENCE_BITS;
const TIMESTAMP_MASK: u64 = 0x3FF_FFFF_FFFF;

/// Snowflake-style generator. Ids from one generator are strictly increasing,
/// so sorting by id matches creation order on a single node.
#[derive(Debug)]
pub struct IdGenerator {
    node_id: u16,
    last_id: AtomicU64,
}

impl IdGenerator {
    pub fn new(node_id: u16) -> AppResult<Self> {
        if node_id >= MAX_NODE_ID {
            return Err(AppError::ConfigurationError(format!(
                "Node id must be less than {}, got {}",
                MAX_NODE_ID, node_id
            )));
        }

        Ok(Self {
            node_id,
            last_id: AtomicU64::new(0),
        })
    }

    /// Generate the next id. When more than 4096 ids are requested within one
    /// millisecond the timestamp component runs ahead of the wall clock.
    pub fn next_id(&self) -> i64 {
        let node_bits = (self.node_id as u64) << SEQUENCE_BITS;
        let from_clock = ((now_millis() & TIMESTAMP_MASK) << TIMESTAMP_SHIFT) | node_bits;

        let mut last = self.last_id.load(Ordering::Relaxed);
        loop {
            let next = if from_clock > last {
                from_clock
            } else if last & SEQUENCE_MASK == SEQUENCE_MASK {
                (((last >> TIMESTAMP_SHIFT) + 1) << TIMESTAMP_SHIFT) | node_bits
            } else {
                last + 1
            };

            match self
                .last_id
                .compare_exchange_weak(last, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return next as i64,
                Err(current) => last = current,
            }
        }
    }

    pub fn node_id(&self) -> u16 {
        self.node_id
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
