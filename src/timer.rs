use std::{
    cmp::Ordering,
    collections::BinaryHeap,
    thread,
    time::{
        Duration,
        Instant,
    },
};
use crate::{
    cps::Cont,
    error::{
        Result,
        RuntimeError,
    },
};


/// Continuations waiting on a deadline. Equal deadlines fire in arming order.
#[derive(Default)]
pub struct TimerQueue {
    heap: BinaryHeap<Timer>,
    armed: u64,
}

struct Timer {
    deadline: Instant,
    seq: u64,
    k: Cont,
}
impl Timer {
    fn key(&self)->(Instant, u64) {
        (self.deadline, self.seq)
    }
}
impl PartialEq for Timer {
    fn eq(&self, other: &Self)->bool {
        self.key() == other.key()
    }
}
impl Eq for Timer {}
impl PartialOrd for Timer {
    fn partial_cmp(&self, other: &Self)->Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Timer {
    // reversed so the heap pops the earliest deadline first
    fn cmp(&self, other: &Self)->Ordering {
        other.key().cmp(&self.key())
    }
}

impl TimerQueue {
    pub fn new()->Self {
        Self::default()
    }

    pub fn len(&self)->usize {
        self.heap.len()
    }

    pub fn is_empty(&self)->bool {
        self.heap.is_empty()
    }

    pub fn schedule(&mut self, delay: Duration, k: Cont)->Result<()> {
        let Some(deadline) = Instant::now().checked_add(delay) else {
            return Err(RuntimeError::type_error("delay in range", "number"));
        };
        self.heap.push(Timer {deadline, seq: self.armed, k});
        self.armed += 1;

        return Ok(());
    }

    /// Blocks until the earliest deadline passes. `None` when nothing is armed.
    pub fn wait_next(&mut self)->Option<Cont> {
        let timer = self.heap.pop()?;
        let now = Instant::now();
        if timer.deadline > now {
            thread::sleep(timer.deadline - now);
        }

        return Some(timer.k);
    }
}
