//! Keyed trailing-edge debouncer.
//!
//! Each key has its own slot in a timer table. Calling [`Debouncer::call`]
//! replaces the key's pending arguments and pushes its deadline to
//! `now + delay`; nothing runs until the owner calls [`Debouncer::fire_due`]
//! after the deadline has passed. Keys never cancel each other.

use std::collections::HashMap;
use std::hash::Hash;
use std::rc::Rc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::clock::Clock;

struct Pending<A> {
    due: DateTime<Utc>,
    seq: u64,
    args: A,
}

pub struct Debouncer<K, A, R> {
    delay: chrono::Duration,
    clock: Rc<dyn Clock>,
    pending: HashMap<K, Pending<A>>,
    next_seq: u64,
    action: Box<dyn FnMut(K, A) -> R>,
}

impl<K, A, R> Debouncer<K, A, R>
where
    K: Eq + Hash + Clone,
{
    pub fn new<F>(delay: Duration, clock: Rc<dyn Clock>, action: F) -> Self
    where
        F: FnMut(K, A) -> R + 'static,
    {
        Self {
            delay: chrono::Duration::from_std(delay).unwrap_or(chrono::Duration::MAX),
            clock,
            pending: HashMap::new(),
            next_seq: 0,
            action: Box::new(action),
        }
    }

    /// Schedule `args` for `key`, superseding anything already pending for it.
    ///
    /// A deadline past the end of representable time is clamped; such a call
    /// only runs through [`Debouncer::flush`].
    pub fn call(&mut self, key: K, args: A) {
        let due = self
            .clock
            .now()
            .checked_add_signed(self.delay)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.insert(key, Pending { due, seq, args });
    }

    /// Drop the pending call for `key` without running it.
    pub(crate) fn cancel(&mut self, key: &K) -> bool {
        self.pending.remove(key).is_some()
    }

    /// Run every call whose deadline has passed, oldest first.
    pub fn fire_due(&mut self) -> Vec<(K, R)> {
        let now = self.clock.now();
        let due = self.take_where(|p| p.due <= now);
        self.run(due)
    }

    /// Run every pending call immediately, regardless of deadline.
    pub fn flush(&mut self) -> Vec<(K, R)> {
        let all = self.take_where(|_| true);
        self.run(all)
    }

    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        self.pending.values().map(|p| p.due).min()
    }

    /// Time left until the earliest deadline; zero if one is already overdue.
    pub fn time_until_next(&self) -> Option<Duration> {
        self.next_deadline()
            .map(|due| (due - self.clock.now()).to_std().unwrap_or(Duration::ZERO))
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.pending.contains_key(key)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn delay(&self) -> Duration {
        self.delay.to_std().unwrap_or(Duration::ZERO)
    }

    fn take_where(&mut self, pred: impl Fn(&Pending<A>) -> bool) -> Vec<(K, Pending<A>)> {
        let keys: Vec<K> = self
            .pending
            .iter()
            .filter(|(_, p)| pred(p))
            .map(|(k, _)| k.clone())
            .collect();

        let mut taken: Vec<(K, Pending<A>)> = keys
            .into_iter()
            .filter_map(|k| self.pending.remove(&k).map(|p| (k, p)))
            .collect();
        taken.sort_by_key(|(_, p)| (p.due, p.seq));
        taken
    }

    fn run(&mut self, batch: Vec<(K, Pending<A>)>) -> Vec<(K, R)> {
        batch
            .into_iter()
            .map(|(key, p)| {
                let result = (self.action)(key.clone(), p.args);
                (key, result)
            })
            .collect()
    }
}
