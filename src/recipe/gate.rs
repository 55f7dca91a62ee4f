//! Per-reel in-flight flags for translation requests.
//! Acquire is a single insert under the lock, so two clicks racing on the
//! same reel can never both win.

use std::collections::HashSet;

use parking_lot::Mutex;
use tracing::debug;

use super::ReelLink;

pub struct TranslationGate {
    in_flight: Mutex<HashSet<ReelLink>>,
}

impl TranslationGate {
    pub fn new() -> Self {
        Self {
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Sets the flag for `link`. Returns false if it was already set.
    pub fn try_acquire(&self, link: &ReelLink) -> bool {
        let acquired = self.in_flight.lock().insert(link.clone());
        debug!(link = %link, acquired, "translation_gate_acquire");
        acquired
    }

    /// Clears the flag for `link`, whether or not it was set.
    pub fn release(&self, link: &ReelLink) {
        self.in_flight.lock().remove(link.as_str());
        debug!(link = %link, "translation_gate_release");
    }

    pub fn is_in_flight(&self, link: &ReelLink) -> bool {
        self.in_flight.lock().contains(link.as_str())
    }

    /// Acquires the flag and returns a guard that releases it on drop.
    pub fn enter(&self, link: &ReelLink) -> Option<InFlightGuard<'_>> {
        self.try_acquire(link).then(|| InFlightGuard {
            gate: self,
            link: link.clone(),
        })
    }
}

impl Default for TranslationGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Holds a reel's in-flight flag until dropped.
pub struct InFlightGuard<'a> {
    gate: &'a TranslationGate,
    link: ReelLink,
}

impl InFlightGuard<'_> {
    pub fn link(&self) -> &ReelLink {
        &self.link
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.gate.release(&self.link);
    }
}
