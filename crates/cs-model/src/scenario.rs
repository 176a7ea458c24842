//! `Scenario` — the ordered phase sequence of a data set.

use std::collections::BTreeMap;
use std::sync::Arc;

use cs_core::{SimTime, TimeDistribution};

use crate::error::{ModelError, ModelResult};
use crate::phase::{ARBITRARY_MAX_DURATION, ARBITRARY_MIN_DURATION, Phase, PhaseRef};

/// Upper bound on the number of phases, so that a scenario of maximal phases
/// still fits in the time range.
pub const MAX_PHASES: i64 = i64::MAX / ARBITRARY_MAX_DURATION.ticks;

#[derive(Clone, Debug, Default)]
pub struct Scenario {
    pub name:        String,
    pub description: String,
    pub phases:      Vec<PhaseRef>,
}

impl Scenario {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }

    /// Append a slot for `origin`.
    pub fn push_phase(&mut self, origin: Arc<Phase>) -> &mut PhaseRef {
        self.phases.push(PhaseRef::new(origin));
        let last = self.phases.len() - 1;
        &mut self.phases[last]
    }

    /// Append a slot for the phase named `name`.  An origin already used by
    /// the scenario is shared; otherwise `load` is asked for it.
    pub fn add_phase<F>(&mut self, name: &str, load: F) -> ModelResult<&mut PhaseRef>
    where
        F: FnOnce(&str) -> Option<Phase>,
    {
        if name.is_empty() {
            return Err(ModelError::UnknownPhase(String::new()));
        }
        let origin = match self.phases.iter().find(|p| p.name() == name) {
            Some(existing) => Arc::clone(existing.origin()),
            None => Arc::new(load(name).ok_or_else(|| ModelError::UnknownPhase(name.to_owned()))?),
        };
        Ok(self.push_phase(origin))
    }

    /// Append the non-system phases of `other`, sharing their origins.
    pub fn append(&mut self, other: &Scenario) {
        for p in other.phases.iter().filter(|p| !p.is_system()) {
            self.phases.push(PhaseRef::new(Arc::clone(p.origin())));
        }
    }

    /// Remove the slot at `index`, which must hold the phase `name`.
    pub fn remove_phase(&mut self, index: usize, name: &str) -> ModelResult<PhaseRef> {
        match self.phases.get(index) {
            Some(p) if p.name() == name => Ok(self.phases.remove(index)),
            _ => Err(ModelError::PhaseMismatch { index, name: name.to_owned() }),
        }
    }

    /// Reorder the slots.  `order` maps each current index to the phase name
    /// expected there; slots are kept in the map's key order, after every
    /// system phase.  Out-of-range indices are ignored, a name mismatch
    /// leaves the scenario untouched.
    pub fn sort_phases(&mut self, order: &BTreeMap<usize, String>) -> ModelResult<()> {
        let mut picked = Vec::with_capacity(order.len());
        for (&index, name) in order {
            let Some(p) = self.phases.get(index) else {
                continue;
            };
            if p.name() != name {
                return Err(ModelError::PhaseMismatch { index, name: name.clone() });
            }
            picked.push(index);
        }
        let old = std::mem::take(&mut self.phases);
        let (system, _): (Vec<_>, Vec<_>) = old.iter().cloned().partition(|p| p.is_system());
        self.phases = system;
        self.phases.extend(picked.into_iter().map(|i| old[i].clone()));
        Ok(())
    }

    /// Aggregate duration, each phase clamped to the accepted range.
    pub fn duration(&self) -> TimeDistribution {
        let Some(first) = self.phases.first() else {
            return TimeDistribution::ZERO;
        };
        let clamp = |t: SimTime| t.clamp(ARBITRARY_MIN_DURATION, ARBITRARY_MAX_DURATION);
        let (mut min, mut mode, mut max) = (SimTime::ZERO, SimTime::ZERO, SimTime::ZERO);
        for p in &self.phases {
            let d = p.duration();
            min += clamp(d.min_possible());
            mode += clamp(d.mode());
            max += clamp(d.max_possible());
        }
        TimeDistribution::new(first.duration().unit(), min, mode, max)
    }

    pub fn error_message(&self) -> Option<String> {
        if self.phases.is_empty() {
            return Some("A scenario must have at least one phase!".into());
        }
        if self.phases.len() as i64 > MAX_PHASES {
            return Some(format!("A scenario must not contain more than {MAX_PHASES} phases!"));
        }
        self.phases
            .iter()
            .find_map(|p| p.error_message().map(|msg| format!("Invalid phase “{p}”: {msg}")))
    }
}
