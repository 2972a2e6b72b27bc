//! Caves that must contain a loop

#[cfg(not(feature = "std"))]
use crate::compat::*;

use super::attempt::Attempt;
use super::strategy::CaveStrategy;
use crate::config::Tuning;
use crate::error::{Failure, FailureKind, Step};
use crate::maze::GridCoord;

/// Keeps every edge refinement would drop, then insists that the result
/// has a loop: two screens each removable alone but not together.
#[derive(Debug, Clone, Default)]
pub struct CycleCaveShuffle {
    tuning: Tuning,
}

impl CycleCaveShuffle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tuning(tuning: Tuning) -> Self {
        Self { tuning }
    }
}

/// Check that the occupied screens contain a cycle.
pub fn require_cycle(a: &Attempt) -> Step {
    let occupied: Vec<GridCoord> = a
        .grid
        .screens()
        .into_iter()
        .map(|s| s.center())
        .filter(|&c| !a.get(c).is_empty())
        .collect();
    let non_critical: Vec<GridCoord> = occupied
        .into_iter()
        .filter(|&c| a.try_clear(&[c]).len() == 1)
        .collect();
    if non_critical.is_empty() {
        return Err(Failure::new(FailureKind::Preinfer, "every screen is critical"));
    }
    for (i, &ci) in non_critical.iter().enumerate() {
        for &cj in &non_critical[..i] {
            if a.try_clear(&[ci, cj]).len() > 2 {
                return Ok(());
            }
        }
    }
    Err(Failure::new(FailureKind::Preinfer, "no pair of jointly critical screens"))
}

impl CaveStrategy for CycleCaveShuffle {
    fn name(&self) -> &'static str {
        "CycleCaveShuffle"
    }

    fn tuning(&self) -> Tuning {
        self.tuning.clone()
    }

    fn refine_edges(&self, _a: &mut Attempt) -> Step {
        Ok(())
    }

    fn preinfer(&self, a: &mut Attempt) -> Step {
        require_cycle(a)
    }
}

/// A cycle cave that also keeps fully open 2x2 blocks.
#[derive(Debug, Clone, Default)]
pub struct TightCycleCaveShuffle {
    inner: CycleCaveShuffle,
}

impl TightCycleCaveShuffle {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CaveStrategy for TightCycleCaveShuffle {
    fn name(&self) -> &'static str {
        "TightCycleCaveShuffle"
    }

    fn tuning(&self) -> Tuning {
        self.inner.tuning()
    }

    fn refine_edges(&self, _a: &mut Attempt) -> Step {
        Ok(())
    }

    fn remove_tight_loops(&self, _a: &mut Attempt) {}

    fn preinfer(&self, a: &mut Attempt) -> Step {
        require_cycle(a)
    }
}
