//! Workload profiles for the container benchmarks.
//!
//! - [`ARRAY_LENGTHS`]: element counts covering the inline, just-spilled
//!   and large regimes of a `SmallArray<_, 8>`.
//! - [`object_ids`]: deterministic pseudo-random ids via seed.
//! - [`churn_script`]: a deterministic add/remove sequence for pools.

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

/// Lengths benchmarked for every array operation.
pub const ARRAY_LENGTHS: [usize; 4] = [4, 8, 64, 1024];

/// One step of a pool churn workload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChurnOp {
    /// Add a new object with this id.
    Add(u32),
    /// Remove the object at `index % len` (skipped when empty).
    RemoveAt(usize),
}

fn mix(seed: u64, i: u64) -> u64 {
    seed.wrapping_mul(6364136223846793005)
        .wrapping_add(i.wrapping_mul(1442695040888963407))
        .rotate_left(17)
}

/// `count` deterministic ids derived from `seed`.
pub fn object_ids(count: usize, seed: u64) -> Vec<u32> {
    (0..count as u64).map(|i| (mix(seed, i) >> 32) as u32).collect()
}

/// A churn workload of `steps` operations, roughly two adds per removal,
/// so the live population grows while slots keep getting recycled.
pub fn churn_script(steps: usize, seed: u64) -> Vec<ChurnOp> {
    (0..steps as u64)
        .map(|i| {
            let r = mix(seed, i);
            if r % 3 == 0 {
                ChurnOp::RemoveAt((r >> 8) as usize)
            } else {
                ChurnOp::Add(i as u32)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profiles_are_deterministic() {
        assert_eq!(object_ids(16, 7), object_ids(16, 7));
        assert_ne!(object_ids(16, 7), object_ids(16, 8));
        assert_eq!(churn_script(100, 3), churn_script(100, 3));
    }

    #[test]
    fn churn_mixes_adds_and_removals() {
        let script = churn_script(300, 42);
        let removals = script
            .iter()
            .filter(|op| matches!(op, ChurnOp::RemoveAt(_)))
            .count();
        assert!(removals > 0 && removals < script.len());
    }
}
