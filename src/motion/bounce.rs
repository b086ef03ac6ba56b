/// Number of out-of-bounds checks in one debounce window.
pub const BOUNCE_DEBOUNCE_TICKS: u32 = 10;

/// Per-axis hysteresis for wall bounces.
///
/// The gate only answers "may this axis flip now"; whether the sprite is out of bounds is a
/// separate, pure check on [`crate::Digit`]. [`BounceGate::step`] is called exactly once per tick.
///
/// The counter advances only on ticks spent out of bounds and wraps at
/// [`BOUNCE_DEBOUNCE_TICKS`]. A flip is permitted when it sits at a multiple of the threshold.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BounceGate {
    out_of_bounds_checks: u32,
}

impl BounceGate {
    /// Whether a flip would be permitted on the next out-of-bounds step.
    pub fn ready(&self) -> bool {
        self.out_of_bounds_checks % BOUNCE_DEBOUNCE_TICKS == 0
    }

    /// Out-of-bounds checks counted in the current window, in `0..BOUNCE_DEBOUNCE_TICKS`.
    pub fn checks(&self) -> u32 {
        self.out_of_bounds_checks
    }

    /// Advance the gate by one tick and report whether the axis flips on this tick.
    ///
    /// In-bounds ticks leave the counter untouched.
    pub fn step(&mut self, out_of_bounds: bool) -> bool {
        if !out_of_bounds {
            return false;
        }
        let flip = self.ready();
        self.out_of_bounds_checks = (self.out_of_bounds_checks + 1) % BOUNCE_DEBOUNCE_TICKS;
        flip
    }
}

#[cfg(test)]
#[path = "../../tests/unit/motion/bounce.rs"]
mod tests;
