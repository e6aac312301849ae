use crate::jvm::code::jump_encoding::SIGNED_16BIT_JUMP_RANGE;
use crate::jvm::Error;
use std::ops::RangeInclusive;

/// Knobs for assembling method bodies
#[derive(Clone, Debug)]
pub struct Settings {
    /// Biggest gap between consecutive match values still worth a `tableswitch`
    ///
    /// Gaps in a `tableswitch` are filled with jumps to the default target. Past this gap, a
    /// `lookupswitch` is used instead.
    pub max_switch_gap: i32,

    /// Relative offsets reachable by `goto`, `jsr`, and `if*` before they need widening
    ///
    /// This should always be `SIGNED_16BIT_JUMP_RANGE`. It is only configurable so that tests can
    /// exercise branch widening without building enormous methods.
    pub short_jump_range: RangeInclusive<isize>,

    /// Compute `max_stack` by analyzing the code (otherwise, it is left at 0)
    pub compute_max_stack: bool,

    /// Compute `max_locals` by analyzing the code (otherwise, only parameters are counted)
    pub compute_max_locals: bool,

    /// Remove `nop` instructions (redirecting whatever targets them) before finishing methods
    pub remove_nops: bool,
}

impl Settings {
    pub fn new(max_switch_gap: i32) -> Result<Settings, Error> {
        if max_switch_gap < 0 {
            let msg = format!("switch gap must not be negative (got {})", max_switch_gap);
            return Err(Error::InvalidSettings(msg));
        }
        Ok(Settings {
            max_switch_gap,
            short_jump_range: SIGNED_16BIT_JUMP_RANGE,
            compute_max_stack: true,
            compute_max_locals: true,
            remove_nops: false,
        })
    }
}

impl Default for Settings {
    fn default() -> Settings {
        Settings {
            max_switch_gap: 1,
            short_jump_range: SIGNED_16BIT_JUMP_RANGE,
            compute_max_stack: true,
            compute_max_locals: true,
            remove_nops: false,
        }
    }
}
