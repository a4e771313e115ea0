//! Frame-range sprite animation driven by simulated time.

use serde::Serialize;

/// Default seconds per frame.
pub const ANIMATION_STEP: f32 = 1.0 / 5.0;

/// Cycles through `first..=last`, advancing one frame each time more than
/// `step` seconds have accumulated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Animation {
    first: u32,
    last: u32,
    frame: u32,
    #[serde(skip)]
    elapsed: f32,
}

impl Animation {
    pub fn new(first: u32, last: u32) -> Self {
        let last = last.max(first);
        Self {
            first,
            last,
            frame: first,
            elapsed: 0.0,
        }
    }

    /// Accumulate `dt` and move to the next frame once `step` is exceeded.
    pub fn advance(&mut self, dt: f32, step: f32) {
        self.elapsed += dt;
        if self.elapsed > step {
            self.frame = if self.frame >= self.last {
                self.first
            } else {
                self.frame + 1
            };
            self.elapsed = 0.0;
        }
    }

    /// Back to the first frame.
    pub fn reset(&mut self) {
        self.frame = self.first;
        self.elapsed = 0.0;
    }

    pub fn frame(&self) -> u32 {
        self.frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_after_last_frame() {
        let mut anim = Animation::new(1, 3);
        for _ in 0..3 {
            anim.advance(0.25, ANIMATION_STEP);
        }
        assert_eq!(anim.frame(), 1);
    }

    #[test]
    fn needs_more_than_one_step_to_advance() {
        let mut anim = Animation::new(1, 8);
        anim.advance(0.1, ANIMATION_STEP);
        assert_eq!(anim.frame(), 1);
        anim.advance(0.15, ANIMATION_STEP);
        assert_eq!(anim.frame(), 2);
        anim.reset();
        assert_eq!(anim.frame(), 1);
    }

    #[test]
    fn single_frame_range_stays_put() {
        let mut anim = Animation::new(1, 1);
        anim.advance(1.0, ANIMATION_STEP);
        assert_eq!(anim.frame(), 1);
    }
}
