// Copyright 2026 Linkscout Contributors
// SPDX-License-Identifier: Apache-2.0

//! Pacing engine: randomized delays, scroll trajectories, and pointer paths.
//!
//! Everything here is a pure function of the pseudo-random source held by
//! [`Pacer`]. The engine never touches the browser: it produces durations and
//! plans, and the session executes them. Nothing in this module can fail.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Probability that [`Pacer::random_delay`] draws a long "distracted" pause.
const LONG_PAUSE_PROBABILITY: f64 = 0.2;

/// Probability of scrolling backwards during a scroll step (re-reading).
const BACKSCROLL_PROBABILITY: f64 = 0.08;

/// Probability of a thinking pause after a scroll step.
const THINKING_PAUSE_PROBABILITY: f64 = 0.15;

/// Number of full top-to-bottom passes in a human scroll.
pub const SCROLL_PASSES: usize = 2;

/// Margin kept between pointer targets and the viewport edge, in px.
const POINTER_MARGIN: f64 = 100.0;

/// Scroll speed profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollPattern {
    #[default]
    Natural,
    Fast,
    Slow,
}

impl ScrollPattern {
    /// Inclusive range of pixels advanced per scroll step.
    pub fn step_range(self) -> (i64, i64) {
        match self {
            Self::Natural => (300, 800),
            Self::Fast => (800, 1200),
            Self::Slow => (150, 400),
        }
    }
}

impl std::str::FromStr for ScrollPattern {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "natural" => Ok(Self::Natural),
            "fast" => Ok(Self::Fast),
            "slow" => Ok(Self::Slow),
            other => Err(format!("unknown scroll pattern: {other}")),
        }
    }
}

/// One step of a scroll plan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrollAction {
    /// Scroll the window to this absolute vertical offset.
    ScrollTo(i64),
    /// Wait before the next action.
    Wait(Duration),
}

/// Source of human-like timing.
pub struct Pacer {
    rng: StdRng,
}

impl Pacer {
    /// Pacer seeded from OS entropy.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic pacer for reproducible plans.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// A delay in `[min, max]` seconds, or with probability 0.2 in
    /// `[1.5 * max, 2.5 * max]` to model an occasional longer pause.
    ///
    /// Every call is an independent draw.
    pub fn random_delay(&mut self, min: f64, max: f64) -> Duration {
        let (min, max) = ordered(min, max);
        let secs = if self.rng.gen_bool(LONG_PAUSE_PROBABILITY) {
            self.rng.gen_range(max * 1.5..=max * 2.5)
        } else {
            self.rng.gen_range(min..=max)
        };
        Duration::from_secs_f64(secs)
    }

    /// A plain uniform delay in `[min, max]` seconds with no long-pause tail.
    pub fn uniform(&mut self, min: f64, max: f64) -> Duration {
        let (min, max) = ordered(min, max);
        Duration::from_secs_f64(self.rng.gen_range(min..=max))
    }

    /// Uniform integer in `[min, max]`.
    pub fn int_between(&mut self, min: i64, max: i64) -> i64 {
        if min >= max {
            return min;
        }
        self.rng.gen_range(min..=max)
    }

    /// Sleep for [`Self::random_delay`].
    pub async fn pause(&mut self, min: f64, max: f64) {
        tokio::time::sleep(self.random_delay(min, max)).await;
    }

    /// Sleep for [`Self::uniform`].
    pub async fn pause_uniform(&mut self, min: f64, max: f64) {
        tokio::time::sleep(self.uniform(min, max)).await;
    }

    /// Plan one top-to-bottom scroll pass over a page of `content_height` px.
    ///
    /// The plan ends once the scroll position reaches the content height.
    pub fn scroll_pass(&mut self, pattern: ScrollPattern, content_height: i64) -> Vec<ScrollAction> {
        let (lo, hi) = pattern.step_range();
        let mut plan = Vec::new();
        let mut position: i64 = 0;

        while position < content_height {
            position += self.rng.gen_range(lo..=hi);
            plan.push(ScrollAction::ScrollTo(position));
            plan.push(ScrollAction::Wait(self.uniform(0.4, 1.2)));

            if self.rng.gen_bool(BACKSCROLL_PROBABILITY) {
                position = (position - self.rng.gen_range(100..=250)).max(0);
                plan.push(ScrollAction::ScrollTo(position));
                plan.push(ScrollAction::Wait(self.uniform(0.4, 1.0)));
            }

            if self.rng.gen_bool(THINKING_PAUSE_PROBABILITY) {
                plan.push(ScrollAction::Wait(self.uniform(2.0, 4.0)));
            }
        }

        plan
    }

    /// Pointer targets inside a `width` x `height` viewport.
    ///
    /// `count` defaults to a random 3–8 moves.
    pub fn pointer_path(&mut self, width: f64, height: f64, count: Option<usize>) -> Vec<(f64, f64)> {
        let count = count.unwrap_or_else(|| self.rng.gen_range(3..=8));
        let x_max = (width - POINTER_MARGIN).max(POINTER_MARGIN);
        let y_max = (height - POINTER_MARGIN).max(POINTER_MARGIN);
        (0..count)
            .map(|_| {
                (
                    self.rng.gen_range(POINTER_MARGIN..=x_max),
                    self.rng.gen_range(POINTER_MARGIN..=y_max),
                )
            })
            .collect()
    }

    /// Inter-profile delay drawn from [`adaptive_range`].
    pub fn adaptive_delay(&mut self, index: usize, total: usize, base: (f64, f64)) -> Duration {
        let (min, max) = adaptive_range(index, total, base);
        self.uniform(min, max)
    }

    /// Per-keystroke typing delay.
    pub fn keystroke(&mut self) -> Duration {
        self.uniform(0.05, 0.15)
    }
}

impl Default for Pacer {
    fn default() -> Self {
        Self::new()
    }
}

/// Scale `base` by 2.0 beyond 90% progress and 1.5 beyond 70% progress.
///
/// `index` is 1-based. Slowing near the end of a batch hides the throughput
/// ramp that a fixed delay would show.
pub fn adaptive_range(index: usize, total: usize, base: (f64, f64)) -> (f64, f64) {
    let (min, max) = ordered(base.0, base.1);
    if total == 0 {
        return (min, max);
    }
    let progress = index as f64 / total as f64;
    let factor = if progress > 0.9 {
        2.0
    } else if progress > 0.7 {
        1.5
    } else {
        1.0
    };
    (min * factor, max * factor)
}

fn ordered(a: f64, b: f64) -> (f64, f64) {
    let a = if a.is_finite() { a.max(0.0) } else { 0.0 };
    let b = if b.is_finite() { b.max(0.0) } else { 0.0 };
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_delay_bounds() {
        let mut pacer = Pacer::seeded(7);
        for (min, max) in [(0.5, 3.0), (1.0, 1.0), (0.0, 0.2), (15.0, 30.0)] {
            for _ in 0..2_000 {
                let d = pacer.random_delay(min, max).as_secs_f64();
                assert!(d >= min - 1e-9, "{d} < {min}");
                assert!(d <= 2.5 * max + 1e-9, "{d} > {}", 2.5 * max);
            }
        }
    }

    #[test]
    fn test_random_delay_long_pause_frequency() {
        let mut pacer = Pacer::seeded(42);
        let long = (0..10_000)
            .filter(|_| pacer.random_delay(1.0, 2.0).as_secs_f64() > 2.0)
            .count();
        // Roughly 20% of draws land in the long-pause band.
        assert!((1_500..2_500).contains(&long), "long pauses: {long}");
    }

    #[test]
    fn test_scroll_pass_reaches_bottom() {
        let mut pacer = Pacer::seeded(3);
        for pattern in [ScrollPattern::Natural, ScrollPattern::Fast, ScrollPattern::Slow] {
            let plan = pacer.scroll_pass(pattern, 5_000);
            let last_scroll = plan
                .iter()
                .rev()
                .find_map(|a| match a {
                    ScrollAction::ScrollTo(y) => Some(*y),
                    _ => None,
                })
                .unwrap();
            let max_scroll = plan
                .iter()
                .filter_map(|a| match a {
                    ScrollAction::ScrollTo(y) => Some(*y),
                    _ => None,
                })
                .max()
                .unwrap();
            assert!(max_scroll >= 5_000);
            assert!(last_scroll >= 0);
        }
    }

    #[test]
    fn test_scroll_steps_within_pattern_range() {
        let mut pacer = Pacer::seeded(11);
        let plan = pacer.scroll_pass(ScrollPattern::Fast, 20_000);
        let mut prev = 0;
        for action in plan {
            if let ScrollAction::ScrollTo(y) = action {
                let delta = y - prev;
                // Forward steps are 800-1200; backscrolls are 100-250.
                assert!(
                    (800..=1200).contains(&delta) || (-250..=-100).contains(&delta) || y == 0,
                    "unexpected delta {delta}"
                );
                prev = y;
            }
        }
    }

    #[test]
    fn test_empty_page_has_empty_plan() {
        let mut pacer = Pacer::seeded(1);
        assert!(pacer.scroll_pass(ScrollPattern::Natural, 0).is_empty());
    }

    #[test]
    fn test_adaptive_range_thresholds() {
        assert_eq!(adaptive_range(1, 10, (10.0, 20.0)), (10.0, 20.0));
        assert_eq!(adaptive_range(7, 10, (10.0, 20.0)), (10.0, 20.0));
        assert_eq!(adaptive_range(8, 10, (10.0, 20.0)), (15.0, 30.0));
        assert_eq!(adaptive_range(10, 10, (10.0, 20.0)), (20.0, 40.0));
        assert_eq!(adaptive_range(1, 0, (10.0, 20.0)), (10.0, 20.0));
    }

    #[test]
    fn test_pointer_path_stays_inside_margin() {
        let mut pacer = Pacer::seeded(5);
        let path = pacer.pointer_path(1366.0, 768.0, None);
        assert!((3..=8).contains(&path.len()));
        for (x, y) in path {
            assert!((100.0..=1266.0).contains(&x));
            assert!((100.0..=668.0).contains(&y));
        }
    }

    #[test]
    fn test_scroll_pattern_parse() {
        assert_eq!("Fast".parse::<ScrollPattern>().unwrap(), ScrollPattern::Fast);
        assert!("sideways".parse::<ScrollPattern>().is_err());
    }
}
