//! Coincidence window trackers
//!
//! A window opened at `t0` closes at `t1 = t0 + binwidth`. Its register
//! collects the channels seen co-firing while it was open. Both trackers
//! assume non-decreasing timestamps; out of order tags silently corrupt the
//! windows.

use crate::bit::BitOps;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Window {
    pub t0: i64,
    pub t1: i64,
    pub valid: bool,
    pub register: u32,
}

impl Window {
    /// (Re)open the window at `time`, seeded with the opener's own bit
    #[inline(always)]
    pub fn open(&mut self, idx: usize, time: i64, binwidth: i64) {
        self.t0 = time;
        self.t1 = time.saturating_add(binwidth);
        self.register = 1 << idx;
        self.valid = true;
    }

    /// Invalidate the window, returning its register
    #[inline(always)]
    pub fn close(&mut self) -> u32 {
        let r = self.register;
        self.register = 0;
        self.valid = false;
        r
    }

    pub fn reset(&mut self) {
        *self = Window::default();
    }
}

/// One window per channel: every channel may open a coincidence window.
#[derive(Clone, Debug)]
pub struct FreeRunning {
    windows: Vec<Window>,
    binwidth: i64,
}

impl FreeRunning {
    pub fn new(n: usize, binwidth: i64) -> Self {
        FreeRunning {
            windows: vec![Window::default(); n],
            binwidth,
        }
    }

    /// Process an event on channel `idx` at `time`.
    ///
    /// Channel `idx` is marked in every other open window with
    /// `t0 < time < t1`. Every open window with `time > t1` is closed, and the
    /// union of their registers is returned as a single pattern: closures
    /// that happen on the same incoming tag are coalesced. Finally the
    /// window of `idx` is reopened at `time`, discarding whatever it held.
    ///
    /// Windows closing on different tags are resolved independently even if
    /// they belong to one burst.
    #[inline]
    pub fn advance(&mut self, idx: usize, time: i64) -> Option<u32> {
        let mut filtered = 0u32;
        let mut closed = 0u32;
        for (j, w) in self.windows.iter_mut().enumerate() {
            if !w.valid {
                continue;
            }
            if w.t0 < time && time < w.t1 && j != idx {
                w.register.set(idx);
            }
            if time > w.t1 {
                closed += 1;
                filtered |= w.close();
            }
        }
        self.windows[idx].open(idx, time, self.binwidth);
        if closed > 0 {
            Some(filtered)
        } else {
            None
        }
    }

    /// Drop the window of `idx` without reporting it
    pub fn discard(&mut self, idx: usize) {
        self.windows[idx].reset();
    }

    pub fn clear(&mut self) {
        self.windows.iter_mut().for_each(Window::reset);
    }

    pub fn windows(&self) -> &[Window] {
        &self.windows
    }

    pub fn binwidth(&self) -> i64 {
        self.binwidth
    }
}

/// Outcome of a tag on the trigger-gated tracker
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gate {
    /// The trigger closed the previous window holding this pattern
    Closed(u32),
    /// The first trigger opened the window
    Opened,
    /// Event attributed to the open window
    Inside,
    /// Event after the window closed, before the next trigger
    Outside,
    /// Event ignored: no window open yet, or simultaneous with the trigger
    Idle,
}

/// A single shared window, opened only by the trigger channel.
#[derive(Clone, Debug)]
pub struct Gated {
    window: Window,
    trigger: usize,
    binwidth: i64,
}

impl Gated {
    pub fn new(trigger: usize, binwidth: i64) -> Self {
        Gated {
            window: Window::default(),
            trigger,
            binwidth,
        }
    }

    /// Process an event on channel `idx` at `time`.
    ///
    /// Unlike the free-running tracker the upper bound is inclusive: an event
    /// at exactly `t1` still belongs to the window.
    #[inline]
    pub fn advance(&mut self, idx: usize, time: i64) -> Gate {
        let w = &mut self.window;
        if idx == self.trigger {
            let gate = if w.valid {
                Gate::Closed(w.register)
            } else {
                Gate::Opened
            };
            w.open(self.trigger, time, self.binwidth);
            gate
        } else if !w.valid {
            Gate::Idle
        } else if w.t0 < time && time <= w.t1 {
            w.register.set(idx);
            Gate::Inside
        } else if time > w.t1 {
            Gate::Outside
        } else {
            // time == t0: simultaneous with the trigger
            Gate::Idle
        }
    }

    /// Drop the open window without reporting it
    pub fn discard(&mut self) {
        self.window.reset();
    }

    pub fn clear(&mut self) {
        self.window.reset();
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn trigger(&self) -> usize {
        self.trigger
    }

    pub fn binwidth(&self) -> i64 {
        self.binwidth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_running_marks_and_closes() {
        let mut fr = FreeRunning::new(2, 1000);
        assert_eq!(fr.advance(0, 0), None);
        assert_eq!(fr.advance(1, 500), None);
        assert_eq!(fr.windows()[0].register, 0b11);
        assert_eq!(fr.windows()[1].register, 0b10);
        // Both windows expire on the same tag and are coalesced
        assert_eq!(fr.advance(0, 2000), Some(0b11));
        assert!(!fr.windows()[1].valid);
        assert_eq!(fr.windows()[0], Window { t0: 2000, t1: 3000, valid: true, register: 0b01 });
    }

    #[test]
    fn free_running_bounds_are_exclusive() {
        let mut fr = FreeRunning::new(2, 1000);
        fr.advance(0, 0);
        // At t1: neither inside nor expired
        assert_eq!(fr.advance(1, 1000), None);
        assert_eq!(fr.windows()[0].register, 0b01);
        assert!(fr.windows()[0].valid);
        // Simultaneous with t0: not inside either
        let mut fr = FreeRunning::new(2, 1000);
        fr.advance(0, 0);
        fr.advance(1, 0);
        assert_eq!(fr.windows()[0].register, 0b01);
    }

    #[test]
    fn free_running_reopen_overwrites() {
        let mut fr = FreeRunning::new(2, 1000);
        fr.advance(0, 0);
        fr.advance(1, 100);
        fr.advance(0, 200);
        assert_eq!(fr.windows()[0].register, 0b01);
        assert_eq!(fr.windows()[0].t0, 200);
    }

    #[test]
    fn gated_window() {
        let mut g = Gated::new(0, 1000);
        assert_eq!(g.advance(1, 10), Gate::Idle);
        assert_eq!(g.advance(0, 100), Gate::Opened);
        assert_eq!(g.advance(1, 1100), Gate::Inside);
        assert_eq!(g.advance(2, 1101), Gate::Outside);
        assert_eq!(g.advance(0, 5000), Gate::Closed(0b011));
        assert_eq!(g.window().register, 0b001);
        assert_eq!(g.window().t1, 6000);
    }
}
