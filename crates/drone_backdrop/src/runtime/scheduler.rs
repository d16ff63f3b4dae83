//! Cooperative single-thread scheduler
//!
//! Two kinds of work: one pending frame request at a time (the display
//! refresh callback) and any number of fixed-period intervals. The host
//! drives it by calling [`Scheduler::due_tasks`] with the current time; the
//! returned tasks run to completion one after another on the caller's
//! thread, so nothing here needs locking.

use std::time::Duration;

use slotmap::{new_key_type, SlotMap};

/// Interval ticks delivered per interval per call before re-synchronising
pub const MAX_CATCH_UP_TICKS: u32 = 16;

const MIN_PERIOD: Duration = Duration::from_millis(1);

new_key_type! {
    /// Handle to a registered interval
    pub struct TimerKey;
}

/// Handle to a pending frame request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRequest(u64);

/// A unit of work that became due
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// An interval elapsed
    Interval(TimerKey),
    /// The pending frame request fired
    Frame(FrameRequest),
}

#[derive(Debug, Clone)]
struct Interval {
    period: Duration,
    next_due: Duration,
}

/// Frame requests and intervals keyed on host time
#[derive(Debug, Default)]
pub struct Scheduler {
    intervals: SlotMap<TimerKey, Interval>,
    pending_frame: Option<FrameRequest>,
    next_request: u64,
    now: Duration,
}

impl Scheduler {
    /// Empty scheduler at time zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest time seen
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Request the next frame; returns the existing request if one is pending
    pub fn request_frame(&mut self) -> FrameRequest {
        if let Some(request) = self.pending_frame {
            return request;
        }
        let request = FrameRequest(self.next_request);
        self.next_request += 1;
        self.pending_frame = Some(request);
        request
    }

    /// Cancel a pending frame request; false if it already fired or was cancelled
    pub fn cancel_frame(&mut self, request: FrameRequest) -> bool {
        if self.pending_frame == Some(request) {
            self.pending_frame = None;
            true
        } else {
            false
        }
    }

    /// True while a frame request is pending
    pub fn has_pending_frame(&self) -> bool {
        self.pending_frame.is_some()
    }

    /// Move the clock forward to `now` without collecting due work
    ///
    /// Earlier times are ignored, as in [`Scheduler::due_tasks`].
    pub fn advance_to(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }

    /// Register an interval first due one `period` from now
    pub fn set_interval(&mut self, period: Duration) -> TimerKey {
        let period = period.max(MIN_PERIOD);
        self.intervals.insert(Interval { period, next_due: self.now + period })
    }

    /// Remove an interval; false if the key is stale
    pub fn clear_interval(&mut self, key: TimerKey) -> bool {
        self.intervals.remove(key).is_some()
    }

    /// Number of live intervals
    pub fn interval_count(&self) -> usize {
        self.intervals.len()
    }

    /// Collect work due at `now`
    ///
    /// Interval ticks come first in due-time order, then the pending frame
    /// request if any. An interval that fell more than
    /// [`MAX_CATCH_UP_TICKS`] periods behind delivers that many ticks and
    /// restarts its phase at `now`. Times earlier than the last call are
    /// treated as the last call's time.
    pub fn due_tasks(&mut self, now: Duration) -> Vec<Task> {
        self.now = self.now.max(now);
        let now = self.now;

        let mut ticks = Vec::new();
        for (key, interval) in &mut self.intervals {
            let mut delivered = 0;
            while interval.next_due <= now && delivered < MAX_CATCH_UP_TICKS {
                ticks.push((interval.next_due, key));
                interval.next_due += interval.period;
                delivered += 1;
            }
            if interval.next_due <= now {
                log::warn!("Interval fell behind by more than {MAX_CATCH_UP_TICKS} ticks; resynchronising");
                interval.next_due = now + interval.period;
            }
        }
        ticks.sort_by_key(|(due, _)| *due);

        let mut tasks: Vec<Task> = ticks.into_iter().map(|(_, key)| Task::Interval(key)).collect();
        if let Some(request) = self.pending_frame.take() {
            tasks.push(Task::Frame(request));
        }
        tasks
    }
}
