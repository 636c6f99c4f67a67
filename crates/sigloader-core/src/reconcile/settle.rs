//! Deferred step queue for "let the cropper settle" waits.
//!
//! The cropper re-renders on its own schedule, so geometry written now can
//! only be read back after a frame or two. Steps are queued against a
//! [`Deadline`] and released by [`SettleQueue::advance`], which the host
//! calls once per animation frame with the current time.
//!
//! Every step belongs to a sequence. Starting a new sequence of a kind
//! supersedes the older one: its pending steps are dropped and never run.

use std::collections::HashMap;
use std::time::Duration;

/// The independent chains of work the reconciler runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SequenceKind {
    Fit,
    Rotate,
    Resize,
}

/// Identifies one started sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceToken {
    kind: SequenceKind,
    id: u64,
}

impl SequenceToken {
    pub fn kind(&self) -> SequenceKind {
        self.kind
    }
}

/// When a queued step becomes due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deadline {
    /// After this many animation frames.
    Frames(u32),
    /// After a timer delay, then this many further frames.
    Delay { after: Duration, then_frames: u32 },
}

#[derive(Debug)]
enum Wait {
    Frames(u32),
    Until { at: Duration, then_frames: u32 },
}

#[derive(Debug)]
struct Pending<S> {
    token: SequenceToken,
    wait: Wait,
    step: S,
    seq: u64,
}

/// Queue of deferred steps keyed by sequence token.
#[derive(Debug)]
pub struct SettleQueue<S> {
    now: Duration,
    next_id: u64,
    next_seq: u64,
    live: HashMap<SequenceKind, u64>,
    pending: Vec<Pending<S>>,
}

impl<S> Default for SettleQueue<S> {
    fn default() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 0,
            next_seq: 0,
            live: HashMap::new(),
            pending: Vec::new(),
        }
    }
}

impl<S> SettleQueue<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time of the most recent `advance`.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Move the clock forward without elapsing a frame.
    ///
    /// Hosts that stop ticking while idle call this before scheduling so new
    /// timers are measured from the real event time.
    pub fn sync_clock(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }

    /// Start a sequence, superseding any live sequence of the same kind.
    pub fn begin(&mut self, kind: SequenceKind) -> SequenceToken {
        self.next_id += 1;
        self.live.insert(kind, self.next_id);
        self.pending.retain(|p| p.token.kind != kind);
        SequenceToken {
            kind,
            id: self.next_id,
        }
    }

    pub fn is_live(&self, token: SequenceToken) -> bool {
        self.live.get(&token.kind) == Some(&token.id)
    }

    /// Queue a step; steps of superseded sequences are silently dropped.
    pub fn schedule(&mut self, token: SequenceToken, deadline: Deadline, step: S) {
        if !self.is_live(token) {
            return;
        }
        let wait = match deadline {
            Deadline::Frames(n) => Wait::Frames(n),
            Deadline::Delay { after, then_frames } => Wait::Until {
                at: self.now + after,
                then_frames,
            },
        };
        self.next_seq += 1;
        self.pending.push(Pending {
            token,
            wait,
            step,
            seq: self.next_seq,
        });
    }

    /// Drop every pending step and end all sequences.
    pub fn cancel_all(&mut self) {
        self.live.clear();
        self.pending.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Elapse one animation frame at time `now` and return the steps that
    /// became due, in the order they were scheduled.
    ///
    /// A timer that expires during this call and still needs frames starts
    /// counting them on the next call.
    pub fn advance(&mut self, now: Duration) -> Vec<(SequenceToken, S)> {
        self.now = self.now.max(now);
        let now = self.now;

        let mut due = Vec::new();
        let mut waiting = Vec::with_capacity(self.pending.len());
        for mut pending in self.pending.drain(..) {
            let ready = match &mut pending.wait {
                Wait::Frames(n) => {
                    *n = n.saturating_sub(1);
                    *n == 0
                }
                Wait::Until { at, then_frames } if *at <= now => {
                    let frames = *then_frames;
                    if frames == 0 {
                        true
                    } else {
                        pending.wait = Wait::Frames(frames);
                        false
                    }
                }
                Wait::Until { .. } => false,
            };
            if ready {
                due.push(pending);
            } else {
                waiting.push(pending);
            }
        }
        self.pending = waiting;

        due.sort_by_key(|p| p.seq);
        due.into_iter()
            .filter(|p| self.is_live(p.token))
            .map(|p| (p.token, p.step))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_sync_clock_rebases_timers() {
        let mut queue = SettleQueue::new();
        queue.sync_clock(ms(5_000));
        let token = queue.begin(SequenceKind::Rotate);
        queue.schedule(
            token,
            Deadline::Delay {
                after: ms(70),
                then_frames: 0,
            },
            "center",
        );

        assert!(queue.advance(ms(5_016)).is_empty());
        assert_eq!(queue.advance(ms(5_080)), vec![(token, "center")]);
    }

    #[test]
    fn test_sync_clock_never_goes_back() {
        let mut queue: SettleQueue<()> = SettleQueue::new();
        queue.sync_clock(ms(100));
        queue.sync_clock(ms(40));
        assert_eq!(queue.now(), ms(100));
    }

    #[test]
    fn test_frames_countdown() {
        let mut queue = SettleQueue::new();
        let token = queue.begin(SequenceKind::Fit);
        queue.schedule(token, Deadline::Frames(2), "zoom");

        assert!(queue.advance(ms(16)).is_empty());
        let due = queue.advance(ms(32));
        assert_eq!(due, vec![(token, "zoom")]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_zero_frames_due_next_advance() {
        let mut queue = SettleQueue::new();
        let token = queue.begin(SequenceKind::Fit);
        queue.schedule(token, Deadline::Frames(0), 1);
        assert_eq!(queue.advance(ms(1)).len(), 1);
    }

    #[test]
    fn test_delay_waits_for_time() {
        let mut queue = SettleQueue::new();
        let token = queue.begin(SequenceKind::Rotate);
        queue.schedule(
            token,
            Deadline::Delay {
                after: ms(70),
                then_frames: 0,
            },
            "center",
        );

        assert!(queue.advance(ms(16)).is_empty());
        assert!(queue.advance(ms(69)).is_empty());
        assert_eq!(queue.advance(ms(70)), vec![(token, "center")]);
    }

    #[test]
    fn test_delay_then_frames() {
        let mut queue = SettleQueue::new();
        let token = queue.begin(SequenceKind::Resize);
        queue.schedule(
            token,
            Deadline::Delay {
                after: ms(30),
                then_frames: 1,
            },
            "fit",
        );

        // Timer expires here; the frame wait starts afterwards
        assert!(queue.advance(ms(33)).is_empty());
        assert_eq!(queue.advance(ms(50)), vec![(token, "fit")]);
    }

    #[test]
    fn test_new_sequence_supersedes_same_kind() {
        let mut queue = SettleQueue::new();
        let first = queue.begin(SequenceKind::Rotate);
        queue.schedule(first, Deadline::Frames(1), "stale");

        let second = queue.begin(SequenceKind::Rotate);
        queue.schedule(second, Deadline::Frames(1), "fresh");
        queue.schedule(first, Deadline::Frames(1), "late stale");

        assert!(!queue.is_live(first));
        assert_eq!(queue.advance(ms(16)), vec![(second, "fresh")]);
    }

    #[test]
    fn test_other_kinds_unaffected() {
        let mut queue = SettleQueue::new();
        let fit = queue.begin(SequenceKind::Fit);
        queue.schedule(fit, Deadline::Frames(1), "fit");
        let rotate = queue.begin(SequenceKind::Rotate);
        queue.schedule(rotate, Deadline::Frames(1), "rotate");

        assert_eq!(queue.advance(ms(16)), vec![(fit, "fit"), (rotate, "rotate")]);
    }

    #[test]
    fn test_cancel_all() {
        let mut queue = SettleQueue::new();
        let token = queue.begin(SequenceKind::Fit);
        queue.schedule(token, Deadline::Frames(1), ());
        queue.cancel_all();

        assert!(queue.is_empty());
        assert!(!queue.is_live(token));
        assert!(queue.advance(ms(16)).is_empty());
    }

    #[test]
    fn test_due_steps_keep_schedule_order() {
        let mut queue = SettleQueue::new();
        let token = queue.begin(SequenceKind::Rotate);
        queue.schedule(
            token,
            Deadline::Delay {
                after: ms(10),
                then_frames: 0,
            },
            "a",
        );
        queue.schedule(token, Deadline::Frames(1), "b");

        let due: Vec<_> = queue.advance(ms(20)).into_iter().map(|(_, s)| s).collect();
        assert_eq!(due, vec!["a", "b"]);
    }

    #[test]
    fn test_clock_never_runs_backwards() {
        let mut queue: SettleQueue<()> = SettleQueue::new();
        queue.advance(ms(100));
        queue.advance(ms(50));
        assert_eq!(queue.now(), ms(100));
    }
}
