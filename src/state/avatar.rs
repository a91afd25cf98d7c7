//! Avatar state machine.
//!
//! The machine owns the visible pose and the status label, plus a single timer
//! slot. Every transition replaces the slot before arming the next state's
//! timer, and every timer tick re-checks the owning state tag, so a blink from
//! an earlier state can never overwrite the pose of a later one.
//!
//! Time is passed in by the caller (`now`), which keeps the machine free of
//! wall-clock reads and lets tests fast-forward.

use rand::Rng;
use ratatui::style::Color;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvatarState {
    Idle,
    Thinking,
    Responding,
    Error,
}

impl AvatarState {
    pub fn label(self) -> &'static str {
        match self {
            AvatarState::Idle => "STATUS: ONLINE",
            AvatarState::Thinking => "STATUS: THINKING",
            AvatarState::Responding => "STATUS: RESPONDING",
            AvatarState::Error => "STATUS: ERROR",
        }
    }

    pub fn color(self) -> Color {
        match self {
            AvatarState::Idle | AvatarState::Responding => Color::LightGreen,
            AvatarState::Thinking => Color::LightCyan,
            AvatarState::Error => Color::LightRed,
        }
    }

    /// Pose shown when no sub-animation is in progress.
    pub fn base_image(self) -> AvatarImage {
        match self {
            AvatarState::Idle | AvatarState::Error => AvatarImage::Idle,
            AvatarState::Thinking => AvatarImage::Think,
            AvatarState::Responding => AvatarImage::Talk,
        }
    }

    pub fn is_active(self) -> bool {
        matches!(self, AvatarState::Thinking | AvatarState::Responding)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvatarImage {
    Idle,
    Blink,
    Think,
    ThinkBlink,
    Talk,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvatarTimings {
    pub first_idle_blink: Duration,
    pub idle_blink_min: Duration,
    pub idle_blink_max: Duration,
    pub think_blink_every: Duration,
    pub eyes_closed: Duration,
    pub talk_toggle: Duration,
}

impl Default for AvatarTimings {
    fn default() -> Self {
        Self {
            first_idle_blink: Duration::from_millis(4000),
            idle_blink_min: Duration::from_millis(4000),
            idle_blink_max: Duration::from_millis(8000),
            think_blink_every: Duration::from_millis(3500),
            eyes_closed: Duration::from_millis(300),
            talk_toggle: Duration::from_millis(150),
        }
    }
}

impl AvatarTimings {
    /// Fixed idle interval, used where randomness would get in the way.
    pub fn deterministic() -> Self {
        Self {
            idle_blink_max: Self::default().idle_blink_min,
            ..Self::default()
        }
    }

    fn next_idle_blink(&self) -> Duration {
        let min = self.idle_blink_min.as_millis() as u64;
        let max = (self.idle_blink_max.as_millis() as u64).max(min);
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvatarChange {
    Image(AvatarImage),
    Status(AvatarState),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerPhase {
    /// Eyes open, next blink pending.
    Blink { at: Instant },
    /// Eyes closed; reopen first, then wait for `next_blink`.
    Reopen { at: Instant, next_blink: Instant },
    /// Mouth alternating while text is typed.
    Talk { at: Instant, mouth_open: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ArmedTimer {
    owner: AvatarState,
    phase: TimerPhase,
}

pub struct AvatarMachine {
    state: AvatarState,
    image: AvatarImage,
    timer: Option<ArmedTimer>,
    timings: AvatarTimings,
}

impl AvatarMachine {
    pub fn new(now: Instant, timings: AvatarTimings) -> Self {
        let mut machine = Self {
            state: AvatarState::Idle,
            image: AvatarImage::Idle,
            timer: None,
            timings,
        };
        machine.arm(ArmedTimer {
            owner: AvatarState::Idle,
            phase: TimerPhase::Blink {
                at: now + timings.first_idle_blink,
            },
        });
        machine
    }

    pub fn state(&self) -> AvatarState {
        self.state
    }

    pub fn image(&self) -> AvatarImage {
        self.image
    }

    pub fn label(&self) -> &'static str {
        self.state.label()
    }

    pub fn color(&self) -> Color {
        self.state.color()
    }

    /// State that owns the armed timer, if any. There is never more than one.
    pub fn armed_timer_owner(&self) -> Option<AvatarState> {
        self.timer.map(|timer| timer.owner)
    }

    /// Idle or Error → Thinking.
    pub fn query_submitted(&mut self, now: Instant) -> Vec<AvatarChange> {
        if self.state.is_active() {
            tracing::warn!(state = ?self.state, "query submitted while a cycle is active");
            return Vec::new();
        }
        let next_blink = now + self.timings.think_blink_every;
        self.enter(
            AvatarState::Thinking,
            Some(TimerPhase::Blink { at: next_blink }),
        )
    }

    /// Thinking → Responding on the first text record; no-op afterwards.
    pub fn text_received(&mut self, now: Instant) -> Vec<AvatarChange> {
        if self.state != AvatarState::Thinking {
            return Vec::new();
        }
        let toggle_at = now + self.timings.talk_toggle;
        self.enter(
            AvatarState::Responding,
            Some(TimerPhase::Talk {
                at: toggle_at,
                mouth_open: true,
            }),
        )
    }

    /// Thinking/Responding → Idle. Blinking restarts from scratch, so the
    /// first blink is `first_idle_blink` away.
    pub fn stream_finished(&mut self, now: Instant) -> Vec<AvatarChange> {
        if !self.state.is_active() {
            return Vec::new();
        }
        let next_blink = now + self.timings.first_idle_blink;
        self.enter(AvatarState::Idle, Some(TimerPhase::Blink { at: next_blink }))
    }

    /// Thinking/Responding → Error. Nothing is re-armed; the avatar stays halted.
    pub fn transport_failed(&mut self) -> Vec<AvatarChange> {
        if !self.state.is_active() {
            return Vec::new();
        }
        self.enter(AvatarState::Error, None)
    }

    /// Fire every timer deadline up to `now`, in order.
    pub fn tick(&mut self, now: Instant) -> Vec<AvatarChange> {
        let mut changes = Vec::new();

        while let Some(timer) = self.timer {
            if timer.owner != self.state {
                tracing::warn!(owner = ?timer.owner, state = ?self.state, "dropping stale avatar timer");
                self.timer = None;
                break;
            }

            let next_phase = match timer.phase {
                TimerPhase::Blink { at } if now >= at => {
                    self.show(blink_image(self.state), &mut changes);
                    let next_blink = at + self.blink_interval();
                    TimerPhase::Reopen {
                        at: at + self.timings.eyes_closed,
                        next_blink,
                    }
                }
                TimerPhase::Reopen { at, next_blink } if now >= at => {
                    self.show(self.state.base_image(), &mut changes);
                    TimerPhase::Blink {
                        at: next_blink.max(at),
                    }
                }
                TimerPhase::Talk { at, mouth_open } if now >= at => {
                    let mouth_open = !mouth_open;
                    let image = if mouth_open {
                        AvatarImage::Talk
                    } else {
                        AvatarImage::Idle
                    };
                    self.show(image, &mut changes);
                    TimerPhase::Talk {
                        at: at + self.timings.talk_toggle,
                        mouth_open,
                    }
                }
                _ => break,
            };

            self.timer = Some(ArmedTimer {
                owner: timer.owner,
                phase: next_phase,
            });
        }

        changes
    }

    fn enter(&mut self, state: AvatarState, phase: Option<TimerPhase>) -> Vec<AvatarChange> {
        // Cancel before anything else so the outgoing timer can never fire again.
        self.timer = None;
        tracing::debug!(from = ?self.state, to = ?state, "avatar transition");
        self.state = state;

        let mut changes = vec![AvatarChange::Status(state)];
        self.show(state.base_image(), &mut changes);

        if let Some(phase) = phase {
            self.arm(ArmedTimer {
                owner: state,
                phase,
            });
        }
        changes
    }

    fn arm(&mut self, timer: ArmedTimer) {
        debug_assert!(self.timer.is_none(), "timer slot must be cleared first");
        self.timer = Some(timer);
    }

    fn show(&mut self, image: AvatarImage, changes: &mut Vec<AvatarChange>) {
        if self.image != image {
            self.image = image;
            changes.push(AvatarChange::Image(image));
        }
    }

    fn blink_interval(&self) -> Duration {
        match self.state {
            AvatarState::Thinking => self.timings.think_blink_every,
            _ => self.timings.next_idle_blink(),
        }
    }
}

fn blink_image(state: AvatarState) -> AvatarImage {
    match state {
        AvatarState::Thinking => AvatarImage::ThinkBlink,
        _ => AvatarImage::Blink,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn machine(start: Instant) -> AvatarMachine {
        AvatarMachine::new(start, AvatarTimings::deterministic())
    }

    #[test]
    fn starts_idle_with_idle_blink_armed() {
        let start = Instant::now();
        let avatar = machine(start);
        assert_eq!(avatar.state(), AvatarState::Idle);
        assert_eq!(avatar.image(), AvatarImage::Idle);
        assert_eq!(avatar.label(), "STATUS: ONLINE");
        assert_eq!(avatar.armed_timer_owner(), Some(AvatarState::Idle));
    }

    #[test]
    fn idle_blink_closes_then_reopens_eyes() {
        let start = Instant::now();
        let mut avatar = machine(start);

        assert!(avatar.tick(start + ms(3999)).is_empty());
        assert_eq!(
            avatar.tick(start + ms(4000)),
            vec![AvatarChange::Image(AvatarImage::Blink)]
        );
        assert!(avatar.tick(start + ms(4299)).is_empty());
        assert_eq!(
            avatar.tick(start + ms(4300)),
            vec![AvatarChange::Image(AvatarImage::Idle)]
        );
        // Next blink is a fixed 4000ms after the previous one.
        assert_eq!(
            avatar.tick(start + ms(8000)),
            vec![AvatarChange::Image(AvatarImage::Blink)]
        );
    }

    #[test]
    fn full_cycle_follows_transition_table() {
        let start = Instant::now();
        let mut avatar = machine(start);

        let changes = avatar.query_submitted(start + ms(10));
        assert_eq!(
            changes,
            vec![
                AvatarChange::Status(AvatarState::Thinking),
                AvatarChange::Image(AvatarImage::Think)
            ]
        );
        assert_eq!(avatar.color(), Color::LightCyan);
        assert_eq!(avatar.armed_timer_owner(), Some(AvatarState::Thinking));

        avatar.text_received(start + ms(20));
        assert_eq!(avatar.state(), AvatarState::Responding);
        assert_eq!(avatar.image(), AvatarImage::Talk);
        assert_eq!(avatar.armed_timer_owner(), Some(AvatarState::Responding));

        // A second text record does not re-enter Responding.
        assert!(avatar.text_received(start + ms(30)).is_empty());

        avatar.stream_finished(start + ms(40));
        assert_eq!(avatar.state(), AvatarState::Idle);
        assert_eq!(avatar.image(), AvatarImage::Idle);
        assert_eq!(avatar.label(), "STATUS: ONLINE");
        assert_eq!(avatar.armed_timer_owner(), Some(AvatarState::Idle));
    }

    #[test]
    fn idle_blink_restarts_on_fixed_delay_after_cycle() {
        let start = Instant::now();
        // Random idle intervals; only the restart delay is fixed.
        let mut avatar = AvatarMachine::new(start, AvatarTimings::default());
        avatar.query_submitted(start);
        avatar.text_received(start + ms(10));

        let done = start + ms(500);
        avatar.stream_finished(done);
        assert!(avatar.tick(done + ms(3999)).is_empty());
        assert_eq!(
            avatar.tick(done + ms(4000)),
            vec![AvatarChange::Image(AvatarImage::Blink)]
        );
    }

    #[test]
    fn talk_toggle_alternates_images() {
        let start = Instant::now();
        let mut avatar = machine(start);
        avatar.query_submitted(start);
        avatar.text_received(start);

        assert_eq!(
            avatar.tick(start + ms(150)),
            vec![AvatarChange::Image(AvatarImage::Idle)]
        );
        assert_eq!(
            avatar.tick(start + ms(300)),
            vec![AvatarChange::Image(AvatarImage::Talk)]
        );
        assert_eq!(avatar.state(), AvatarState::Responding);
    }

    #[test]
    fn think_blink_reverts_to_think_pose() {
        let start = Instant::now();
        let mut avatar = machine(start);
        avatar.query_submitted(start);

        assert_eq!(
            avatar.tick(start + ms(3500)),
            vec![AvatarChange::Image(AvatarImage::ThinkBlink)]
        );
        assert_eq!(
            avatar.tick(start + ms(3800)),
            vec![AvatarChange::Image(AvatarImage::Think)]
        );
        assert_eq!(
            avatar.tick(start + ms(7000)),
            vec![AvatarChange::Image(AvatarImage::ThinkBlink)]
        );
    }

    #[test]
    fn transition_during_closed_eyes_suppresses_stale_revert() {
        let start = Instant::now();
        let mut avatar = machine(start);

        avatar.tick(start + ms(4000));
        assert_eq!(avatar.image(), AvatarImage::Blink);

        // Query arrives while the idle blink has its eyes closed.
        avatar.query_submitted(start + ms(4100));
        assert_eq!(avatar.image(), AvatarImage::Think);

        // The idle revert would have fired at 4300; it must not show the idle pose.
        let changes = avatar.tick(start + ms(4400));
        assert!(changes.is_empty());
        assert_eq!(avatar.image(), AvatarImage::Think);
    }

    #[test]
    fn transport_failure_halts_without_blinking() {
        let start = Instant::now();
        let mut avatar = machine(start);
        avatar.query_submitted(start);
        avatar.text_received(start + ms(5));

        let changes = avatar.transport_failed();
        assert_eq!(changes[0], AvatarChange::Status(AvatarState::Error));
        assert_eq!(avatar.label(), "STATUS: ERROR");
        assert_eq!(avatar.color(), Color::LightRed);
        assert_eq!(avatar.image(), AvatarImage::Idle);
        assert_eq!(avatar.armed_timer_owner(), None);

        assert!(avatar.tick(start + Duration::from_secs(60)).is_empty());
        assert_eq!(avatar.image(), AvatarImage::Idle);
    }

    #[test]
    fn error_is_left_by_the_next_query() {
        let start = Instant::now();
        let mut avatar = machine(start);
        avatar.query_submitted(start);
        avatar.transport_failed();

        avatar.query_submitted(start + ms(100));
        assert_eq!(avatar.state(), AvatarState::Thinking);
        assert_eq!(avatar.armed_timer_owner(), Some(AvatarState::Thinking));
    }

    #[test]
    fn transitions_outside_a_cycle_are_ignored() {
        let start = Instant::now();
        let mut avatar = machine(start);
        assert!(avatar.text_received(start).is_empty());
        assert!(avatar.stream_finished(start).is_empty());
        assert!(avatar.transport_failed().is_empty());
        assert_eq!(avatar.state(), AvatarState::Idle);
    }

    #[test]
    fn repeated_transitions_never_leave_orphaned_timers() {
        let start = Instant::now();
        let mut avatar = machine(start);
        let mut now = start;

        for round in 0..50u64 {
            // Vary the offsets so transitions land on every timer phase.
            now += ms(3990 + (round * 37) % 400);
            for change in avatar.tick(now) {
                if let AvatarChange::Image(image) = change {
                    assert_consistent(avatar.state(), image);
                }
            }
            avatar.query_submitted(now);
            assert_eq!(avatar.armed_timer_owner(), Some(AvatarState::Thinking));

            now += ms(3400 + (round * 53) % 300);
            for change in avatar.tick(now) {
                if let AvatarChange::Image(image) = change {
                    assert_consistent(avatar.state(), image);
                }
            }
            if round % 3 == 0 {
                avatar.transport_failed();
                assert_eq!(avatar.armed_timer_owner(), None);
                continue;
            }
            avatar.text_received(now);
            now += ms((round * 71) % 500);
            for change in avatar.tick(now) {
                if let AvatarChange::Image(image) = change {
                    assert_consistent(avatar.state(), image);
                }
            }
            avatar.stream_finished(now);
            assert_eq!(avatar.armed_timer_owner(), Some(AvatarState::Idle));
            assert_eq!(avatar.image(), AvatarImage::Idle);
        }
    }

    fn assert_consistent(state: AvatarState, image: AvatarImage) {
        let allowed: &[AvatarImage] = match state {
            AvatarState::Idle => &[AvatarImage::Idle, AvatarImage::Blink],
            AvatarState::Thinking => &[AvatarImage::Think, AvatarImage::ThinkBlink],
            AvatarState::Responding => &[AvatarImage::Talk, AvatarImage::Idle],
            AvatarState::Error => &[AvatarImage::Idle],
        };
        assert!(
            allowed.contains(&image),
            "{image:?} shown while {state:?}"
        );
    }
}
