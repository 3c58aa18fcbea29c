use std::time::Duration;

/// Count of host loop passes since the clock was built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GameTick(pub u64);

impl GameTick {
    pub fn after(self, ticks: u64) -> Self {
        GameTick(self.0.saturating_add(ticks))
    }

    /// Ticks from `self` until `later`; zero once `later` has passed.
    pub fn until(self, later: GameTick) -> u64 {
        later.0.saturating_sub(self.0)
    }
}

/// Wall-clock length of one tick, at millisecond resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickRate {
    millis: u64,
}

impl TickRate {
    pub fn from_millis(millis: u64) -> Self {
        Self {
            millis: millis.max(1),
        }
    }

    pub fn millis(self) -> u64 {
        self.millis
    }

    /// Ticks needed to cover `span`. A partial tick counts as a whole one.
    pub fn ticks_covering(self, span: Duration) -> u64 {
        let ticks = span.as_millis().div_ceil(u128::from(self.millis));
        u64::try_from(ticks).unwrap_or(u64::MAX)
    }

    pub fn span_of(self, ticks: u64) -> Duration {
        Duration::from_millis(ticks.saturating_mul(self.millis))
    }
}

/// Tick counter advanced once per host loop pass.
#[derive(Debug, Clone)]
pub struct GameClock {
    rate: TickRate,
    now: GameTick,
}

impl GameClock {
    pub fn new(rate: TickRate) -> Self {
        Self {
            rate,
            now: GameTick(0),
        }
    }

    pub fn rate(&self) -> TickRate {
        self.rate
    }

    pub fn now(&self) -> GameTick {
        self.now
    }

    /// Moves to the next tick and returns it.
    pub fn step(&mut self) -> GameTick {
        self.now = self.now.after(1);
        self.now
    }

    pub fn time_until(&self, due: GameTick) -> Duration {
        self.rate.span_of(self.now.until(due))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_rate_is_clamped() {
        assert_eq!(TickRate::from_millis(0).millis(), 1);
    }

    #[test]
    fn partial_ticks_round_up() {
        let rate = TickRate::from_millis(50);
        assert_eq!(rate.ticks_covering(Duration::ZERO), 0);
        assert_eq!(rate.ticks_covering(Duration::from_millis(1)), 1);
        assert_eq!(rate.ticks_covering(Duration::from_millis(100)), 2);
        assert_eq!(rate.ticks_covering(Duration::from_millis(101)), 3);
        assert_eq!(rate.ticks_covering(Duration::from_secs(30)), 600);
        assert_eq!(rate.span_of(600), Duration::from_secs(30));
        assert_eq!(rate.span_of(u64::MAX), Duration::from_millis(u64::MAX));
    }

    #[test]
    fn time_until_counts_down_and_stops_at_zero() {
        let mut clock = GameClock::new(TickRate::from_millis(50));
        let due = clock.now().after(20);
        assert_eq!(clock.time_until(due), Duration::from_secs(1));

        for _ in 0..15 {
            clock.step();
        }
        assert_eq!(clock.now(), GameTick(15));
        assert_eq!(clock.time_until(due), Duration::from_millis(250));

        for _ in 0..10 {
            clock.step();
        }
        assert_eq!(clock.time_until(due), Duration::ZERO);
        assert_eq!(GameTick(30).until(GameTick(25)), 0);
    }
}
