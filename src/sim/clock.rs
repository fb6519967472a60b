/// Ticks in one week (7 days of 96 quarter hours).
pub const WEEK_TICKS: usize = 672;

/// Default tick at which the first weekend starts (Saturday 00:00).
pub const DEFAULT_WEEKEND_START: usize = 480;

/// A simulation clock that tracks ticks over a fixed duration and the
/// weekday/weekend cycle.
///
/// The weekend flag turns on when the tick reaches the next weekend start
/// (which then moves one week ahead) and turns off at every multiple of
/// [`WEEK_TICKS`].
///
/// # Examples
///
/// ```
/// use ev_fleet_sim::sim::clock::Clock;
///
/// let mut clock = Clock::new(3);
/// let mut steps = Vec::new();
///
/// clock.run(|step, weekend| steps.push((step, weekend)));
/// assert_eq!(steps, vec![(0, false), (1, false), (2, false)]);
/// ```
#[derive(Debug, Clone)]
pub struct Clock {
    /// Current tick of the simulation
    current: usize,
    /// Total ticks to run in the simulation
    total: usize,
    /// Tick at which the next weekend begins
    next_weekend: usize,
    weekend: bool,
}

impl Clock {
    /// Creates a new clock with the default weekend start.
    ///
    /// # Arguments
    ///
    /// * `total` - The total number of ticks the clock will run
    pub fn new(total: usize) -> Self {
        Self::with_weekend_start(total, DEFAULT_WEEKEND_START)
    }

    /// Creates a new clock whose first weekend starts at `weekend_start`.
    pub fn with_weekend_start(total: usize, weekend_start: usize) -> Self {
        Self {
            current: 0,
            total,
            next_weekend: weekend_start,
            weekend: false,
        }
    }

    /// Advances the clock by one tick.
    ///
    /// # Returns
    ///
    /// * `Some(tick)` - The current tick (starting from 0) before advancing;
    ///   the weekend flag is updated for that tick
    /// * `None` - If the clock has reached its total ticks
    pub fn tick(&mut self) -> Option<usize> {
        if self.current >= self.total {
            return None;
        }
        let t = self.current;
        if t % WEEK_TICKS == 0 {
            self.weekend = false;
        }
        if t == self.next_weekend {
            self.weekend = true;
            self.next_weekend += WEEK_TICKS;
        }
        self.current += 1;
        Some(t)
    }

    /// Whether the most recent tick fell in a weekend.
    pub fn weekend(&self) -> bool {
        self.weekend
    }

    /// Ticks already handed out.
    pub fn elapsed(&self) -> usize {
        self.current
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Runs a function for each remaining tick with its weekend flag.
    pub fn run(&mut self, mut f: impl FnMut(usize, bool)) {
        while let Some(t) = self.tick() {
            f(t, self.weekend);
        }
    }
}
