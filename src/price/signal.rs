use anyhow::{Result, ensure};

/// Time-of-day slots per day at 15-minute resolution.
pub const SLOTS_PER_DAY: usize = 96;

/// Number of most recent same-slot observations averaged per slot.
pub const SMOOTHING_WINDOW: usize = 7;

/// Price series ingestion and per-slot smoothing.
///
/// Each tick's price is filed under its time-of-day slot; the smoothed value
/// of a slot is the mean of its last [`SMOOTHING_WINDOW`] observations, i.e.
/// the same quarter-hour over the most recent week.
///
/// # Examples
///
/// ```
/// use ev_fleet_sim::price::PriceSignal;
///
/// let mut signal = PriceSignal::new(vec![10.0, 20.0]).unwrap();
/// signal.ingest(0);
/// signal.ingest(1);
/// assert_eq!(signal.current(1), 20.0);
/// assert_eq!(signal.baseline(), 15.0);
/// ```
#[derive(Debug, Clone)]
pub struct PriceSignal {
    series: Vec<f64>,
    price_history: Vec<Vec<f64>>,
    ma_price_history: Vec<f64>,
}

impl PriceSignal {
    /// Creates a processor over a non-empty, finite price series.
    pub fn new(series: Vec<f64>) -> Result<Self> {
        ensure!(!series.is_empty(), "price series is empty");
        ensure!(
            series.iter().all(|p| p.is_finite()),
            "price series contains non-finite values"
        );
        Ok(Self {
            series,
            price_history: vec![Vec::new(); SLOTS_PER_DAY],
            ma_price_history: vec![0.0; SLOTS_PER_DAY],
        })
    }

    /// Raw price at tick `t`, wrapping around the series end.
    pub fn observed(&self, t: usize) -> f64 {
        self.series[t % self.series.len()]
    }

    /// Appends the price observed at tick `t` to its time-of-day bucket.
    pub fn fill_history(&mut self, t: usize) {
        let price = self.observed(t);
        self.price_history[t % SLOTS_PER_DAY].push(price);
    }

    /// Recomputes every slot's moving average, rounded to 2 decimals.
    ///
    /// Slots without observations keep their previous value.
    pub fn calc_ma_price_history(&mut self) {
        for (bucket, smoothed) in self
            .price_history
            .iter()
            .zip(self.ma_price_history.iter_mut())
        {
            if bucket.is_empty() {
                continue;
            }
            let window = &bucket[bucket.len().saturating_sub(SMOOTHING_WINDOW)..];
            let mean = window.iter().sum::<f64>() / window.len() as f64;
            *smoothed = round2(mean);
        }
    }

    /// Files tick `t` and refreshes the smoothed view.
    pub fn ingest(&mut self, t: usize) {
        self.fill_history(t);
        self.calc_ma_price_history();
    }

    /// Observed prices per slot, oldest first.
    pub fn price_history(&self) -> &[Vec<f64>] {
        &self.price_history
    }

    /// Smoothed price per slot; always [`SLOTS_PER_DAY`] entries.
    pub fn ma_price_history(&self) -> &[f64] {
        &self.ma_price_history
    }

    /// Smoothed price for the slot of tick `t`.
    pub fn current(&self, t: usize) -> f64 {
        self.ma_price_history[t % SLOTS_PER_DAY]
    }

    /// Mean smoothed price over slots observed so far, or 0 before any ingest.
    pub fn baseline(&self) -> f64 {
        let (sum, n) = self
            .price_history
            .iter()
            .zip(&self.ma_price_history)
            .filter(|(bucket, _)| !bucket.is_empty())
            .fold((0.0, 0_usize), |(sum, n), (_, ma)| (sum + ma, n + 1));
        if n == 0 { 0.0 } else { sum / n as f64 }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
