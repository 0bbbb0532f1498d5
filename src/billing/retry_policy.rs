use anyhow::Result;
use rust_decimal::{Decimal, RoundingStrategy};

/// Most rungs a ladder may have; `subscriptions.retry_attempts` is checked against it.
pub const MAX_RUNGS: usize = 4;

/// Share of the full amount to attempt at each rung of the retry ladder.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    fractions: Vec<Decimal>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            fractions: vec![
                Decimal::new(100, 2),
                Decimal::new(75, 2),
                Decimal::new(50, 2),
                Decimal::new(25, 2),
            ],
        }
    }
}

impl RetryPolicy {
    pub fn new(fractions: Vec<Decimal>) -> Result<Self> {
        anyhow::ensure!(!fractions.is_empty(), "retry ladder must have at least one rung");
        anyhow::ensure!(
            fractions.len() <= MAX_RUNGS,
            "retry ladder has {} rungs, at most {} allowed",
            fractions.len(),
            MAX_RUNGS
        );
        for f in &fractions {
            anyhow::ensure!(
                *f > Decimal::ZERO && *f <= Decimal::ONE,
                "retry fraction {} out of range (0, 1]",
                f
            );
        }
        Ok(Self { fractions })
    }

    /// Parses a comma-separated ladder such as `1.00,0.75,0.50,0.25`.
    pub fn parse(raw: &str) -> Result<Self> {
        let fractions = raw
            .split(',')
            .map(|s| s.trim().parse::<Decimal>())
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(fractions)
    }

    pub fn fraction_for_attempt(&self, attempt: i32) -> Option<Decimal> {
        usize::try_from(attempt)
            .ok()
            .and_then(|i| self.fractions.get(i))
            .copied()
    }

    pub fn rungs(&self) -> usize {
        self.fractions.len()
    }

    pub fn last_attempt(&self) -> i32 {
        self.fractions.len() as i32 - 1
    }

    /// Amount to charge on `attempt`, rounded to cents and never above `full_amount`.
    ///
    /// `None` past the end of the ladder, or when the rung rounds down to nothing.
    pub fn amount_for_attempt(&self, full_amount: Decimal, attempt: i32) -> Option<Decimal> {
        self.fraction_for_attempt(attempt)
            .map(|f| {
                (full_amount * f)
                    .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
                    .min(full_amount)
            })
            .filter(|amount| *amount > Decimal::ZERO)
    }
}
