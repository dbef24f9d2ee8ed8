//! Chart series output.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Series a combo publishes on each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartSeries {
    /// Net P/L at the tick price.
    ProfitLoss,
    /// Average implied volatility of tracked legs.
    ImpliedVolatility,
    /// Position delta.
    Delta,
    /// Position gamma.
    Gamma,
    /// Position theta.
    Theta,
    /// Position vega.
    Vega,
}

/// One chart sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartPoint {
    /// Series.
    pub series: ChartSeries,
    /// Sample time.
    pub time: DateTime<Utc>,
    /// Value.
    pub value: Decimal,
}

/// Receiver for chart samples.
pub trait ChartSink: Send {
    /// Append one sample.
    fn append(&mut self, point: ChartPoint);
}

impl<F> ChartSink for F
where
    F: FnMut(ChartPoint) + Send,
{
    fn append(&mut self, point: ChartPoint) {
        self(point);
    }
}
