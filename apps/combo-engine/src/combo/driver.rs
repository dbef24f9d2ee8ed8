//! `Combo`: a strategy bound to its core.
//!
//! The owner feeds ticks, market data and broker events in, and reads
//! orders and chart points out through the collaborators.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::combo_core::lock_direction;
use super::{
    ChartSink, Collaborators, ComboCore, ComboError, ComboStrategy, LegAction, LegCommand, LegId,
    LegNote, OrderSide, Quote, SpreadSpecs, Tick,
};
use crate::chain::{ChainError, ChainMap};
use crate::config::ComboConfig;
use crate::domain::option_position::{Greeks, Portfolio, Position};
use crate::domain::shared::{ComboOrderId, Symbol};

/// A running multi-leg combo.
pub struct Combo {
    strategy: Box<dyn ComboStrategy>,
    core: ComboCore,
}

impl Combo {
    /// Bind `strategy` to a fresh core.
    #[must_use]
    pub fn new(strategy: Box<dyn ComboStrategy>, config: ComboConfig) -> Self {
        let core = ComboCore::new(config, strategy.algo());
        Self { strategy, core }
    }

    /// Shared state.
    #[must_use]
    pub const fn core(&self) -> &ComboCore {
        &self.core
    }

    /// Shared state, mutably.
    pub const fn core_mut(&mut self) -> &mut ComboCore {
        &mut self.core
    }

    /// Associate the portfolio.
    pub fn set_portfolio(&mut self, portfolio: Arc<Portfolio>) {
        self.core.set_portfolio(portfolio);
    }

    /// Restore a broker position; see `ComboCore::set_position`.
    ///
    /// # Errors
    ///
    /// As `ComboCore::set_position`.
    pub fn set_position(&mut self, position: Position) -> Result<LegNote, ComboError> {
        self.core.set_position(position)
    }

    /// Install chains and collaborators, then let the strategy build its legs.
    ///
    /// Restored positions should be set before this call so their roles
    /// are adopted rather than reopened.
    ///
    /// # Errors
    ///
    /// Returns `Chain(NoChains)` for an empty snapshot or any strategy error.
    #[instrument(skip(self, chains, collaborators), fields(algo = %self.core.algo()))]
    pub fn prepare(
        &mut self,
        date: NaiveDate,
        price: Decimal,
        chains: Arc<ChainMap>,
        specs: &SpreadSpecs,
        collaborators: Collaborators,
    ) -> Result<(), ComboError> {
        if chains.is_empty() {
            return Err(ChainError::NoChains.into());
        }
        self.core.install(chains, collaborators);
        self.core.last_price = Some(price);
        self.core.today = Some(date);
        self.strategy.init(&mut self.core, date, price, specs)?;
        info!(legs = self.core.legs().count(), "Combo prepared");
        Ok(())
    }

    /// Attach the chart sink.
    pub fn set_chart_sink(&mut self, sink: Box<dyn ChartSink>) {
        self.core.set_chart_sink(sink);
    }

    /// Detach the chart sink.
    pub fn del_chart_sink(&mut self) {
        self.core.del_chart_sink();
    }

    /// Evaluate every leg at an underlying update and act on triggers.
    ///
    /// Returns the dispositions acted on. A disposition that fails (say, no
    /// later expiry to roll to) is logged and the leg keeps tracking.
    pub fn tick(
        &mut self,
        slope: Decimal,
        price: Decimal,
        time: DateTime<Utc>,
    ) -> Vec<(LegId, LegAction)> {
        let tick = Tick::new(time, slope, price);
        let triggered = self.core.evaluate(&tick);
        for &(id, action) in &triggered {
            if let Err(e) = self.core.apply_action(id, action, &tick) {
                warn!(leg_id = %id, %action, error = %e, "Leg action failed");
            }
        }
        let net = self.strategy.net(&self.core, price);
        self.core.emit_chart(time, net);
        triggered
    }

    /// Route a quote to legs on `symbol`.
    pub fn on_quote(&mut self, symbol: &Symbol, quote: Quote, time: DateTime<Utc>) -> usize {
        self.core.on_quote(symbol, quote, time)
    }

    /// Route greeks to legs on `symbol`.
    pub fn on_greeks(
        &mut self,
        symbol: &Symbol,
        greeks: Greeks,
        implied_volatility: Decimal,
        time: DateTime<Utc>,
    ) -> usize {
        self.core.on_greeks(symbol, greeks, implied_volatility, time)
    }

    /// Submit the strategy's opening order.
    ///
    /// # Errors
    ///
    /// As `ComboCore::place_order`.
    pub fn place_order(
        &mut self,
        side: OrderSide,
        quantity: Decimal,
    ) -> Result<ComboOrderId, ComboError> {
        self.strategy.place_order(&mut self.core, side, quantity)
    }

    /// Net P/L at underlying `price`.
    #[must_use]
    pub fn net(&self, price: Decimal) -> Decimal {
        self.strategy.net(&self.core, price)
    }

    /// Close everything once net P/L reaches the configured target.
    ///
    /// # Errors
    ///
    /// As `ComboCore::close_positions`.
    pub fn close_for_profits(&mut self, price: Decimal) -> Result<bool, ComboError> {
        let net = self.net(price);
        let target = self.core.config().combo_profit_target;
        if net < target {
            return Ok(false);
        }
        info!(%net, %target, "Combo profit target reached");
        self.core.close_positions()?;
        Ok(true)
    }

    /// Close legs over their take-profit fraction.
    ///
    /// # Errors
    ///
    /// As `ComboCore::take_profits`.
    pub fn take_profits(&mut self) -> Result<Option<ComboOrderId>, ComboError> {
        self.core.take_profits()
    }

    /// See `ComboCore::close_expiry_itm`.
    ///
    /// # Errors
    ///
    /// As `ComboCore::close_legs`.
    pub fn close_expiry_itm(
        &mut self,
        price: Decimal,
        date: NaiveDate,
    ) -> Result<Option<ComboOrderId>, ComboError> {
        self.core.close_expiry_itm(price, date)
    }

    /// See `ComboCore::close_far_itm`.
    ///
    /// # Errors
    ///
    /// As `ComboCore::close_legs`.
    pub fn close_far_itm(&mut self, price: Decimal) -> Result<Option<ComboOrderId>, ComboError> {
        self.core.close_far_itm(price)
    }

    /// See `ComboCore::close_itm_leg`.
    ///
    /// # Errors
    ///
    /// As `ComboCore::close_legs`.
    pub fn close_itm_leg(&mut self, price: Decimal) -> Result<bool, ComboError> {
        self.core.close_itm_leg(price)
    }

    /// See `ComboCore::close_itm_leg_for_profit`.
    ///
    /// # Errors
    ///
    /// As `ComboCore::close_legs`.
    pub fn close_itm_leg_for_profit(&mut self, price: Decimal) -> Result<bool, ComboError> {
        self.core.close_itm_leg_for_profit(price)
    }

    /// See `ComboCore::go_neutral`.
    ///
    /// # Errors
    ///
    /// As `ComboCore::close_legs`.
    pub fn go_neutral(&mut self, date: NaiveDate) -> Result<Option<ComboOrderId>, ComboError> {
        self.core.go_neutral(date)
    }

    /// See `ComboCore::at_close`.
    ///
    /// # Errors
    ///
    /// As `ComboCore::at_close`.
    pub fn at_close(&mut self, date: NaiveDate) -> Result<usize, ComboError> {
        self.core.at_close(date)
    }

    /// Cancel every outstanding order.
    ///
    /// # Errors
    ///
    /// As `ComboCore::cancel_orders`.
    pub fn cancel_orders(&mut self) -> Result<usize, ComboError> {
        self.core.cancel_orders()
    }

    /// Close every live leg.
    ///
    /// # Errors
    ///
    /// As `ComboCore::close_positions`.
    pub fn close_positions(&mut self) -> Result<Option<ComboOrderId>, ComboError> {
        self.core.close_positions()
    }

    /// Whether any order is outstanding.
    #[must_use]
    pub fn are_orders_active(&self) -> bool {
        self.core.are_orders_active()
    }

    /// Broker fill.
    ///
    /// # Errors
    ///
    /// As `ComboCore::on_order_filled`.
    pub fn on_order_filled(&mut self, id: &ComboOrderId) -> Result<(), ComboError> {
        self.core.on_order_filled(id)
    }

    /// Broker cancel.
    ///
    /// # Errors
    ///
    /// As `ComboCore::on_order_cancelled`.
    pub fn on_order_cancelled(&mut self, id: &ComboOrderId) -> Result<(), ComboError> {
        self.core.on_order_cancelled(id)
    }

    /// Run a menu command against a leg.
    ///
    /// # Errors
    ///
    /// Returns the error of the underlying leg operation; a diagonal roll
    /// before any tick returns `NotPrepared`.
    pub fn execute(&mut self, command: LegCommand) -> Result<(), ComboError> {
        info!(?command, "Leg command");
        match command {
            LegCommand::CalendarRoll(id) => self.core.calendar_roll(id).map(|_| ()),
            LegCommand::DiagonalRoll(id) => {
                let price = self
                    .core
                    .last_price()
                    .ok_or(ComboError::NotPrepared("underlying price"))?;
                self.core.diagonal_roll(id, price).map(|_| ())
            }
            LegCommand::Lock(id) => self.core.leg_lock(id, lock_direction(self.core.last_slope)),
            LegCommand::Unlock(id) => self.core.leg_unlock(id),
            LegCommand::Close(id) => self.core.leg_close(id).map(|_| ()),
        }
    }
}

impl std::fmt::Debug for Combo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Combo").field("core", &self.core).finish_non_exhaustive()
    }
}
