//! Shared fixtures for combo integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use combo_engine::chain::{ChainAggregator, ChainMap, select_expiry};
use combo_engine::combo::{
    Collaborators, Combo, ComboAlgo, ComboCore, ComboError, ComboOrder, ComboStrategy, LegRole,
    OrderPurpose, SpreadSpecs,
};
use combo_engine::config::ComboConfig;
use combo_engine::domain::option_position::{
    OptionContract, OptionRight, Portfolio, PositionSide,
};
use combo_engine::domain::shared::{ComboOrderId, PortfolioId, Symbol};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

pub const PRICE: Decimal = dec!(100.4);

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn today() -> NaiveDate {
    date(2025, 1, 2)
}

pub fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, day, hour, 0, 0).unwrap()
}

/// SPY chains on 2025-01-10, 2025-01-17, 2025-02-21 with strikes 95..=105.
pub fn chains() -> Arc<ChainMap> {
    let mut aggregator = ChainAggregator::new("SPY");
    for expiry in [date(2025, 1, 10), date(2025, 1, 17), date(2025, 2, 21)] {
        for strike in 95..=105 {
            for right in [OptionRight::Call, OptionRight::Put] {
                aggregator
                    .add_contract(OptionContract::occ("SPY", Decimal::from(strike), expiry, right))
                    .unwrap();
            }
        }
    }
    aggregator.filter_chains().unwrap();
    Arc::new(aggregator.into_chains())
}

pub fn portfolio() -> Arc<Portfolio> {
    Arc::new(Portfolio::new(PortfolioId::new("pf-test"), "SPY".into(), "integration"))
}

/// One at-the-money call at the front expiry under a fixed role.
pub struct SingleCall {
    pub role: LegRole,
    pub side: PositionSide,
    pub track: bool,
}

impl ComboStrategy for SingleCall {
    fn algo(&self) -> ComboAlgo {
        ComboAlgo::Diagonal
    }

    fn init(
        &mut self,
        core: &mut ComboCore,
        date: NaiveDate,
        price: Decimal,
        specs: &SpreadSpecs,
    ) -> Result<(), ComboError> {
        let chains = core.shared_chains();
        let (expiry, chain) = select_expiry(&chains, date, specs.days_front)?;
        let strike = chain.atm(price)?;
        let id = core.ensure_leg(self.role, expiry, strike, OptionRight::Call, self.side)?;
        if self.track {
            match self.side {
                PositionSide::Long => core.init_track_long_option(id, specs.days_front)?,
                PositionSide::Short => core.init_track_short_option(id, specs.days_front)?,
            }
        }
        Ok(())
    }
}

/// Collaborator callback, as observed by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Activated(Symbol),
    Deactivated(Symbol),
    Submitted(ComboOrderId, OrderPurpose),
    Cancelled(ComboOrderId),
}

/// Records every collaborator callback and the number of contracts the
/// host is showing at each one.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<Event>>>,
    shown: Arc<Mutex<Vec<i64>>>,
}

impl Recorder {
    pub fn collaborators(&self) -> Collaborators {
        let (events, shown) = (Arc::clone(&self.events), Arc::clone(&self.shown));
        let (events2, shown2) = (Arc::clone(&self.events), Arc::clone(&self.shown));
        let events3 = Arc::clone(&self.events);
        let events4 = Arc::clone(&self.events);
        Collaborators::default()
            .with_activate_option(move |contract: &OptionContract, _, _, _| {
                events.lock().unwrap().push(Event::Activated(contract.symbol().clone()));
                let mut shown = shown.lock().unwrap();
                let count = shown.last().copied().unwrap_or(0) + 1;
                shown.push(count);
            })
            .with_deactivate_option(move |contract: &OptionContract| {
                events2.lock().unwrap().push(Event::Deactivated(contract.symbol().clone()));
                let mut shown = shown2.lock().unwrap();
                let count = shown.last().copied().unwrap_or(0) - 1;
                shown.push(count);
            })
            .with_submit_order(move |order: &ComboOrder| {
                events3
                    .lock()
                    .unwrap()
                    .push(Event::Submitted(order.id().clone(), order.purpose()));
            })
            .with_cancel_order(move |id: &ComboOrderId| {
                events4.lock().unwrap().push(Event::Cancelled(id.clone()));
            })
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn shown(&self) -> Vec<i64> {
        self.shown.lock().unwrap().clone()
    }
}

pub fn prepared(strategy: Box<dyn ComboStrategy>, recorder: &Recorder) -> Combo {
    let mut combo = Combo::new(strategy, ComboConfig::default());
    combo.set_portfolio(portfolio());
    combo
        .prepare(
            today(),
            PRICE,
            chains(),
            &SpreadSpecs::new(7, 30),
            recorder.collaborators(),
        )
        .unwrap();
    combo
}

pub fn single(role: LegRole, side: PositionSide, track: bool, recorder: &Recorder) -> Combo {
    prepared(Box::new(SingleCall { role, side, track }), recorder)
}
