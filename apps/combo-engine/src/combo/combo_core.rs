//! Combo leg bookkeeping shared by every strategy.
//!
//! `ComboCore` owns the role → leg multimap, the outstanding order set, the
//! collaborators and the chain snapshot. Strategies drive it through
//! `open_leg`/`ensure_leg` and the `init_track_*` helpers; the order book,
//! roll protocol and profit rules extend it from sibling modules.
//!
//! Every mutating method takes `&mut self`. There is no internal locking:
//! fills, cancels and market data must be delivered by the combo's owner.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::{
    ChartPoint, ChartSeries, ChartSink, Collaborators, ComboAlgo, ComboError, ComboLeg,
    ComboOrder, LegAction, LegId, LegNote, LegRole, LegState, LegView, LockDirection,
    MenuActivation, NoteState, Quote, RollPair, Tick, TrackProfile,
};
use crate::chain::ChainMap;
use crate::config::ComboConfig;
use crate::domain::option_position::{
    Greeks, Leg, OptionContract, OptionRight, Portfolio, Position, PositionSide,
};
use crate::domain::shared::{ComboOrderId, Symbol};

/// Shared state and leg operations of a combo.
pub struct ComboCore {
    pub(super) config: ComboConfig,
    pub(super) algo: ComboAlgo,
    pub(super) portfolio: Option<Arc<Portfolio>>,
    pub(super) chains: Arc<ChainMap>,
    pub(super) collaborators: Collaborators,
    pub(super) legs: BTreeMap<LegRole, Vec<ComboLeg>>,
    pub(super) orders: HashMap<ComboOrderId, ComboOrder>,
    pub(super) rolls: Vec<RollPair>,
    pub(super) profiles: BTreeMap<LegRole, TrackProfile>,
    pub(super) last_price: Option<Decimal>,
    pub(super) last_slope: Decimal,
    pub(super) today: Option<NaiveDate>,
    chart: Option<Box<dyn ChartSink>>,
    installed: bool,
    next_leg_id: u64,
}

impl ComboCore {
    /// Empty core for a strategy.
    #[must_use]
    pub fn new(config: ComboConfig, algo: ComboAlgo) -> Self {
        Self {
            config,
            algo,
            portfolio: None,
            chains: Arc::new(ChainMap::new()),
            collaborators: Collaborators::default(),
            legs: BTreeMap::new(),
            orders: HashMap::new(),
            rolls: Vec::new(),
            profiles: BTreeMap::new(),
            last_price: None,
            last_slope: Decimal::ZERO,
            today: None,
            chart: None,
            installed: false,
            next_leg_id: 1,
        }
    }

    /// Thresholds.
    #[must_use]
    pub const fn config(&self) -> &ComboConfig {
        &self.config
    }

    /// Strategy tag written into leg notes.
    #[must_use]
    pub const fn algo(&self) -> ComboAlgo {
        self.algo
    }

    /// Portfolio all leg positions roll up to.
    #[must_use]
    pub const fn portfolio(&self) -> Option<&Arc<Portfolio>> {
        self.portfolio.as_ref()
    }

    /// Associate the portfolio.
    pub fn set_portfolio(&mut self, portfolio: Arc<Portfolio>) {
        info!(portfolio_id = %portfolio.id(), "Combo portfolio set");
        self.portfolio = Some(portfolio);
    }

    /// Chain snapshot from `prepare`.
    #[must_use]
    pub fn chains(&self) -> &ChainMap {
        &self.chains
    }

    /// Shared handle on the chain snapshot.
    #[must_use]
    pub fn shared_chains(&self) -> Arc<ChainMap> {
        Arc::clone(&self.chains)
    }

    /// Swap in the chain snapshot and collaborators.
    ///
    /// The first install activates legs restored before it.
    pub(super) fn install(&mut self, chains: Arc<ChainMap>, collaborators: Collaborators) {
        self.chains = chains;
        self.collaborators = collaborators;
        if std::mem::replace(&mut self.installed, true) {
            return;
        }
        let mut announced = 0;
        for leg in self.legs.values().flatten().filter(|l| l.state().is_live()) {
            (self.collaborators.activate_option)(
                leg.contract(),
                leg.position(),
                leg.role().as_str(),
                MenuActivation::standard(leg.id()),
            );
            announced += 1;
        }
        if announced > 0 {
            info!(legs = announced, "Restored legs activated");
        }
    }

    /// Underlying price of the latest tick.
    #[must_use]
    pub const fn last_price(&self) -> Option<Decimal> {
        self.last_price
    }

    // ------------------------------------------------------------------
    // Leg map
    // ------------------------------------------------------------------

    /// Every leg, grouped by role.
    pub fn legs(&self) -> impl Iterator<Item = &ComboLeg> {
        self.legs.values().flatten()
    }

    /// Legs held under `role`, oldest first.
    #[must_use]
    pub fn legs_for(&self, role: LegRole) -> &[ComboLeg] {
        self.legs.get(&role).map_or(&[], Vec::as_slice)
    }

    /// Number of live legs under `role`.
    #[must_use]
    pub fn role_occupancy(&self, role: LegRole) -> usize {
        self.legs_for(role)
            .iter()
            .filter(|l| l.state().is_live())
            .count()
    }

    /// Newest live leg under `role`.
    #[must_use]
    pub fn live_leg(&self, role: LegRole) -> Option<&ComboLeg> {
        self.legs_for(role).iter().rev().find(|l| l.state().is_live())
    }

    /// Leg by id.
    #[must_use]
    pub fn leg(&self, id: LegId) -> Option<&ComboLeg> {
        self.legs().find(|l| l.id() == id)
    }

    pub(super) fn leg_mut(&mut self, id: LegId) -> Option<&mut ComboLeg> {
        self.legs.values_mut().flatten().find(|l| l.id() == id)
    }

    pub(super) fn find_mut(&mut self, id: LegId) -> Result<&mut ComboLeg, ComboError> {
        self.leg_mut(id).ok_or(ComboError::LegNotFound(id))
    }

    fn next_id(&mut self) -> LegId {
        let id = LegId(self.next_leg_id);
        self.next_leg_id += 1;
        id
    }

    /// Add a leg under its role.
    ///
    /// A role holds one live leg, plus a `rolling_in` partner while its
    /// current leg is `rolling_out`.
    pub(super) fn insert_leg(&mut self, leg: ComboLeg) -> Result<LegId, ComboError> {
        let role = leg.role();
        let id = leg.id();
        let live: Vec<LegState> = self
            .legs_for(role)
            .iter()
            .map(ComboLeg::state)
            .filter(LegState::is_live)
            .collect();
        let allowed = match leg.state() {
            LegState::RollingIn => live.as_slice() == [LegState::RollingOut],
            _ => live.is_empty(),
        };
        if !allowed {
            error!(%role, leg_id = %id, live = live.len(), "Role already holds a live leg");
            return Err(ComboError::RoleOccupied { role });
        }
        self.legs.entry(role).or_default().push(leg);
        Ok(id)
    }

    fn remove_leg(&mut self, id: LegId) -> Option<ComboLeg> {
        let (role, index) = self.legs.iter().find_map(|(role, legs)| {
            legs.iter()
                .position(|l| l.id() == id)
                .map(|index| (*role, index))
        })?;
        let slot = self.legs.get_mut(&role)?;
        let leg = slot.remove(index);
        if slot.is_empty() {
            self.legs.remove(&role);
        }
        Some(leg)
    }

    /// Move a leg to `done`, deactivate it and drop it from the map.
    pub(super) fn retire(&mut self, id: LegId, state: NoteState) -> Result<(), ComboError> {
        let algo = self.algo;
        let leg = self.find_mut(id)?;
        leg.transition(LegState::Done)?;
        write_note(algo, leg, state);
        leg.tracker_mut().unbind();

        if let Some(leg) = self.remove_leg(id) {
            (self.collaborators.deactivate_option)(leg.contract());
            info!(
                leg_id = %id,
                role = %leg.role(),
                symbol = %leg.contract().symbol(),
                note = %state,
                "Leg retired"
            );
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Leg construction
    // ------------------------------------------------------------------

    /// Resolve the contract listed at `expiry`/`strike`/`right`.
    ///
    /// # Errors
    ///
    /// Returns a chain lookup error or `OptionUnavailable`.
    pub fn resolve_option(
        &mut self,
        expiry: NaiveDate,
        strike: Decimal,
        right: OptionRight,
    ) -> Result<OptionContract, ComboError> {
        let chain = self
            .chains
            .get(&expiry)
            .ok_or(crate::chain::ChainError::DateNotFound { date: expiry })?;
        let symbol = chain.name(strike, right)?.clone();
        self.construct_option(symbol)
    }

    pub(super) fn construct_option(
        &mut self,
        symbol: Symbol,
    ) -> Result<OptionContract, ComboError> {
        (self.collaborators.construct_option)(&symbol).ok_or(ComboError::OptionUnavailable(symbol))
    }

    /// Construct position and leg, then announce it; the leg ends `loaded`.
    pub(super) fn build_leg(
        &mut self,
        role: LegRole,
        contract: OptionContract,
        side: PositionSide,
        quantity: Decimal,
        prior_note: &str,
    ) -> Result<ComboLeg, ComboError> {
        let portfolio = self
            .portfolio
            .clone()
            .ok_or(ComboError::NotPrepared("portfolio"))?;
        let position = (self.collaborators.construct_position)(&portfolio, &contract, prior_note);
        let id = self.next_id();
        let mut leg = ComboLeg::opening(id, role, Leg::new(contract, side, quantity), position);
        leg.transition(LegState::Loaded)?;
        write_note(self.algo, &mut leg, NoteState::Vacant);
        self.activate(&leg);
        Ok(leg)
    }

    fn activate(&mut self, leg: &ComboLeg) {
        (self.collaborators.activate_option)(
            leg.contract(),
            leg.position(),
            leg.role().as_str(),
            MenuActivation::standard(leg.id()),
        );
    }

    /// Open a new leg under `role` from the chain snapshot.
    ///
    /// # Errors
    ///
    /// Returns `RoleOccupied`, a chain lookup error, `OptionUnavailable` or
    /// `NotPrepared`.
    pub fn open_leg(
        &mut self,
        role: LegRole,
        expiry: NaiveDate,
        strike: Decimal,
        right: OptionRight,
        side: PositionSide,
    ) -> Result<LegId, ComboError> {
        if self.role_occupancy(role) > 0 {
            error!(%role, "Role already holds a live leg");
            return Err(ComboError::RoleOccupied { role });
        }
        let contract = self.resolve_option(expiry, strike, right)?;
        let quantity = self.config.default_quantity;
        let leg = self.build_leg(role, contract, side, quantity, "")?;
        info!(
            leg_id = %leg.id(),
            %role,
            symbol = %leg.contract().symbol(),
            %side,
            "Leg opened"
        );
        self.insert_leg(leg)
    }

    /// Live leg under `role`, opening one when the role is vacant.
    ///
    /// # Errors
    ///
    /// As `open_leg`.
    pub fn ensure_leg(
        &mut self,
        role: LegRole,
        expiry: NaiveDate,
        strike: Decimal,
        right: OptionRight,
        side: PositionSide,
    ) -> Result<LegId, ComboError> {
        if let Some(leg) = self.live_leg(role) {
            debug!(%role, leg_id = %leg.id(), "Reusing restored leg");
            return Ok(leg.id());
        }
        self.open_leg(role, expiry, strike, right, side)
    }

    /// Restore a broker position from its note.
    ///
    /// Open and locked notes rebuild a `loaded` or `locked` leg; closed,
    /// expired and vacant notes are returned without adding a leg.
    /// A leg restored before `prepare` is activated when the collaborators
    /// are installed.
    ///
    /// # Errors
    ///
    /// Returns `Note` for an undecodable note or `RoleOccupied`.
    pub fn set_position(&mut self, position: Position) -> Result<LegNote, ComboError> {
        let note: LegNote = position.note().parse()?;
        if !matches!(note.state, NoteState::Open | NoteState::Locked) {
            info!(symbol = %position.symbol(), state = %note.state, "Skipping inactive position");
            return Ok(note);
        }
        if self.role_occupancy(note.role) > 0 {
            error!(
                role = %note.role,
                symbol = %position.symbol(),
                "Restored position collides with live leg"
            );
            return Err(ComboError::RoleOccupied { role: note.role });
        }

        let side = note.side.unwrap_or(if position.quantity().is_sign_negative() {
            PositionSide::Short
        } else {
            PositionSide::Long
        });
        let leg = Leg::new(position.contract().clone(), side, position.quantity().abs());
        let id = self.next_id();
        let mut combo_leg = ComboLeg::opening(id, note.role, leg, position);
        combo_leg.transition(LegState::Loaded)?;
        if note.state == NoteState::Locked {
            combo_leg.transition(LegState::Locked)?;
        }
        if self.installed {
            self.activate(&combo_leg);
        }
        info!(
            leg_id = %id,
            role = %note.role,
            symbol = %combo_leg.contract().symbol(),
            state = %combo_leg.state(),
            "Position restored"
        );
        self.insert_leg(combo_leg)?;
        Ok(note)
    }

    // ------------------------------------------------------------------
    // Tracking
    // ------------------------------------------------------------------

    /// Bind a leg's tracker and register the tests for its profile.
    ///
    /// The profile is remembered per role so rolled legs are tracked the
    /// same way.
    ///
    /// # Errors
    ///
    /// Returns `LegNotFound`.
    pub fn init_tracker(&mut self, id: LegId, profile: TrackProfile) -> Result<(), ComboError> {
        let config = self.config.clone();
        let leg = self.find_mut(id)?;
        let role = leg.role();
        install_tests(leg, profile, &config);
        debug!(
            leg_id = %id,
            %role,
            side = %profile.side,
            tests = leg.test_count(),
            "Tracker bound"
        );
        self.profiles.insert(role, profile);
        Ok(())
    }

    /// Track a long option: roll out near expiry, roll strike when delta decays.
    ///
    /// # Errors
    ///
    /// Returns `LegNotFound`.
    pub fn init_track_long_option(
        &mut self,
        id: LegId,
        days_to_expiry: i64,
    ) -> Result<(), ComboError> {
        let profile = TrackProfile::long(days_to_expiry, self.config.max_strike_delta);
        self.init_tracker(id, profile)
    }

    /// Track a short option: take profit, lock on trend, roll when threatened.
    ///
    /// # Errors
    ///
    /// Returns `LegNotFound`.
    pub fn init_track_short_option(
        &mut self,
        id: LegId,
        days_to_expiry: i64,
    ) -> Result<(), ComboError> {
        let profile = TrackProfile::short(days_to_expiry, self.config.max_strike_delta);
        self.init_tracker(id, profile)
    }

    /// Register an extra test on a leg.
    ///
    /// # Errors
    ///
    /// Returns `LegNotFound`.
    pub fn add_leg_test<F>(
        &mut self,
        id: LegId,
        action: LegAction,
        test: F,
    ) -> Result<(), ComboError>
    where
        F: FnMut(&LegView<'_>, &Tick) -> bool + Send + 'static,
    {
        self.find_mut(id)?.add_test(action, test);
        Ok(())
    }

    /// Promote and evaluate legs; returns the dispositions to act on.
    ///
    /// `loaded` legs with tests and an open position start tracking. Rolling
    /// legs run their tests but their triggers are not acted on.
    pub(super) fn evaluate(&mut self, tick: &Tick) -> Vec<(LegId, LegAction)> {
        self.last_price = Some(tick.price);
        self.last_slope = tick.slope;
        self.today = Some(tick.time.date_naive());
        let pending = self.pending_legs();

        let mut triggered = Vec::new();
        for leg in self.legs.values_mut().flatten() {
            let id = leg.id();
            if leg.state() == LegState::Loaded
                && leg.test_count() > 0
                && leg.position().is_open()
                && !pending.contains(&id)
            {
                if let Err(e) = leg.transition(LegState::Tracking) {
                    warn!(leg_id = %id, error = %e, "Leg could not start tracking");
                    continue;
                }
            }
            if !leg.state().is_evaluated() {
                continue;
            }
            match (leg.state(), leg.test(tick)) {
                (LegState::Tracking, Some(action)) if !pending.contains(&id) => {
                    debug!(leg_id = %id, %action, price = %tick.price, "Leg test triggered");
                    triggered.push((id, action));
                }
                (state, Some(action)) => {
                    debug!(leg_id = %id, %action, %state, "Trigger deferred");
                }
                _ => {}
            }
        }
        triggered
    }

    /// Carry out a triggered disposition.
    pub(super) fn apply_action(
        &mut self,
        id: LegId,
        action: LegAction,
        tick: &Tick,
    ) -> Result<(), ComboError> {
        match action {
            LegAction::CalendarRoll => self.calendar_roll(id).map(|_| ()),
            LegAction::DiagonalRoll => self.diagonal_roll(id, tick.price).map(|_| ()),
            LegAction::Lock => self.leg_lock(id, lock_direction(tick.slope)),
            LegAction::Close => self.leg_close(id).map(|_| ()),
        }
    }

    /// Suspend a leg's tests.
    ///
    /// # Errors
    ///
    /// Returns `LegNotFound` or `InvalidTransition`.
    pub fn leg_lock(&mut self, id: LegId, direction: LockDirection) -> Result<(), ComboError> {
        let algo = self.algo;
        let leg = self.find_mut(id)?;
        leg.transition(LegState::Locked)?;
        let note = leg_note(algo, leg, NoteState::Locked).locked(direction);
        leg.position_mut().set_note(note.to_string());
        info!(leg_id = %id, role = %leg.role(), %direction, "Leg locked");
        Ok(())
    }

    /// Resume a locked leg's tests.
    ///
    /// # Errors
    ///
    /// Returns `LegNotFound` or `InvalidTransition`.
    pub fn leg_unlock(&mut self, id: LegId) -> Result<(), ComboError> {
        let algo = self.algo;
        let leg = self.find_mut(id)?;
        if leg.state() != LegState::Locked {
            return Err(ComboError::InvalidTransition {
                from: leg.state(),
                to: LegState::Tracking,
                reason: "Leg is not locked".to_string(),
            });
        }
        leg.transition(LegState::Tracking)?;
        write_note(algo, leg, NoteState::Open);
        info!(leg_id = %id, role = %leg.role(), "Leg unlocked");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Market data
    // ------------------------------------------------------------------

    /// Route a quote to every live leg on `symbol`; returns the match count.
    pub fn on_quote(&mut self, symbol: &Symbol, quote: Quote, time: DateTime<Utc>) -> usize {
        let mut matched = 0;
        for leg in self.legs.values_mut().flatten() {
            if leg.state().is_live() && leg.contract().symbol() == symbol {
                leg.tracker_mut().on_quote(quote, time);
                matched += 1;
            }
        }
        matched
    }

    /// Route greeks to every live leg on `symbol`; returns the match count.
    pub fn on_greeks(
        &mut self,
        symbol: &Symbol,
        greeks: Greeks,
        implied_volatility: Decimal,
        time: DateTime<Utc>,
    ) -> usize {
        let mut matched = 0;
        for leg in self.legs.values_mut().flatten() {
            if leg.state().is_live() && leg.contract().symbol() == symbol {
                leg.tracker_mut().on_greeks(greeks, implied_volatility, time);
                matched += 1;
            }
        }
        matched
    }

    // ------------------------------------------------------------------
    // Valuation and chart
    // ------------------------------------------------------------------

    /// Net P/L valuing each leg with `mark_of`.
    pub fn net_with<F>(&self, mut mark_of: F) -> Decimal
    where
        F: FnMut(&ComboLeg) -> Decimal,
    {
        self.legs()
            .filter(|l| l.state().is_live())
            .map(|l| l.position().unrealized_pnl(mark_of(l)) + l.position().realized_pnl())
            .sum()
    }

    /// Net P/L at tracker marks, intrinsic value where no quote is known.
    #[must_use]
    pub fn mark_to_market(&self, price: Decimal) -> Decimal {
        self.net_with(|leg| {
            leg.tracker()
                .mark()
                .unwrap_or_else(|| leg.contract().intrinsic(price))
        })
    }

    /// Summed position greeks of live legs.
    #[must_use]
    pub fn position_greeks(&self) -> Greeks {
        let mut total = Greeks::ZERO;
        for leg in self.legs().filter(|l| l.state().is_live()) {
            if let Some(greeks) = leg.tracker().greeks() {
                let size = leg.position().quantity() * Decimal::from(leg.contract().multiplier());
                total += greeks.scale(size);
            }
        }
        total
    }

    /// Attach the chart sink.
    pub fn set_chart_sink(&mut self, sink: Box<dyn ChartSink>) {
        self.chart = Some(sink);
    }

    /// Detach the chart sink.
    pub fn del_chart_sink(&mut self) {
        self.chart = None;
    }

    pub(super) fn emit_chart(&mut self, time: DateTime<Utc>, net: Decimal) {
        if self.chart.is_none() {
            return;
        }
        let greeks = self.position_greeks();
        let vols: Vec<Decimal> = self
            .legs()
            .filter(|l| l.state().is_live())
            .filter_map(|l| l.tracker().implied_volatility())
            .collect();

        let mut points = vec![
            (ChartSeries::ProfitLoss, net),
            (ChartSeries::Delta, greeks.delta),
            (ChartSeries::Gamma, greeks.gamma),
            (ChartSeries::Theta, greeks.theta),
            (ChartSeries::Vega, greeks.vega),
        ];
        if !vols.is_empty() {
            let average = vols.iter().sum::<Decimal>() / Decimal::from(vols.len());
            points.push((ChartSeries::ImpliedVolatility, average));
        }

        if let Some(sink) = self.chart.as_mut() {
            for (series, value) in points {
                sink.append(ChartPoint {
                    series,
                    time,
                    value,
                });
            }
        }
    }
}

impl std::fmt::Debug for ComboCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComboCore")
            .field("algo", &self.algo)
            .field("legs", &self.legs)
            .field("orders", &self.orders.len())
            .field("rolls", &self.rolls)
            .finish_non_exhaustive()
    }
}

pub(super) fn lock_direction(slope: Decimal) -> LockDirection {
    if slope.is_sign_negative() {
        LockDirection::Down
    } else {
        LockDirection::Up
    }
}

pub(super) fn leg_note(algo: ComboAlgo, leg: &ComboLeg, state: NoteState) -> LegNote {
    LegNote::new(leg.role(), state)
        .with_side(leg.leg().side())
        .with_right(leg.contract().right())
        .with_algo(algo)
}

pub(super) fn write_note(algo: ComboAlgo, leg: &mut ComboLeg, state: NoteState) {
    let note = leg_note(algo, leg, state);
    leg.position_mut().set_note(note.to_string());
}

/// Register the standard tests for `profile`, in priority order.
pub(super) fn install_tests(leg: &mut ComboLeg, profile: TrackProfile, config: &ComboConfig) {
    leg.tracker_mut().bind(profile);
    let roll_dte = config.roll_dte;
    let max_delta = profile.max_delta;

    match profile.side {
        PositionSide::Long => {
            leg.add_test(LegAction::CalendarRoll, move |view, tick| {
                view.contract().days_to_expiry(tick.time.date_naive()) <= roll_dte
            });
            leg.add_test(LegAction::DiagonalRoll, move |view, _| {
                view.tracker.abs_delta().is_some_and(|delta| delta < max_delta)
            });
        }
        PositionSide::Short => {
            let take_profit = config.take_profit_fraction;
            let lock_slope = config.lock_slope;
            leg.add_test(LegAction::Close, move |view, _| {
                view.profit_fraction().is_some_and(|p| p >= take_profit)
            });
            leg.add_test(LegAction::Lock, move |_, tick| tick.slope.abs() > lock_slope);
            leg.add_test(LegAction::DiagonalRoll, move |view, _| {
                view.tracker.abs_delta().is_some_and(|delta| delta > max_delta)
            });
            leg.add_test(LegAction::CalendarRoll, move |view, tick| {
                view.contract().days_to_expiry(tick.time.date_naive()) <= roll_dte
                    && view.contract().is_itm(tick.price)
            });
        }
    }
}
