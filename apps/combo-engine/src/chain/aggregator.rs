//! Chain aggregator: load from discovery, filter once, then walk.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use super::{Chain, ChainError, ChainMap, ContractDiscovery};
use crate::domain::option_position::OptionContract;
use crate::domain::shared::Symbol;
use crate::metrics;

/// Counters from one `load_chains` pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadStats {
    /// Contracts delivered by the provider.
    pub delivered: usize,
    /// Contracts recorded under a new strike side.
    pub recorded: usize,
    /// Re-sent contracts that were ignored.
    pub duplicates: usize,
    /// Expiries created.
    pub expiries: usize,
}

/// Retained expiry after filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpirySummary {
    /// Expiry date.
    pub expiry: NaiveDate,
    /// Strikes kept.
    pub strikes: usize,
    /// Mismatched strikes erased.
    pub pruned: usize,
}

/// Outcome of `filter_chains`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterSummary {
    /// Expiries kept, ascending.
    pub kept: Vec<ExpirySummary>,
    /// Expiries removed for having no matched strike.
    pub dropped: Vec<NaiveDate>,
    /// Mean retained strikes per retained chain.
    pub average_strikes: Decimal,
    /// Retained expiries with fewer strikes than the configured minimum.
    pub thin: Vec<NaiveDate>,
}

enum Decision {
    Keep,
    Prune(Vec<Decimal>),
    Drop,
}

/// Aggregated option chains for one underlying.
#[derive(Debug)]
pub struct ChainAggregator {
    underlying: Symbol,
    chains: ChainMap,
    stats: LoadStats,
    filtered: bool,
    min_strikes: usize,
}

impl ChainAggregator {
    /// Create an empty aggregator.
    #[must_use]
    pub fn new(underlying: impl Into<Symbol>) -> Self {
        Self {
            underlying: underlying.into(),
            chains: ChainMap::new(),
            stats: LoadStats::default(),
            filtered: false,
            min_strikes: 1,
        }
    }

    /// Flag retained chains with fewer strikes than `min_strikes`.
    #[must_use]
    pub const fn with_min_strikes(mut self, min_strikes: usize) -> Self {
        self.min_strikes = min_strikes;
        self
    }

    /// Underlying symbol.
    #[must_use]
    pub const fn underlying(&self) -> &Symbol {
        &self.underlying
    }

    /// Counters accumulated across loads.
    #[must_use]
    pub const fn stats(&self) -> LoadStats {
        self.stats
    }

    /// Whether `filter_chains` has completed.
    #[must_use]
    pub const fn is_filtered(&self) -> bool {
        self.filtered
    }

    /// Enumerate contracts from `discovery` into the chain map.
    ///
    /// Duplicates are ignored; the first registration of a strike side wins.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyFiltered` after filtering, or the provider's failure.
    #[instrument(skip(self, discovery), fields(underlying = %self.underlying))]
    pub async fn load_chains<D>(&mut self, discovery: &D) -> Result<LoadStats, ChainError>
    where
        D: ContractDiscovery + ?Sized,
    {
        if self.filtered {
            return Err(ChainError::AlreadyFiltered);
        }
        let underlying = self.underlying.clone();
        let before = self.stats;
        let delivered = discovery
            .discover(&underlying, &mut |contract: OptionContract| self.record(contract))
            .await?;
        self.stats.delivered += delivered;

        let pass = LoadStats {
            delivered,
            recorded: self.stats.recorded - before.recorded,
            duplicates: self.stats.duplicates - before.duplicates,
            expiries: self.stats.expiries - before.expiries,
        };
        info!(
            delivered = pass.delivered,
            recorded = pass.recorded,
            duplicates = pass.duplicates,
            expiries = self.chains.len(),
            "Chains loaded"
        );
        Ok(pass)
    }

    /// Record one discovered contract.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyFiltered` after filtering.
    pub fn add_contract(&mut self, contract: OptionContract) -> Result<(), ChainError> {
        if self.filtered {
            return Err(ChainError::AlreadyFiltered);
        }
        self.record(contract);
        Ok(())
    }

    fn record(&mut self, contract: OptionContract) {
        let expiry = contract.expiration();
        let chain = self.chains.entry(expiry).or_insert_with(|| {
            info!(underlying = %self.underlying, %expiry, "Chain created");
            self.stats.expiries += 1;
            metrics::record_chain_created(self.underlying.as_str());
            Chain::new()
        });

        let symbol = contract.symbol().clone();
        match chain.insert(contract) {
            Ok(()) => {
                self.stats.recorded += 1;
                metrics::record_contract_recorded(self.underlying.as_str());
            }
            Err(e) => {
                debug!(%symbol, %expiry, error = %e, "Ignoring re-sent contract");
                self.stats.duplicates += 1;
                metrics::record_duplicate_contract(self.underlying.as_str());
            }
        }
    }

    /// Prune incomplete strikes and drop chains with no matched strike.
    ///
    /// Nothing is mutated when the result would be empty.
    ///
    /// # Errors
    ///
    /// Returns `NoChains` with nothing loaded, `AllChainsIncomplete` when
    /// every chain would be dropped, or `AlreadyFiltered` on a second call.
    #[instrument(skip(self), fields(underlying = %self.underlying))]
    pub fn filter_chains(&mut self) -> Result<FilterSummary, ChainError> {
        if self.filtered {
            return Err(ChainError::AlreadyFiltered);
        }
        if self.chains.is_empty() {
            error!("No chains to filter");
            return Err(ChainError::NoChains);
        }

        let decisions: Vec<(NaiveDate, Decision)> = self
            .chains
            .iter()
            .map(|(expiry, chain)| (*expiry, Self::decide(chain)))
            .collect();

        if decisions.iter().all(|(_, d)| matches!(d, Decision::Drop)) {
            error!(
                expiries = decisions.len(),
                "No chain has a strike with both call and put"
            );
            return Err(ChainError::AllChainsIncomplete {
                expiries: decisions.len(),
            });
        }

        let mut kept = Vec::new();
        let mut dropped = Vec::new();
        for (expiry, decision) in decisions {
            let underlying = self.underlying.as_str();
            match decision {
                Decision::Drop => {
                    self.chains.remove(&expiry);
                    info!(%expiry, "Chain dropped, no matched strikes");
                    metrics::record_chain_filter(underlying, "drop");
                    dropped.push(expiry);
                }
                Decision::Keep => {
                    let strikes = self.chains.get(&expiry).map_or(0, Chain::len);
                    info!(%expiry, strikes, "Chain complete");
                    metrics::record_chain_filter(underlying, "keep");
                    kept.push(ExpirySummary {
                        expiry,
                        strikes,
                        pruned: 0,
                    });
                }
                Decision::Prune(mismatched) => {
                    let mut strikes = 0;
                    if let Some(chain) = self.chains.get_mut(&expiry) {
                        for strike in &mismatched {
                            chain.erase(*strike);
                        }
                        strikes = chain.len();
                    }
                    info!(
                        %expiry,
                        matched = strikes,
                        mismatched = mismatched.len(),
                        "Chain pruned"
                    );
                    metrics::record_chain_filter(underlying, "prune");
                    kept.push(ExpirySummary {
                        expiry,
                        strikes,
                        pruned: mismatched.len(),
                    });
                }
            }
        }

        let retained: usize = kept.iter().map(|k| k.strikes).sum();
        let average_strikes = Decimal::from(retained) / Decimal::from(kept.len());
        let thin = kept
            .iter()
            .filter(|k| k.strikes < self.min_strikes)
            .map(|k| k.expiry)
            .collect();

        self.filtered = true;
        metrics::update_chain_gauges(self.underlying.as_str(), kept.len(), retained);
        info!(
            kept = kept.len(),
            dropped = dropped.len(),
            average_strikes = %average_strikes.round_dp(2),
            "Chains filtered"
        );

        Ok(FilterSummary {
            kept,
            dropped,
            average_strikes,
            thin,
        })
    }

    fn decide(chain: &Chain) -> Decision {
        let mismatched: Vec<Decimal> = chain
            .strikes()
            .filter(|(_, entry)| !entry.is_complete())
            .map(|(strike, _)| strike)
            .collect();
        if mismatched.is_empty() {
            Decision::Keep
        } else if mismatched.len() == chain.len() {
            Decision::Drop
        } else {
            Decision::Prune(mismatched)
        }
    }

    /// All chains.
    #[must_use]
    pub const fn chains(&self) -> &ChainMap {
        &self.chains
    }

    /// Consume the aggregator, keeping the chains.
    #[must_use]
    pub fn into_chains(self) -> ChainMap {
        self.chains
    }

    /// Chain for one expiry.
    ///
    /// # Errors
    ///
    /// Returns `DateNotFound`.
    pub fn chain(&self, date: NaiveDate) -> Result<&Chain, ChainError> {
        self.chains.get(&date).ok_or_else(|| {
            warn!(underlying = %self.underlying, %date, "Date not found");
            ChainError::DateNotFound { date }
        })
    }

    /// Expiries with their chains, ascending.
    pub fn expiries(&self) -> impl Iterator<Item = (NaiveDate, &Chain)> {
        self.chains.iter().map(|(date, chain)| (*date, chain))
    }

    /// Every `(expiry, contract)` pair, ascending by expiry then strike.
    pub fn options(&self) -> impl Iterator<Item = (NaiveDate, &OptionContract)> {
        self.chains
            .iter()
            .flat_map(|(date, chain)| chain.contracts().map(move |c| (*date, c)))
    }

    /// Contracts of one expiry.
    ///
    /// # Errors
    ///
    /// Returns `DateNotFound` before yielding anything.
    pub fn chain_options(
        &self,
        date: NaiveDate,
    ) -> Result<impl Iterator<Item = &OptionContract>, ChainError> {
        Ok(self.chain(date)?.contracts())
    }

    /// Visit each expiry.
    pub fn walk_chains<F>(&self, mut visit: F)
    where
        F: FnMut(NaiveDate, &Chain),
    {
        for (date, chain) in self.expiries() {
            visit(date, chain);
        }
    }

    /// Visit each `(expiry, contract)` pair.
    pub fn walk_options<F>(&self, mut visit: F)
    where
        F: FnMut(NaiveDate, &OptionContract),
    {
        for (date, contract) in self.options() {
            visit(date, contract);
        }
    }

    /// Visit the contracts of one expiry.
    ///
    /// # Errors
    ///
    /// Returns `DateNotFound` without calling `visit`.
    pub fn walk_chain<F>(&self, date: NaiveDate, mut visit: F) -> Result<(), ChainError>
    where
        F: FnMut(&OptionContract),
    {
        for contract in self.chain_options(date)? {
            visit(contract);
        }
        Ok(())
    }
}
