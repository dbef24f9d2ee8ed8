//! Expiry selection over a chain map.

use chrono::{Days, NaiveDate};

use super::{Chain, ChainError, ChainMap};

/// First expiry at least `min_days` after `date`.
///
/// # Errors
///
/// Returns `NoExpiry` when every expiry is too close.
pub fn select_expiry(
    chains: &ChainMap,
    date: NaiveDate,
    min_days: i64,
) -> Result<(NaiveDate, &Chain), ChainError> {
    let no_expiry = ChainError::NoExpiry {
        after: date,
        min_days,
    };
    let earliest = u64::try_from(min_days)
        .ok()
        .and_then(|days| date.checked_add_days(Days::new(days)))
        .unwrap_or(date);
    chains
        .range(earliest..)
        .next()
        .map(|(expiry, chain)| (*expiry, chain))
        .ok_or(no_expiry)
}

/// First expiry strictly after `expiry`.
///
/// # Errors
///
/// Returns `NoExpiry` when `expiry` is the last one.
pub fn next_expiry_after(
    chains: &ChainMap,
    expiry: NaiveDate,
) -> Result<(NaiveDate, &Chain), ChainError> {
    select_expiry(chains, expiry, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    fn chains() -> ChainMap {
        [date(10), date(17), date(24)]
            .into_iter()
            .map(|d| (d, Chain::new()))
            .collect()
    }

    #[test]
    fn picks_first_far_enough_expiry() {
        let chains = chains();
        assert_eq!(select_expiry(&chains, date(3), 7).unwrap().0, date(10));
        assert_eq!(select_expiry(&chains, date(3), 8).unwrap().0, date(17));
        assert_eq!(select_expiry(&chains, date(10), 0).unwrap().0, date(10));
    }

    #[test]
    fn no_expiry_past_the_last() {
        let err = select_expiry(&chains(), date(20), 7).unwrap_err();
        assert!(matches!(err, ChainError::NoExpiry { min_days: 7, .. }));
    }

    #[test]
    fn next_expiry_skips_current() {
        let chains = chains();
        assert_eq!(next_expiry_after(&chains, date(10)).unwrap().0, date(17));
        assert!(next_expiry_after(&chains, date(24)).is_err());
    }
}
