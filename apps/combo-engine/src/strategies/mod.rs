//! Concrete combo strategies.
//!
//! Each strategy picks contracts from the filtered chain snapshot and
//! assigns a tracking profile per role:
//!
//! | Strategy | Roles |
//! |----------|-------|
//! | [`Collar`] | synthetic long (call + put), cover call, protective put |
//! | [`Strangle`] | short call, short put |
//! | [`Calendar`] | front short call, back long call, same strike |
//! | [`Diagonal`] | front short OTM call, back long ITM call |

mod calendar;
mod collar;
mod diagonal;
mod strangle;

pub use calendar::Calendar;
pub use collar::Collar;
pub use diagonal::Diagonal;
pub use strangle::Strangle;

use chrono::NaiveDate;

use crate::chain::{Chain, ChainMap, select_expiry};
use crate::combo::{ComboAlgo, ComboError};

/// Build a strategy by algorithm tag.
#[must_use]
pub fn for_algo(algo: ComboAlgo) -> Box<dyn crate::combo::ComboStrategy> {
    match algo {
        ComboAlgo::Collar => Box::new(Collar::new()),
        ComboAlgo::Strangle => Box::new(Strangle::new()),
        ComboAlgo::Calendar => Box::new(Calendar::new()),
        ComboAlgo::Diagonal => Box::new(Diagonal::new()),
    }
}

/// Front and back expiries; they must differ.
fn front_and_back(
    chains: &ChainMap,
    date: NaiveDate,
    days_front: i64,
    days_back: i64,
) -> Result<((NaiveDate, &Chain), (NaiveDate, &Chain)), ComboError> {
    let front = select_expiry(chains, date, days_front)?;
    let back = select_expiry(chains, date, days_back)?;
    if back.0 <= front.0 {
        return Err(ComboError::Init(format!(
            "back expiry {} does not follow front expiry {}",
            back.0, front.0
        )));
    }
    Ok((front, back))
}
