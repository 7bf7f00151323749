//! Commission split validation.
//!
//! Pure pre-check, called before any persistence. The sum of the proposed
//! percentages may sit anywhere at or below the series ceiling; whatever is
//! not allocated stays with the issuer and is not an error.

use crate::{
    catalog::SeriesRecord,
    error::{EngineError, EngineResult},
    investment::SplitLine,
};

/// Accepts the split iff the percentage sum does not exceed the series'
/// annual commission ceiling. Zero lines participate in the sum (adding
/// nothing) and are excluded later at scheduling time, not here.
pub fn validate_split(series: &SeriesRecord, lines: &[SplitLine]) -> EngineResult<()> {
    let attempted: f64 = lines.iter().map(|l| l.percent).sum();
    let ceiling = series.max_commission_percent;

    if attempted > ceiling {
        return Err(EngineError::CapExceeded { attempted, ceiling });
    }
    Ok(())
}
