// Histogram regression detection
//
// Finds abrupt, sustained distribution shifts in a daily histogram series:
//
// 1. histogram   - sufficiency gate, normalization, Bhattacharyya distance
// 2. comparator  - one day against a trailing reference window
// 3. scanner     - lookahead confirmation over the whole series
//
// A day is flagged only when it and the following `lookahead_days` days all
// sit at a large and consistent distance from the same reference window. The
// thresholds are fixed heuristics from DetectorConfig, not fitted values.
//
// Everything here works on in-memory series; loading dumps from disk lives in
// crate::series and crate::batch.

mod comparator;
mod config;
mod histogram;
mod scanner;

pub use comparator::{
    compare_day, evaluate_day, population_std_dev, DayComparison, RepresentativePair,
};
pub use config::DetectorConfig;
pub use histogram::{distance, has_insufficient_data, is_degenerate, normalize, peak, total};
pub use scanner::{detect, scan, Regression};
