mod decile;
mod grouped;
mod regional;
mod summary;

pub use decile::{DecileAssignment, DecileClassifier, EmptyQuantile, quantile_edges};
pub use grouped::{GroupFailure, GroupKey, GroupedClassification, ScenarioRow, classify_groups_csv};
pub use regional::{ClassifiedRegion, RegionalDataset, RegionalStat};
pub use summary::{CountryDecileSummary, GlobalAggregator, PopEstimate};
