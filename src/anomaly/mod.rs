pub mod forest;
pub mod scorer;

pub use forest::{IsolationForest, OutlierDetector};
pub use scorer::AnomalyScorer;
