//! Geo Eval Common Library
//!
//! CLIと地図出力で共有される型と評価ロジック

pub mod types;
pub mod error;
pub mod geo;
pub mod parser;
pub mod matcher;
pub mod stats;
pub mod view;

pub use types::{GeoRecord, MatchedPair, ParsedRecords};
pub use error::{Error, Result};
pub use geo::{haversine_km, mean_center, Bounds, LatLng, EARTH_RADIUS_KM};
pub use parser::{parse_coordinate, parse_coordinate_str, parse_jsonl, parse_jsonl_line, record_from_fields};
pub use matcher::{match_predictions, match_with_outcome, MatchOutcome};
pub use stats::{ErrorSummary, ThresholdHit, DEFAULT_THRESHOLDS_KM};
pub use view::{escape_html, LayerControlView, LayerEntry, LegendItem, LegendView, ViewModel, Visibility};
