//! Field extraction from OCR text.
//!
//! - `normalize`: label-anchored line splitting and continuation merge
//! - `engine`: line rules and whole-document fallbacks
//! - `labels`: printed labels and their canonical keys
//! - `dates`: day-first / month-first date parsing
//! - `record`: the canonical key set and the resulting record

mod dates;
mod engine;
mod labels;
mod normalize;
mod record;

pub use dates::{parse_date, parse_day_first, parse_month_first, DateOrder};
pub use engine::{extract_fields, extract_from_lines};
pub use labels::{resolve as resolve_label, LabelPredicate, KEY_HEURISTICS, LABELS};
pub use normalize::{normalize, split_at_labels, LogicalLine};
pub use record::{FieldKey, FieldRecord, FieldValue};
