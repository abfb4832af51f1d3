//! Analyzers Crate
//!
//! Pure, synchronous analysis over in-memory contact records. Nothing here
//! performs I/O or holds state between calls, so every function can run on a
//! background worker over a snapshot.
//!
//! # Available Analyzers
//!
//! - `similarity`: edit distance and name similarity primitives
//! - `Matcher`: groups probable duplicates
//! - `build_plan`: conflict-free merge proposal for a duplicate group
//! - `QualityScorer` / `summarize`: completeness issues and health score
//!
//! # Example
//!
//! ```rust,ignore
//! use analyzers::{build_plan, Matcher};
//!
//! let groups = Matcher::default().find_duplicates(&records);
//! let plan = build_plan(&groups[0])?;
//! ```

pub mod matcher;
pub mod merge_plan;
pub mod quality;
pub mod report;
pub mod similarity;

pub use matcher::{find_duplicates, Matcher, MatcherConfig};
pub use merge_plan::{build_plan, merged_record, PlanError};
pub use quality::{analyze, summarize, QualityScorer, ScorerConfig};
pub use report::{run_analysis, AnalysisReport};
pub use similarity::{edit_distance, name_similarity};
