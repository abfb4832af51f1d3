pub mod action;
pub mod contact;
pub mod duplicate;
pub mod effect;
pub mod merge;
pub mod quality;

pub use action::{ActionKind, BulkFailure, BulkOutcome, HealthIssueAction, REVIEWED_GROUP};
pub use contact::{NameComponents, Record, RecordsResponse};
pub use duplicate::{DuplicateGroup, DuplicateGroupsResponse, MatchType};
pub use effect::{StoreOp, UndoEffect};
pub use merge::{MergePlan, MergedValue};
pub use quality::{DataQualityIssue, DataQualitySummary, IssueType, Severity};

