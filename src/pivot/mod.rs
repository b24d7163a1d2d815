//! Pivot query compiler.
//!
//! A pivot groups the working table by its row fields and projects every
//! distinct combination of the column fields into its own aggregate column:
//!
//! 1. Probe the live schema and resolve field names ([`ColumnMap`]).
//! 2. Enumerate distinct column-field combinations.
//! 3. Label each combination; colliding labels share one column whose
//!    condition ORs the combinations ([`LabelGroup`]).
//! 4. Emit one `CASE`-guarded aggregate per label ([`PivotPlanner`]).
//! 5. Run it and shape the result ([`PivotResult`]).

mod column_map;
mod compile;
mod error;
mod labels;
mod planner;
mod request;
mod result;

pub use column_map::ColumnMap;
pub use compile::{compile_pivot, plan_pivot, PivotPlan};
pub use error::PivotError;
pub use labels::{combination_condition, combination_label, label_groups, LabelGroup};
pub use planner::PivotPlanner;
pub use request::{AggregateFunc, PivotOptions, PivotRequest};
pub use result::{PivotColumn, PivotResult};
