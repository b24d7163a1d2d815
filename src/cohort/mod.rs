//! Cohort grouping compiler.
//!
//! Partitions a trace's raw rows by a `cohort_on` expression (see
//! [`CohortExpression`]) and turns each partition into a column-oriented
//! payload ready to merge into a trace. Grouping is opt-in: without an
//! expression the rows pass through as `{"values": rows}`.

mod compiler;
mod error;
mod expression;
mod result;

pub use compiler::{CohortCompiler, COHORT_VALUE};
pub use error::CohortError;
pub use expression::CohortExpression;
pub use result::{transpose, Cohort, CohortResult};
