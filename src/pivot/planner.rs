//! SQL synthesis for pivots. Pure: nothing here touches the engine.

use super::labels::LabelGroup;
use super::request::{AggregateFunc, PivotOptions};
use crate::sql::{
    case_when, coalesce, col, func, lit_int, lit_str, Expr, ExprExt, OrderByExpr, Query,
    SelectExpr, StorageType, TableRef,
};

/// Characters stripped from the value column before it is cast.
const VALUE_NOISE: [&str; 4] = ["$", "€", ",", " "];

/// Builds the statements a pivot sends to the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotPlanner {
    table: String,
    round_digits: u32,
}

impl Default for PivotPlanner {
    fn default() -> Self {
        Self::new(&PivotOptions::default())
    }
}

impl PivotPlanner {
    pub fn new(options: &PivotOptions) -> Self {
        Self {
            table: options.table.clone(),
            round_digits: options.round_digits,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// `SELECT * FROM table LIMIT 0`, for reading the live column names.
    pub fn schema_query(&self) -> Query {
        Query::new()
            .select_star()
            .from(TableRef::new(&self.table))
            .limit(0)
    }

    /// Distinct combinations of the column fields, ordered.
    pub fn distinct_query(&self, column_fields: &[String]) -> Query {
        Query::new()
            .distinct()
            .select(column_fields.iter().map(|f| col(f)).collect::<Vec<Expr>>())
            .from(TableRef::new(&self.table))
            .order_by(column_fields.iter().map(|f| OrderByExpr::new(col(f))).collect())
    }

    /// Numeric form of the value column: noise stripped, `-` as NULL, cast
    /// to DOUBLE, failed casts as 0.
    pub fn sanitized_value(value_field: &str) -> Expr {
        let text = col(value_field).cast(StorageType::Varchar);
        let stripped = VALUE_NOISE
            .iter()
            .fold(text, |acc, noise| func("REPLACE", vec![acc, lit_str(noise), lit_str("")]));
        let number = func("NULLIF", vec![stripped, lit_str("-")]).try_cast(StorageType::Double);
        coalesce(vec![number, lit_int(0)])
    }

    /// One aggregate column for a label group, aliased by its label.
    pub fn aggregate_expr(
        &self,
        group: &LabelGroup,
        value_field: &str,
        aggregate: AggregateFunc,
    ) -> SelectExpr {
        let condition = group.condition();
        let expr = match aggregate {
            AggregateFunc::Count => func("COUNT", vec![case_when(condition, lit_int(1))]),
            _ => func(
                "ROUND",
                vec![
                    func(
                        aggregate.sql_name(),
                        vec![case_when(condition, Self::sanitized_value(value_field))],
                    ),
                    lit_int(i64::from(self.round_digits)),
                ],
            ),
        };
        expr.alias(&group.label)
    }

    /// `SELECT rows, aggregates FROM table GROUP BY rows ORDER BY rows`.
    pub fn build_query(
        &self,
        row_fields: &[String],
        groups: &[LabelGroup],
        value_field: &str,
        aggregate: AggregateFunc,
    ) -> Query {
        let mut select: Vec<SelectExpr> = row_fields.iter().map(|f| col(f).into()).collect();
        select.extend(
            groups
                .iter()
                .map(|g| self.aggregate_expr(g, value_field, aggregate)),
        );

        Query::new()
            .select(select)
            .from(TableRef::new(&self.table))
            .group_by(row_fields.iter().map(|f| col(f)).collect())
            .order_by(row_fields.iter().map(|f| OrderByExpr::new(col(f))).collect())
    }
}
