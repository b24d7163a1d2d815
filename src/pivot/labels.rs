//! Pivot column labels and the conditions behind them.

use crate::engine::CellValue;
use crate::sql::{col, lit_int, lit_float, lit_str, raw_sql, Expr, ExprExt, Literal};
use crate::value::sanitize_identifier;

/// One output pivot column: a label and the source combinations that
/// collapse into it.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelGroup {
    pub label: String,
    /// One ANDed condition per distinct combination, in first-seen order.
    pub conditions: Vec<Expr>,
}

impl LabelGroup {
    /// The group's combined condition: its combinations ORed together.
    pub fn condition(&self) -> Expr {
        match self.conditions.as_slice() {
            [single] => single.clone(),
            _ => {
                let mut parts = self.conditions.iter().cloned().map(|c| c.paren());
                let first = parts.next().unwrap_or_else(|| raw_sql("FALSE"));
                parts.fold(first, |acc, c| acc.or(c))
            }
        }
    }
}

/// Group distinct column-field combinations by label.
///
/// Combinations whose labels collide after sanitization share one group;
/// groups keep the order in which their label first appears.
pub fn label_groups(fields: &[String], combinations: &[Vec<CellValue>]) -> Vec<LabelGroup> {
    let mut groups: Vec<LabelGroup> = Vec::new();
    for combination in combinations {
        let label = combination_label(fields, combination);
        let condition = combination_condition(fields, combination);
        match groups.iter_mut().find(|g| g.label == label) {
            Some(group) => group.conditions.push(condition),
            None => groups.push(LabelGroup {
                label,
                conditions: vec![condition],
            }),
        }
    }
    groups
}

/// `field_value` per column field, joined by `_` and trimmed of `_`.
pub fn combination_label(fields: &[String], combination: &[CellValue]) -> String {
    let joined = fields
        .iter()
        .zip(combination)
        .map(|(field, value)| {
            let text = match value {
                CellValue::Null => "NULL".to_string(),
                other => other.to_string(),
            };
            format!("{}_{}", sanitize_identifier(field), sanitize_identifier(&text))
        })
        .collect::<Vec<_>>()
        .join("_");
    joined.trim_matches('_').to_string()
}

/// Equality conditions for one combination, ANDed.
pub fn combination_condition(fields: &[String], combination: &[CellValue]) -> Expr {
    let mut parts = fields
        .iter()
        .zip(combination)
        .map(|(field, value)| field_condition(field, value));
    let first = parts.next().unwrap_or_else(|| raw_sql("TRUE"));
    parts.fold(first, |acc, c| acc.and(c))
}

fn field_condition(field: &str, value: &CellValue) -> Expr {
    let column = col(field);
    match value {
        CellValue::Null => column.is_null(),
        CellValue::Bool(b) => column.eq(Expr::Literal(Literal::Bool(*b))),
        CellValue::Int(n) => column.eq(lit_int(*n)),
        CellValue::BigInt(n) => match i64::try_from(*n) {
            Ok(small) => column.eq(lit_int(small)),
            Err(_) => column.eq(raw_sql(&n.to_string())),
        },
        CellValue::Float(f) => column.eq(float_literal(*f)),
        CellValue::Text(s) => column.eq(lit_str(s)),
    }
}

fn float_literal(f: f64) -> Expr {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 9.007_199_254_740_992e15 {
        lit_int(f as i64)
    } else if f.is_finite() {
        lit_float(f)
    } else {
        lit_str(&f.to_string())
    }
}
