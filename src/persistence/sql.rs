//! Translation of [`Predicate`] trees into parameterised SQL.

use sqlx::{Postgres, QueryBuilder};

use crate::domain::filter::{Field, Predicate, Value};

/// Appends `predicate` to `builder` as a parenthesised boolean expression.
///
/// Every operand is bound as a parameter; only column names from
/// [`Field::column`] are spliced into the text.
pub fn push_predicate<F: Field>(
    builder: &mut QueryBuilder<'_, Postgres>,
    predicate: &Predicate<F>,
) {
    match predicate {
        Predicate::And(parts) => push_junction(builder, parts, " AND ", "TRUE"),
        Predicate::Or(parts) => push_junction(builder, parts, " OR ", "FALSE"),
        Predicate::Compare { field, op, value } => {
            builder.push(field.column()).push(' ').push(op.sql()).push(' ');
            push_value(builder, value);
        }
        Predicate::In { field, values } => {
            if values.is_empty() {
                builder.push("FALSE");
                return;
            }
            builder.push(field.column()).push(" IN (");
            for (i, value) in values.iter().enumerate() {
                if i > 0 {
                    builder.push(", ");
                }
                push_value(builder, value);
            }
            builder.push(')');
        }
        Predicate::ContainsIgnoreCase { field, text } => {
            builder
                .push(field.column())
                .push(" ILIKE ")
                .push_bind(format!("%{}%", escape_like(text)));
        }
        Predicate::FieldLessThan { left, right } => {
            builder.push(left.column()).push(" < ").push(right.column());
        }
    }
}

fn push_junction<F: Field>(
    builder: &mut QueryBuilder<'_, Postgres>,
    parts: &[Predicate<F>],
    separator: &str,
    empty: &str,
) {
    if parts.is_empty() {
        builder.push(empty);
        return;
    }
    builder.push('(');
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            builder.push(separator);
        }
        push_predicate(builder, part);
    }
    builder.push(')');
}

fn push_value(builder: &mut QueryBuilder<'_, Postgres>, value: &Value) {
    match value {
        Value::Int(v) => builder.push_bind(*v),
        Value::Bool(v) => builder.push_bind(*v),
        Value::Text(v) => builder.push_bind(v.clone()),
        Value::Timestamp(v) => builder.push_bind(*v),
    };
}

/// Escapes `%`, `_` and `\` so `text` matches literally inside `LIKE`.
#[must_use]
pub fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::filter::CompareOp;
    use crate::domain::search::{EventField, PublicEventFilter};

    fn render(predicate: &Predicate<EventField>) -> String {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT 1 WHERE ");
        push_predicate(&mut builder, predicate);
        builder.sql().to_string()
    }

    #[test]
    fn empty_predicate_is_true() {
        assert_eq!(render(&Predicate::always()), "SELECT 1 WHERE TRUE");
    }

    #[test]
    fn leaves_bind_parameters() {
        let p = Predicate::all_of([
            Some(Predicate::compare(EventField::Id, CompareOp::Ge, 3_i64)),
            Predicate::in_list(EventField::CategoryId, [1_i64, 2]),
        ]);
        assert_eq!(
            render(&p),
            "SELECT 1 WHERE (e.id >= $1 AND e.category_id IN ($2, $3))"
        );
    }

    #[test]
    fn public_filter_renders_text_and_availability() {
        let filter = PublicEventFilter {
            text: Some("jazz".to_string()),
            only_available: true,
            ..PublicEventFilter::default()
        };
        let sql = filter.predicate().map(|p| render(&p)).unwrap_or_default();
        assert_eq!(
            sql,
            "SELECT 1 WHERE (e.state = $1 AND (e.annotation ILIKE $2 OR e.description ILIKE $3) \
             AND (e.participant_limit = $4 OR e.confirmed_requests < e.participant_limit))"
        );
    }

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }
}
