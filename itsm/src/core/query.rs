//! Encoded table queries.
//!
//! Users describe a query as a list of OR-clauses. Each clause maps a column
//! to a condition such as `"= new"`, `"LIKE SAP"` or `"ISEMPTY"`; all
//! conditions inside one clause must hold. The parsed form serializes into the
//! encoded query string accepted by the table API as `sysparm_query`.

use thiserror::Error;

/// Separator between conditions of one clause.
const AND_SEPARATOR: &str = "^";
/// Separator between OR-clauses.
const OR_SEPARATOR: &str = "^NQ";

/// Condition operators understood by the table API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equals,
    NotEquals,
    LessThan,
    LessOrEqual,
    GreaterThan,
    GreaterOrEqual,
    StartsWith,
    EndsWith,
    Like,
    NotLike,
    In,
    NotIn,
    On,
    NotOn,
    Between,
    SameAs,
    NotSameAs,
    ChangesFrom,
    ChangesTo,
    IsEmpty,
    IsNotEmpty,
    Anything,
    EmptyString,
    ValueChanges,
}

impl Operator {
    const ALL: [Operator; 24] = [
        Operator::Equals,
        Operator::NotEquals,
        Operator::LessThan,
        Operator::LessOrEqual,
        Operator::GreaterThan,
        Operator::GreaterOrEqual,
        Operator::StartsWith,
        Operator::EndsWith,
        Operator::Like,
        Operator::NotLike,
        Operator::In,
        Operator::NotIn,
        Operator::On,
        Operator::NotOn,
        Operator::Between,
        Operator::SameAs,
        Operator::NotSameAs,
        Operator::ChangesFrom,
        Operator::ChangesTo,
        Operator::IsEmpty,
        Operator::IsNotEmpty,
        Operator::Anything,
        Operator::EmptyString,
        Operator::ValueChanges,
    ];

    /// Token as it appears in both user input and the encoded query.
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Equals => "=",
            Operator::NotEquals => "!=",
            Operator::LessThan => "<",
            Operator::LessOrEqual => "<=",
            Operator::GreaterThan => ">",
            Operator::GreaterOrEqual => ">=",
            Operator::StartsWith => "STARTSWITH",
            Operator::EndsWith => "ENDSWITH",
            Operator::Like => "LIKE",
            Operator::NotLike => "NOT LIKE",
            Operator::In => "IN",
            Operator::NotIn => "NOT IN",
            Operator::On => "ON",
            Operator::NotOn => "NOTON",
            Operator::Between => "BETWEEN",
            Operator::SameAs => "SAMEAS",
            Operator::NotSameAs => "NSAMEAS",
            Operator::ChangesFrom => "CHANGESFROM",
            Operator::ChangesTo => "CHANGESTO",
            Operator::IsEmpty => "ISEMPTY",
            Operator::IsNotEmpty => "ISNOTEMPTY",
            Operator::Anything => "ANYTHING",
            Operator::EmptyString => "EMPTYSTRING",
            Operator::ValueChanges => "VALCHANGES",
        }
    }

    /// Unary operators take no argument.
    pub fn is_unary(self) -> bool {
        matches!(
            self,
            Operator::IsEmpty
                | Operator::IsNotEmpty
                | Operator::Anything
                | Operator::EmptyString
                | Operator::ValueChanges
        )
    }

    fn from_token(token: &str) -> Option<Operator> {
        Operator::ALL
            .into_iter()
            .find(|operator| operator.as_str() == token)
    }
}

/// A single `column OPERATOR value` condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub column: String,
    pub operator: Operator,
    /// Always `None` for unary operators, always `Some` for binary ones.
    pub argument: Option<String>,
}

/// Conditions that must all hold.
pub type Clause = Vec<Condition>;

/// One user-facing OR-clause: `(column, "OPERATOR value")` pairs in the order
/// they were written.
pub type RawClause = Vec<(String, String)>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("query clause {index} has no conditions")]
    EmptyClause { index: usize },

    #[error("invalid condition for '{column}': missing operator")]
    MissingOperator { column: String },

    #[error("invalid condition for '{column}': unknown operator '{operator}'")]
    UnknownOperator { column: String, operator: String },

    #[error("invalid condition for '{column}': operator {operator} does not take an argument")]
    UnexpectedArgument { column: String, operator: &'static str },

    #[error("invalid condition for '{column}': operator {operator} requires an argument")]
    MissingArgument { column: String, operator: &'static str },
}

/// Parse user-facing OR-clauses into conditions.
///
/// Clauses and the conditions inside them keep the order they were written in.
pub fn parse_query(raw: &[RawClause]) -> Result<Vec<Clause>, QueryError> {
    raw.iter()
        .enumerate()
        .map(|(index, clause)| {
            if clause.is_empty() {
                return Err(QueryError::EmptyClause { index });
            }
            clause
                .iter()
                .map(|(column, condition)| parse_condition(column, condition))
                .collect::<Result<Clause, QueryError>>()
        })
        .collect()
}

/// Parse `"<OPERATOR> [argument]"` for `column`.
///
/// The operator is separated from its argument by whitespace. Two-word
/// operators (`NOT LIKE`, `NOT IN`) are matched before single-word ones.
pub fn parse_condition(column: &str, condition: &str) -> Result<Condition, QueryError> {
    let condition = condition.trim();
    if condition.is_empty() {
        return Err(QueryError::MissingOperator {
            column: column.to_string(),
        });
    }

    let (operator, rest) = split_operator(condition).ok_or_else(|| {
        let token = condition.split_whitespace().next().unwrap_or(condition);
        QueryError::UnknownOperator {
            column: column.to_string(),
            operator: token.to_string(),
        }
    })?;

    let rest = rest.trim();
    let argument = if operator.is_unary() {
        if !rest.is_empty() {
            return Err(QueryError::UnexpectedArgument {
                column: column.to_string(),
                operator: operator.as_str(),
            });
        }
        None
    } else {
        if rest.is_empty() {
            return Err(QueryError::MissingArgument {
                column: column.to_string(),
                operator: operator.as_str(),
            });
        }
        Some(rest.to_string())
    };

    Ok(Condition {
        column: column.to_string(),
        operator,
        argument,
    })
}

fn split_operator(condition: &str) -> Option<(Operator, &str)> {
    let mut words = condition.splitn(3, char::is_whitespace);
    let first = words.next()?;

    if first == "NOT" {
        let second = words.next()?;
        let operator = Operator::from_token(&format!("{first} {second}"))?;
        return Some((operator, words.next().unwrap_or("")));
    }

    let operator = Operator::from_token(first)?;
    Some((operator, condition[first.len()..].trim_start()))
}

/// Serialize parsed clauses into an encoded query string.
pub fn serialize_query(query: &[Clause]) -> String {
    query
        .iter()
        .map(|clause| {
            clause
                .iter()
                .map(serialize_condition)
                .collect::<Vec<_>>()
                .join(AND_SEPARATOR)
        })
        .collect::<Vec<_>>()
        .join(OR_SEPARATOR)
}

fn serialize_condition(condition: &Condition) -> String {
    format!(
        "{}{}{}",
        condition.column,
        condition.operator.as_str(),
        condition.argument.as_deref().unwrap_or("")
    )
}
