//! Filter operations for table queries

/// Operator for filter expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    /// Equal to
    Eq,

    /// Not equal to
    Neq,

    /// Greater than
    Gt,

    /// Greater than or equal to
    Gte,

    /// Less than
    Lt,

    /// Less than or equal to
    Lte,

    /// Like (case insensitive)
    ILike,

    /// Is (null, true, false)
    Is,

    /// In a list of values
    In,

    /// Array column contains all values
    Contains,
}

impl FilterOperator {
    /// Convert the operator to its string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "eq",
            FilterOperator::Neq => "neq",
            FilterOperator::Gt => "gt",
            FilterOperator::Gte => "gte",
            FilterOperator::Lt => "lt",
            FilterOperator::Lte => "lte",
            FilterOperator::ILike => "ilike",
            FilterOperator::Is => "is",
            FilterOperator::In => "in",
            FilterOperator::Contains => "cs",
        }
    }
}

/// One `column=op.value` condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub operator: FilterOperator,
    pub value: String,
}

impl Filter {
    pub fn new(column: &str, operator: FilterOperator, value: impl Into<String>) -> Self {
        Self {
            column: column.to_string(),
            operator,
            value: value.into(),
        }
    }

    /// `column in (a,b,c)`
    pub fn in_list<T: ToString>(column: &str, values: &[T]) -> Self {
        let values: Vec<String> = values.iter().map(|v| quote_value(&v.to_string())).collect();
        Self::new(column, FilterOperator::In, format!("({})", values.join(",")))
    }

    /// Array column contains every given value
    pub fn contains<T: ToString>(column: &str, values: &[T]) -> Self {
        let values: Vec<String> = values.iter().map(|v| quote_value(&v.to_string())).collect();
        Self::new(column, FilterOperator::Contains, format!("{{{}}}", values.join(",")))
    }

    /// The query parameter pair for this filter
    pub fn to_param(&self) -> (String, String) {
        (
            self.column.clone(),
            format!("{}.{}", self.operator.as_str(), self.value),
        )
    }

    /// The `column.op.value` form used inside `or=(...)`
    pub fn to_logic_term(&self) -> String {
        format!("{}.{}.{}", self.column, self.operator.as_str(), self.value)
    }
}

/// Quote a value that contains characters PostgREST reserves inside lists
pub fn quote_value(value: &str) -> String {
    if value.chars().any(|c| matches!(c, ',' | '(' | ')' | '{' | '}' | '"' | ':' | ' ')) {
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        value.to_string()
    }
}

/// `*term*` with PostgREST wildcards, for case-insensitive substring search
pub fn ilike_contains(term: &str) -> String {
    format!("*{}*", term.replace('*', ""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_params() {
        assert_eq!(
            Filter::new("price", FilterOperator::Gte, "10").to_param(),
            ("price".to_string(), "gte.10".to_string())
        );
        assert_eq!(
            Filter::in_list("category", &["Food", "Home, Garden"]).to_param().1,
            "in.(Food,\"Home, Garden\")"
        );
        assert_eq!(Filter::contains("categories", &["Toys"]).to_param().1, "cs.{Toys}");
    }

    #[test]
    fn logic_terms_for_or_groups() {
        let term =
            Filter::new("title", FilterOperator::ILike, ilike_contains("olive")).to_logic_term();
        assert_eq!(term, "title.ilike.*olive*");
    }
}
