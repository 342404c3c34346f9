use crate::types::RowValues;

/// An opaque `WHERE` condition with `?` placeholders and its positional arguments.
///
/// The expression is passed to the database unmodified (apart from placeholder numbering on
/// backends that need it); the engine never parses or checks it.
///
/// ```rust
/// use crud_engine::Filter;
///
/// let filter = Filter::new("en_name = ? AND status = ?").arg("mingyu").arg(2_i64);
/// assert_eq!(filter.args().len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    expr: Option<String>,
    args: Vec<RowValues>,
}

impl Filter {
    #[must_use]
    pub fn new(expr: impl Into<String>) -> Self {
        Self {
            expr: Some(expr.into()),
            args: Vec::new(),
        }
    }

    /// Matches every row.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_args(expr: impl Into<String>, args: Vec<RowValues>) -> Self {
        Self {
            expr: Some(expr.into()),
            args,
        }
    }

    /// Append the next positional argument.
    #[must_use]
    pub fn arg(mut self, value: impl Into<RowValues>) -> Self {
        self.args.push(value.into());
        self
    }

    /// The condition text, `None` when the filter matches every row.
    #[must_use]
    pub fn expr(&self) -> Option<&str> {
        self.expr
            .as_deref()
            .map(str::trim)
            .filter(|expr| !expr.is_empty())
    }

    #[must_use]
    pub fn args(&self) -> &[RowValues] {
        &self.args
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.expr().is_none()
    }
}

impl From<&str> for Filter {
    fn from(expr: &str) -> Self {
        Filter::new(expr)
    }
}
