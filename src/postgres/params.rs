use std::error::Error;

use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};
use tokio_util::bytes;

use crate::types::RowValues;

/// Borrowed Postgres parameters for one statement.
pub struct Params<'a> {
    references: Vec<&'a (dyn ToSql + Sync)>,
}

impl<'a> Params<'a> {
    #[must_use]
    pub fn convert(params: &'a [RowValues]) -> Params<'a> {
        let mut references = Vec::with_capacity(params.len());
        for p in params {
            references.push(p as &(dyn ToSql + Sync));
        }
        Params { references }
    }

    #[must_use]
    pub fn as_refs(&self) -> &[&(dyn ToSql + Sync)] {
        &self.references
    }
}

/// Narrow an `i64` to the column's integer width, rejecting values that do not fit.
///
/// Each arm goes through `to_sql_checked` so a value bound to a column of another type is an
/// error instead of a malformed wire value.
fn int_to_sql(
    value: i64,
    ty: &Type,
    out: &mut bytes::BytesMut,
) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
    match *ty {
        Type::INT2 => i16::try_from(value)?.to_sql_checked(ty, out),
        Type::INT4 => i32::try_from(value)?.to_sql_checked(ty, out),
        #[allow(clippy::cast_precision_loss)]
        Type::FLOAT8 => (value as f64).to_sql_checked(ty, out),
        _ => value.to_sql_checked(ty, out),
    }
}

impl ToSql for RowValues {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut bytes::BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            RowValues::Int(i) => int_to_sql(*i, ty, out),
            RowValues::Float(f) if *ty == Type::FLOAT4 => {
                #[allow(clippy::cast_possible_truncation)]
                let narrowed = *f as f32;
                narrowed.to_sql_checked(ty, out)
            }
            RowValues::Float(f) => (*f).to_sql_checked(ty, out),
            RowValues::Text(s) => s.to_sql_checked(ty, out),
            RowValues::Bool(b) => (*b).to_sql_checked(ty, out),
            RowValues::Timestamp(dt) => dt.to_sql_checked(ty, out),
            RowValues::Null => Ok(IsNull::Yes),
            RowValues::JSON(jsval) => jsval.to_sql_checked(ty, out),
            RowValues::Blob(bytes) => bytes.to_sql_checked(ty, out),
        }
    }

    fn accepts(ty: &Type) -> bool {
        matches!(
            *ty,
            Type::INT2
                | Type::INT4
                | Type::INT8
                | Type::FLOAT4
                | Type::FLOAT8
                | Type::TEXT
                | Type::VARCHAR
                | Type::BPCHAR
                | Type::NAME
                | Type::BOOL
                | Type::TIMESTAMP
                | Type::JSON
                | Type::JSONB
                | Type::BYTEA
        )
    }

    to_sql_checked!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ints_narrow_to_column_width() {
        let mut out = bytes::BytesMut::new();
        assert!(RowValues::Int(7).to_sql(&Type::INT4, &mut out).is_ok());
        assert_eq!(out.len(), 4);

        let mut out = bytes::BytesMut::new();
        assert!(RowValues::Int(7).to_sql(&Type::INT2, &mut out).is_ok());
        assert_eq!(out.len(), 2);

        let mut out = bytes::BytesMut::new();
        assert!(
            RowValues::Int(i64::from(i32::MAX) + 1)
                .to_sql(&Type::INT4, &mut out)
                .is_err()
        );
        assert!(RowValues::Text("x".into()).to_sql(&Type::INT8, &mut out).is_err());
    }

    #[test]
    fn accepts_only_mapped_types() {
        assert!(<RowValues as ToSql>::accepts(&Type::INT8));
        assert!(<RowValues as ToSql>::accepts(&Type::JSONB));
        assert!(!<RowValues as ToSql>::accepts(&Type::UUID));
    }
}
