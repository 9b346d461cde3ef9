//! IF, AND, OR, NOT, IFERROR

use crate::error::{FormulaError, FormulaResult};
use crate::value::FormulaValue;
use underwrite_core::CellError;

fn condition(value: &FormulaValue) -> Result<bool, CellError> {
    match value {
        FormulaValue::Error(e) => Err(*e),
        other => other.truthiness().ok_or(CellError::Value),
    }
}

fn arity(name: &str) -> FormulaError {
    FormulaError::Argument(format!("{} called with too few arguments", name))
}

/// IF(condition, value_if_true, [value_if_false])
///
/// Both branches arrive evaluated; only the selected one is returned. A
/// blank branch, such as the empty middle of `IF(A1,,0)`, reads as 0.
pub fn fn_if(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    let [test, if_true, rest @ ..] = args else {
        return Err(arity("IF"));
    };
    let selected = match condition(test) {
        Ok(true) => if_true.clone(),
        Ok(false) => rest.first().cloned().unwrap_or(FormulaValue::Boolean(false)),
        Err(e) => FormulaValue::Error(e),
    };
    Ok(match selected {
        FormulaValue::Empty => FormulaValue::Number(0.0),
        other => other,
    })
}

/// Combine every boolean or number, ranges included, starting from `unit`
///
/// Text and blanks inside ranges are skipped. With nothing to combine the
/// result is `#VALUE!`.
fn fold_logical(args: &[FormulaValue], unit: bool, combine: fn(bool, bool) -> bool) -> FormulaValue {
    let flattened = args.iter().flat_map(|arg| match arg {
        FormulaValue::Array(rows) => rows.iter().flatten().collect::<Vec<_>>(),
        scalar => vec![scalar],
    });

    let mut result: Option<bool> = None;
    for value in flattened {
        let truth = match value {
            FormulaValue::Error(e) => return FormulaValue::Error(*e),
            FormulaValue::Boolean(b) => *b,
            FormulaValue::Number(n) => *n != 0.0,
            _ => continue,
        };
        result = Some(combine(result.unwrap_or(unit), truth));
    }
    result.map_or(FormulaValue::Error(CellError::Value), FormulaValue::Boolean)
}

pub fn fn_and(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    Ok(fold_logical(args, true, |a, b| a && b))
}

pub fn fn_or(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    Ok(fold_logical(args, false, |a, b| a || b))
}

pub fn fn_not(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    let value = args.first().ok_or_else(|| arity("NOT"))?;
    Ok(match condition(value) {
        Ok(b) => FormulaValue::Boolean(!b),
        Err(e) => FormulaValue::Error(e),
    })
}

/// IFERROR(value, value_if_error)
pub fn fn_iferror(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    match args {
        [FormulaValue::Error(_), fallback, ..] => Ok(fallback.clone()),
        [value, _, ..] => Ok(value.clone()),
        _ => Err(arity("IFERROR")),
    }
}

#[cfg(test)]
mod tests {
    use crate::evaluator::eval_str;
    use crate::value::FormulaValue;
    use underwrite_core::CellError;

    fn eval(formula: &str) -> FormulaValue {
        eval_str(formula).unwrap()
    }

    #[test]
    fn test_if() {
        assert_eq!(eval("=IF(TRUE,1,2)"), FormulaValue::Number(1.0));
        assert_eq!(eval("=IF(FALSE,1,2)"), FormulaValue::Number(2.0));
        assert_eq!(eval("=IF(0,1)"), FormulaValue::Boolean(false));
        assert_eq!(eval("=IF(A1,,0)"), FormulaValue::Number(0.0));
        assert_eq!(eval("=IF(A1,1,)"), FormulaValue::Number(0.0));
        assert_eq!(
            eval("=IF(1>0,\"Yes\",\"No\")"),
            FormulaValue::String("Yes".into())
        );
        assert_eq!(eval("=IF(\"x\",1,2)"), FormulaValue::Error(CellError::Value));
    }

    #[test]
    fn test_and_or_not() {
        assert_eq!(eval("=AND(TRUE,1,2>1)"), FormulaValue::Boolean(true));
        assert_eq!(eval("=AND(TRUE,0)"), FormulaValue::Boolean(false));
        assert_eq!(eval("=OR(FALSE,0,1)"), FormulaValue::Boolean(true));
        assert_eq!(eval("=OR(FALSE,0)"), FormulaValue::Boolean(false));
        assert_eq!(eval("=NOT(TRUE)"), FormulaValue::Boolean(false));
        assert_eq!(eval("=NOT(0)"), FormulaValue::Boolean(true));
        assert_eq!(eval("=AND(1,#REF!)"), FormulaValue::Error(CellError::Ref));
    }

    #[test]
    fn test_iferror() {
        assert_eq!(eval("=IFERROR(1/0,0)"), FormulaValue::Number(0.0));
        assert_eq!(eval("=IFERROR(4/2,0)"), FormulaValue::Number(2.0));
    }
}
