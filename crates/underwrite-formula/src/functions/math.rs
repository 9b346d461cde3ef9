//! Math and aggregate functions

use super::{collect_numbers, number_arg, number_result, optional_number_arg};
use crate::error::FormulaResult;
use crate::value::FormulaValue;
use underwrite_core::CellError;

/// SUM function
pub fn fn_sum(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    number_result(collect_numbers(args).map(|nums| nums.iter().sum()))
}

/// AVERAGE function
pub fn fn_average(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    number_result(collect_numbers(args).and_then(|nums| {
        if nums.is_empty() {
            Err(CellError::Div0)
        } else {
            Ok(nums.iter().sum::<f64>() / nums.len() as f64)
        }
    }))
}

/// MIN function
pub fn fn_min(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    number_result(
        collect_numbers(args).map(|nums| nums.into_iter().reduce(f64::min).unwrap_or(0.0)),
    )
}

/// MAX function
pub fn fn_max(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    number_result(
        collect_numbers(args).map(|nums| nums.into_iter().reduce(f64::max).unwrap_or(0.0)),
    )
}

/// COUNT function - counts numbers, errors are not counted and do not propagate
pub fn fn_count(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    let count = args
        .iter()
        .map(|arg| match arg {
            FormulaValue::Number(_) => 1,
            FormulaValue::Array(rows) => rows
                .iter()
                .flatten()
                .filter(|cell| matches!(cell, FormulaValue::Number(_)))
                .count(),
            _ => 0,
        })
        .sum::<usize>();

    Ok(FormulaValue::Number(count as f64))
}

/// ABS(number)
pub fn fn_abs(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    number_result(number_arg(args, 0).map(f64::abs))
}

fn round_by(args: &[FormulaValue], round: fn(f64) -> f64) -> Result<f64, CellError> {
    let number = number_arg(args, 0)?;
    let num_digits = optional_number_arg(args, 1)?.unwrap_or(0.0).trunc() as i32;

    // For negative digits, we round to the left of the decimal point
    let multiplier = 10_f64.powi(num_digits);
    Ok(round(number * multiplier) / multiplier)
}

/// ROUND(number, [num_digits]) - round half away from zero
pub fn fn_round(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    // f64::round already rounds half away from zero: round(2.5) = 3, round(-2.5) = -3
    number_result(round_by(args, f64::round))
}

/// ROUNDUP(number, [num_digits]) - rounds away from zero
pub fn fn_roundup(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    number_result(round_by(args, |n| if n >= 0.0 { n.ceil() } else { n.floor() }))
}

/// ROUNDDOWN(number, [num_digits]) - rounds toward zero
pub fn fn_rounddown(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    number_result(round_by(args, f64::trunc))
}

/// INT(number) - rounds toward negative infinity
pub fn fn_int(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    number_result(number_arg(args, 0).map(f64::floor))
}

/// MOD(number, divisor) - the result has the sign of the divisor
pub fn fn_mod(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    number_result((|| -> Result<f64, CellError> {
        let number = number_arg(args, 0)?;
        let divisor = number_arg(args, 1)?;
        if divisor == 0.0 {
            return Err(CellError::Div0);
        }
        Ok(number - divisor * (number / divisor).floor())
    })())
}

/// POWER(number, power)
pub fn fn_power(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    number_result((|| -> Result<f64, CellError> {
        let number = number_arg(args, 0)?;
        let power = number_arg(args, 1)?;
        if number == 0.0 && power < 0.0 {
            return Err(CellError::Div0);
        }
        Ok(number.powf(power))
    })())
}

/// SQRT(number) - #NUM! for negative numbers
pub fn fn_sqrt(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    number_result(number_arg(args, 0).and_then(|n| {
        if n < 0.0 {
            Err(CellError::Num)
        } else {
            Ok(n.sqrt())
        }
    }))
}

#[cfg(test)]
mod tests {
    use crate::evaluator::eval_str;
    use crate::value::FormulaValue;
    use underwrite_core::CellError;

    fn eval(formula: &str) -> FormulaValue {
        eval_str(formula).unwrap()
    }

    fn assert_approx(result: FormulaValue, expected: f64) {
        match result {
            FormulaValue::Number(n) => assert!(
                (n - expected).abs() < 1e-9,
                "expected {}, got {}",
                expected,
                n
            ),
            other => panic!("expected number {}, got {:?}", expected, other),
        }
    }

    #[test]
    fn test_aggregates() {
        assert_eq!(eval("=SUM(1,2,3)"), FormulaValue::Number(6.0));
        assert_eq!(eval("=AVERAGE(2,4,6)"), FormulaValue::Number(4.0));
        assert_eq!(eval("=MIN(5,2,8,1)"), FormulaValue::Number(1.0));
        assert_eq!(eval("=MAX(5,2,8,1)"), FormulaValue::Number(8.0));
        assert_eq!(eval("=COUNT(1,2,\"a\",3)"), FormulaValue::Number(3.0));
        assert_eq!(eval("=SUM(1,#N/A)"), FormulaValue::Error(CellError::Na));
        assert_eq!(eval("=COUNT(1,#N/A)"), FormulaValue::Number(1.0));
        assert_eq!(eval("=AVERAGE(\"x\")"), FormulaValue::Error(CellError::Div0));
    }

    #[test]
    fn test_rounding() {
        assert_eq!(eval("=ROUND(2.5,0)"), FormulaValue::Number(3.0));
        assert_eq!(eval("=ROUND(-2.5,0)"), FormulaValue::Number(-3.0));
        assert_approx(eval("=ROUND(3.14159,2)"), 3.14);
        assert_approx(eval("=ROUND(1234567,-3)"), 1_235_000.0);
        assert_approx(eval("=ROUNDUP(3.141,2)"), 3.15);
        assert_approx(eval("=ROUNDUP(-3.141,2)"), -3.15);
        assert_approx(eval("=ROUNDDOWN(3.149,2)"), 3.14);
        assert_eq!(eval("=ROUNDDOWN(-3.9)"), FormulaValue::Number(-3.0));
        assert_eq!(eval("=INT(-3.5)"), FormulaValue::Number(-4.0));
        assert_eq!(eval("=ABS(-7)"), FormulaValue::Number(7.0));
    }

    #[test]
    fn test_mod_power_sqrt() {
        assert_eq!(eval("=MOD(10,3)"), FormulaValue::Number(1.0));
        assert_eq!(eval("=MOD(-10,3)"), FormulaValue::Number(2.0));
        assert_eq!(eval("=MOD(10,-3)"), FormulaValue::Number(-2.0));
        assert_eq!(eval("=MOD(1,0)"), FormulaValue::Error(CellError::Div0));
        assert_eq!(eval("=POWER(1.03,2)"), FormulaValue::Number(1.03_f64.powf(2.0)));
        assert_eq!(eval("=POWER(0,-1)"), FormulaValue::Error(CellError::Div0));
        assert_eq!(eval("=SQRT(16)"), FormulaValue::Number(4.0));
        assert_eq!(eval("=SQRT(-1)"), FormulaValue::Error(CellError::Num));
    }
}
