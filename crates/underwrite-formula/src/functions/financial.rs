//! Time-value-of-money functions
//!
//! Sign convention follows Excel: money paid out is negative, money received
//! is positive. `type` 0 means payments at period end, anything else at start.

use super::{collect_numbers, number_arg, number_result, optional_number_arg};
use crate::error::FormulaResult;
use crate::value::FormulaValue;
use underwrite_core::CellError;

fn normalize_type(typ: Option<f64>) -> f64 {
    match typ {
        Some(t) if t != 0.0 => 1.0,
        _ => 0.0,
    }
}

/// Returns `((1+rate)^nper, (1+rate)^nper - 1)` using `ln_1p`/`exp_m1`
/// so small rates keep their precision.
fn pow1p(rate: f64, nper: f64) -> Option<(f64, f64)> {
    let ln1p = rate.ln_1p();
    if !ln1p.is_finite() {
        return None;
    }
    let g_minus_1 = (nper * ln1p).exp_m1();
    let g = g_minus_1 + 1.0;
    if !g.is_finite() || !g_minus_1.is_finite() {
        return None;
    }
    Some((g, g_minus_1))
}

/// Present value.
pub fn pv(rate: f64, nper: f64, pmt: f64, fv: Option<f64>, typ: Option<f64>) -> Result<f64, CellError> {
    let fv = fv.unwrap_or(0.0);
    let typ = normalize_type(typ);

    if rate == 0.0 {
        return Ok(-fv - pmt * nper);
    }
    if rate == -1.0 && nper != 0.0 {
        return Err(CellError::Div0);
    }

    let (g, g_minus_1) = pow1p(rate, nper).ok_or(CellError::Num)?;
    if g == 0.0 {
        return Err(CellError::Div0);
    }

    let pmt_factor = (1.0 + rate * typ) * g_minus_1 / rate;
    Ok(-(fv + pmt * pmt_factor) / g)
}

/// Future value.
pub fn fv(rate: f64, nper: f64, pmt: f64, pv: Option<f64>, typ: Option<f64>) -> Result<f64, CellError> {
    let pv = pv.unwrap_or(0.0);
    let typ = normalize_type(typ);

    if rate == 0.0 {
        return Ok(-(pv + pmt * nper));
    }

    let (g, g_minus_1) = pow1p(rate, nper).ok_or(CellError::Num)?;
    let pmt_factor = (1.0 + rate * typ) * g_minus_1 / rate;

    Ok(-(pv * g + pmt * pmt_factor))
}

/// Periodic payment.
pub fn pmt(rate: f64, nper: f64, pv: f64, fv: Option<f64>, typ: Option<f64>) -> Result<f64, CellError> {
    let fv = fv.unwrap_or(0.0);
    let typ = normalize_type(typ);

    if nper == 0.0 {
        return Err(CellError::Div0);
    }
    if rate == 0.0 {
        return Ok(-(pv + fv) / nper);
    }

    let (g, g_minus_1) = pow1p(rate, nper).ok_or(CellError::Num)?;
    let pmt_factor = (1.0 + rate * typ) * g_minus_1 / rate;
    if pmt_factor == 0.0 {
        return Err(CellError::Div0);
    }

    Ok(-(pv * g + fv) / pmt_factor)
}

/// Interest portion of the payment for period `per` (1-based).
pub fn ipmt(
    rate: f64,
    per: f64,
    nper: f64,
    pv: f64,
    fv_opt: Option<f64>,
    typ: Option<f64>,
) -> Result<f64, CellError> {
    let typ = normalize_type(typ);

    if per < 1.0 || per > nper {
        return Err(CellError::Num);
    }
    if rate == 0.0 {
        return Ok(0.0);
    }

    let payment = pmt(rate, nper, pv, fv_opt, Some(typ))?;

    if typ == 1.0 {
        // Payment at period start: nothing has accrued before the first payment
        if per == 1.0 {
            return Ok(0.0);
        }
        let balance = fv(rate, per - 1.0, payment, Some(pv), Some(1.0))?;
        Ok(balance * rate / (1.0 + rate))
    } else {
        let balance = fv(rate, per - 1.0, payment, Some(pv), Some(0.0))?;
        Ok(balance * rate)
    }
}

/// Principal portion of the payment for period `per` (1-based).
pub fn ppmt(
    rate: f64,
    per: f64,
    nper: f64,
    pv: f64,
    fv_opt: Option<f64>,
    typ: Option<f64>,
) -> Result<f64, CellError> {
    let payment = pmt(rate, nper, pv, fv_opt, typ)?;
    let interest = ipmt(rate, per, nper, pv, fv_opt, typ)?;
    Ok(payment - interest)
}

/// Net present value of values received at the end of periods 1, 2, ...
pub fn npv(rate: f64, values: &[f64]) -> Result<f64, CellError> {
    if rate == -1.0 {
        return Err(CellError::Div0);
    }
    let base = 1.0 + rate;
    let mut discount = 1.0;
    let mut total = 0.0;
    for value in values {
        discount *= base;
        total += value / discount;
    }
    Ok(total)
}

/// PMT(rate, nper, pv, [fv], [type])
pub fn fn_pmt(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    number_result((|| -> Result<f64, CellError> {
        pmt(
            number_arg(args, 0)?,
            number_arg(args, 1)?,
            number_arg(args, 2)?,
            optional_number_arg(args, 3)?,
            optional_number_arg(args, 4)?,
        )
    })())
}

/// IPMT(rate, per, nper, pv, [fv], [type])
pub fn fn_ipmt(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    number_result((|| -> Result<f64, CellError> {
        ipmt(
            number_arg(args, 0)?,
            number_arg(args, 1)?,
            number_arg(args, 2)?,
            number_arg(args, 3)?,
            optional_number_arg(args, 4)?,
            optional_number_arg(args, 5)?,
        )
    })())
}

/// PPMT(rate, per, nper, pv, [fv], [type])
pub fn fn_ppmt(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    number_result((|| -> Result<f64, CellError> {
        ppmt(
            number_arg(args, 0)?,
            number_arg(args, 1)?,
            number_arg(args, 2)?,
            number_arg(args, 3)?,
            optional_number_arg(args, 4)?,
            optional_number_arg(args, 5)?,
        )
    })())
}

/// PV(rate, nper, pmt, [fv], [type])
pub fn fn_pv(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    number_result((|| -> Result<f64, CellError> {
        pv(
            number_arg(args, 0)?,
            number_arg(args, 1)?,
            number_arg(args, 2)?,
            optional_number_arg(args, 3)?,
            optional_number_arg(args, 4)?,
        )
    })())
}

/// FV(rate, nper, pmt, [pv], [type])
pub fn fn_fv(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    number_result((|| -> Result<f64, CellError> {
        fv(
            number_arg(args, 0)?,
            number_arg(args, 1)?,
            number_arg(args, 2)?,
            optional_number_arg(args, 3)?,
            optional_number_arg(args, 4)?,
        )
    })())
}

/// NPV(rate, value1, [value2], ...)
pub fn fn_npv(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    number_result((|| -> Result<f64, CellError> {
        let rate = number_arg(args, 0)?;
        let values = collect_numbers(&args[1..])?;
        npv(rate, &values)
    })())
}
