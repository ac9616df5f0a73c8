//! Decoding of engine literals into [`Value`]s.

use std::str::FromStr;

use formula::raw;
use num_bigint::{BigInt, BigUint};
use num_rational::BigRational;
use num_traits::Zero;
use z3::Context;
use z3_sys::*;

use crate::error::{Result, SolverError};
use crate::native::Native;
use crate::value::Value;

/// True iff `ast` is a fully evaluated literal: a numeral, `true`/`false`, or
/// an element of an uninterpreted sort as the engine names it in models.
///
/// # Safety
///
/// `ast` must be a live term of `ctx`.
pub unsafe fn is_constant(ctx: Z3_context, ast: Z3_ast) -> bool {
    if Z3_is_numeral_ast(ctx, ast) || Z3_is_algebraic_number(ctx, ast) {
        return true;
    }
    let sort = Z3_get_sort(ctx, ast);
    match Z3_get_sort_kind(ctx, sort) {
        SortKind::Bool => Z3_get_bool_value(ctx, ast) != Z3_L_UNDEF,
        SortKind::Uninterpreted => {
            Z3_is_app(ctx, ast)
                && Z3_get_app_num_args(ctx, Z3_to_app(ctx, ast)) == 0
                && raw::app_decl_kind(ctx, ast) == Some(DeclKind::UNINTERPRETED)
        }
        _ => false,
    }
}

/// Decodes a literal by the kind of its sort. Anything that is not a literal
/// of a supported sort is an engine-state error; no value is made up.
///
/// # Safety
///
/// `ast` must be a live term of `ctx`.
pub unsafe fn convert_value<'ctx>(ctx: &'ctx Context, ast: Z3_ast) -> Result<Value> {
    let raw_ctx = raw::raw_context(ctx);
    if !is_constant(raw_ctx, ast) {
        return Err(SolverError::unexpected(format!(
            "{} is not a literal",
            raw::ast_to_string(raw_ctx, ast)
        )));
    }

    let sort = Z3_get_sort(raw_ctx, ast);
    match Z3_get_sort_kind(raw_ctx, sort) {
        SortKind::Bool => Ok(Value::Bool(Z3_get_bool_value(raw_ctx, ast) == Z3_L_TRUE)),
        SortKind::Int => Ok(Value::Int(numeral::<BigInt>(raw_ctx, ast)?)),
        SortKind::Real if Z3_is_algebraic_number(raw_ctx, ast) => {
            Ok(Value::Opaque(raw::ast_to_string(raw_ctx, ast)))
        }
        SortKind::Real => {
            let numerator = Native::acquire(ctx, Z3_get_numerator(raw_ctx, ast))?;
            let denominator = Native::acquire(ctx, Z3_get_denominator(raw_ctx, ast))?;
            let numer = numeral::<BigInt>(raw_ctx, numerator.get())?;
            let denom = numeral::<BigInt>(raw_ctx, denominator.get())?;
            if denom.is_zero() {
                return Err(SolverError::unexpected(format!(
                    "rational {} has a zero denominator",
                    raw::ast_to_string(raw_ctx, ast)
                )));
            }
            Ok(Value::Rational(BigRational::new(numer, denom)))
        }
        SortKind::BV => Ok(Value::Bitvector {
            value: numeral::<BigUint>(raw_ctx, ast)?,
            width: Z3_get_bv_sort_size(raw_ctx, sort),
        }),
        SortKind::Uninterpreted => Ok(Value::Opaque(raw::ast_to_string(raw_ctx, ast))),
        _ => Err(SolverError::unexpected(format!(
            "literal {} has unsupported sort {}",
            raw::ast_to_string(raw_ctx, ast),
            raw::sort_to_string(raw_ctx, sort)
        ))),
    }
}

unsafe fn numeral<N: FromStr>(ctx: Z3_context, ast: Z3_ast) -> Result<N> {
    let text = raw::c_string(Z3_get_numeral_string(ctx, ast));
    crate::native::check_error(ctx)?;
    text.parse::<N>()
        .map_err(|_| SolverError::unexpected(format!("cannot parse numeral {:?}", text)))
}
