//! Helpers for code that has to talk to the engine below the `z3` crate.
//!
//! Nothing here takes or drops native references: every handle passed in must
//! be kept alive by its caller for the duration of the call.

use std::ffi::CStr;
use z3::Context;
use z3_sys::*;

/// The native context behind a `z3::Context`.
pub fn raw_context(ctx: &Context) -> Z3_context {
    ctx.get_z3_context()
}

/// Copies an engine-owned C string. The engine reuses the buffer on the next
/// call, so the copy must happen immediately.
pub fn c_string(ptr: Z3_string) -> String {
    if ptr.is_null() {
        return String::new();
    }
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}

/// Integer symbols are rendered the way the engine prints them (`k!<n>`).
pub unsafe fn symbol_to_string(ctx: Z3_context, symbol: Z3_symbol) -> String {
    match Z3_get_symbol_kind(ctx, symbol) {
        SymbolKind::Int => format!("k!{}", Z3_get_symbol_int(ctx, symbol)),
        _ => c_string(Z3_get_symbol_string(ctx, symbol)),
    }
}

pub unsafe fn decl_name(ctx: Z3_context, decl: Z3_func_decl) -> String {
    symbol_to_string(ctx, Z3_get_decl_name(ctx, decl))
}

pub unsafe fn ast_to_string(ctx: Z3_context, ast: Z3_ast) -> String {
    c_string(Z3_ast_to_string(ctx, ast))
}

pub unsafe fn sort_to_string(ctx: Z3_context, sort: Z3_sort) -> String {
    c_string(Z3_sort_to_string(ctx, sort))
}

pub unsafe fn decl_to_string(ctx: Z3_context, decl: Z3_func_decl) -> String {
    c_string(Z3_func_decl_to_string(ctx, decl))
}

/// The declaration kind of an application, `None` for variables, quantifiers
/// and other non-application terms.
pub unsafe fn app_decl_kind(ctx: Z3_context, ast: Z3_ast) -> Option<DeclKind> {
    if !Z3_is_app(ctx, ast) {
        return None;
    }
    let decl = Z3_get_app_decl(ctx, Z3_to_app(ctx, ast));
    Some(Z3_get_decl_kind(ctx, decl))
}
