//! Scoped ownership of reference-counted engine handles.
//!
//! A [`Native`] takes one reference when it is created and gives it back when
//! dropped. Handles acquired one after another inside a function are released
//! in the opposite order, and a `?` in between still releases everything
//! acquired so far.

use std::marker::PhantomData;

use formula::raw::{self, c_string};
use z3::Context;
use z3_sys::*;

use crate::error::{Result, SolverError};

/// A raw handle kind with its own reference counter.
pub trait RefCounted: Copy {
    /// Shown in diagnostics when the engine returns a null handle.
    const KIND: &'static str;

    fn is_null(self) -> bool;

    unsafe fn inc_ref(ctx: Z3_context, handle: Self);

    unsafe fn dec_ref(ctx: Z3_context, handle: Self);
}

macro_rules! ref_counted {
    ($handle:ty, $kind:expr, $inc:path, $dec:path) => {
        impl RefCounted for $handle {
            const KIND: &'static str = $kind;

            fn is_null(self) -> bool {
                self.is_null()
            }

            unsafe fn inc_ref(ctx: Z3_context, handle: Self) {
                $inc(ctx, handle)
            }

            unsafe fn dec_ref(ctx: Z3_context, handle: Self) {
                $dec(ctx, handle)
            }
        }
    };
}

ref_counted!(Z3_ast, "term", Z3_inc_ref, Z3_dec_ref);
ref_counted!(Z3_model, "model", Z3_model_inc_ref, Z3_model_dec_ref);
ref_counted!(Z3_solver, "solver", Z3_solver_inc_ref, Z3_solver_dec_ref);
ref_counted!(Z3_func_interp, "function interpretation", Z3_func_interp_inc_ref, Z3_func_interp_dec_ref);
ref_counted!(Z3_func_entry, "function entry", Z3_func_entry_inc_ref, Z3_func_entry_dec_ref);
ref_counted!(Z3_ast_vector, "term vector", Z3_ast_vector_inc_ref, Z3_ast_vector_dec_ref);
ref_counted!(Z3_params, "parameter set", Z3_params_inc_ref, Z3_params_dec_ref);

// Declarations are counted through their term view.
impl RefCounted for Z3_func_decl {
    const KIND: &'static str = "declaration";

    fn is_null(self) -> bool {
        self.is_null()
    }

    unsafe fn inc_ref(ctx: Z3_context, handle: Self) {
        Z3_inc_ref(ctx, Z3_func_decl_to_ast(ctx, handle))
    }

    unsafe fn dec_ref(ctx: Z3_context, handle: Self) {
        Z3_dec_ref(ctx, Z3_func_decl_to_ast(ctx, handle))
    }
}

pub struct Native<'ctx, H: RefCounted> {
    ctx: Z3_context,
    handle: H,
    _context: PhantomData<&'ctx Context>,
}

impl<'ctx, H: RefCounted> Native<'ctx, H> {
    /// Takes a reference on a handle the engine just returned. A pending
    /// engine error or a null handle is an error; nothing is acquired then.
    ///
    /// # Safety
    ///
    /// `handle` must come from `ctx` and still be valid.
    pub unsafe fn acquire(ctx: &'ctx Context, handle: H) -> Result<Self> {
        Self::acquire_optional(ctx, handle)?
            .ok_or_else(|| SolverError::unexpected(format!("engine returned a null {}", H::KIND)))
    }

    /// Like [`Native::acquire`], but a null handle is an answer, not an error.
    ///
    /// # Safety
    ///
    /// `handle` must be null or come from `ctx` and still be valid.
    pub unsafe fn acquire_optional(ctx: &'ctx Context, handle: H) -> Result<Option<Self>> {
        let raw_ctx = raw::raw_context(ctx);
        check_error(raw_ctx)?;
        if handle.is_null() {
            return Ok(None);
        }
        H::inc_ref(raw_ctx, handle);
        Ok(Some(Native {
            ctx: raw_ctx,
            handle,
            _context: PhantomData,
        }))
    }

    /// The raw handle. Only valid while `self` is alive.
    pub fn get(&self) -> H {
        self.handle
    }

    pub fn raw_context(&self) -> Z3_context {
        self.ctx
    }
}

impl<'ctx, H: RefCounted> Clone for Native<'ctx, H> {
    fn clone(&self) -> Self {
        unsafe { H::inc_ref(self.ctx, self.handle) };
        Native {
            ctx: self.ctx,
            handle: self.handle,
            _context: PhantomData,
        }
    }
}

impl<'ctx, H: RefCounted> Drop for Native<'ctx, H> {
    fn drop(&mut self) {
        unsafe { H::dec_ref(self.ctx, self.handle) };
    }
}

/// Turns the engine's pending error code, if any, into an error.
pub fn check_error(ctx: Z3_context) -> Result<()> {
    let code = unsafe { Z3_get_error_code(ctx) };
    if code == ErrorCode::OK {
        return Ok(());
    }
    let message = c_string(unsafe { Z3_get_error_msg(ctx, code) });
    Err(SolverError::Engine {
        code: format!("{:?}", code),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use z3::{ast::{Ast, Int}, Config};

    #[test]
    fn acquire_and_release_balance() {
        let ctx = Context::new(&Config::new());
        let raw_ctx = raw::raw_context(&ctx);
        let x = Int::new_const(&ctx, "x");

        let first = unsafe { Native::acquire(&ctx, x.get_z3_ast()) }.unwrap();
        let second = first.clone();
        assert_eq!(first.get(), second.get());
        drop(first);
        drop(second);

        // `x` still holds its own reference
        assert_eq!(unsafe { raw::ast_to_string(raw_ctx, x.get_z3_ast()) }, "x");
    }

    #[test]
    fn null_handles() {
        let ctx = Context::new(&Config::new());
        let none = unsafe { Native::<Z3_ast>::acquire_optional(&ctx, std::ptr::null_mut()) }.unwrap();
        assert!(none.is_none());

        let err = unsafe { Native::<Z3_model>::acquire(&ctx, std::ptr::null_mut()) }
            .err()
            .unwrap();
        assert_eq!(err, SolverError::unexpected("engine returned a null model"));
    }
}
