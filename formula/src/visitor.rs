use z3_sys::*;

use crate::error::FormulaError;
use crate::manager::FormulaManager;
use crate::raw;
use crate::types::{Formula, FormulaType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    Forall,
    Exists,
}

/// One step of a traversal over the boolean structure of a formula.
///
/// Every method falls back to `visit_default`, so an implementation only
/// overrides the connectives it cares about. Children are handed over, not
/// visited: recursion is up to the implementation.
pub trait BooleanFormulaVisitor<'ctx, R> {
    fn visit_default(&mut self, formula: &Formula<'ctx>) -> R;

    fn visit_constant(&mut self, formula: &Formula<'ctx>, _value: bool) -> R {
        self.visit_default(formula)
    }

    /// Anything boolean that is not a connective: variables, predicates over
    /// other theories, UF applications.
    fn visit_atom(&mut self, formula: &Formula<'ctx>) -> R {
        self.visit_default(formula)
    }

    fn visit_not(&mut self, formula: &Formula<'ctx>, _operand: &Formula<'ctx>) -> R {
        self.visit_default(formula)
    }

    fn visit_and(&mut self, formula: &Formula<'ctx>, _operands: &[Formula<'ctx>]) -> R {
        self.visit_default(formula)
    }

    fn visit_or(&mut self, formula: &Formula<'ctx>, _operands: &[Formula<'ctx>]) -> R {
        self.visit_default(formula)
    }

    fn visit_xor(&mut self, formula: &Formula<'ctx>, _a: &Formula<'ctx>, _b: &Formula<'ctx>) -> R {
        self.visit_default(formula)
    }

    fn visit_equivalence(&mut self, formula: &Formula<'ctx>, _a: &Formula<'ctx>, _b: &Formula<'ctx>) -> R {
        self.visit_default(formula)
    }

    fn visit_implication(&mut self, formula: &Formula<'ctx>, _premise: &Formula<'ctx>, _conclusion: &Formula<'ctx>) -> R {
        self.visit_default(formula)
    }

    fn visit_ite(
        &mut self,
        formula: &Formula<'ctx>,
        _condition: &Formula<'ctx>,
        _then: &Formula<'ctx>,
        _otherwise: &Formula<'ctx>,
    ) -> R {
        self.visit_default(formula)
    }

    /// `body` refers to the bound variables by index, innermost first.
    fn visit_quantifier(
        &mut self,
        formula: &Formula<'ctx>,
        _quantifier: Quantifier,
        _bound: &[(String, FormulaType)],
        _body: &Formula<'ctx>,
    ) -> R {
        self.visit_default(formula)
    }
}

impl<'ctx> FormulaManager<'ctx> {
    /// Dispatches `formula` on its top-level connective.
    pub fn visit_boolean<R, V>(&self, formula: &Formula<'ctx>, visitor: &mut V) -> Result<R, FormulaError>
    where
        V: BooleanFormulaVisitor<'ctx, R> + ?Sized,
    {
        if formula.formula_type() != &FormulaType::Boolean {
            return Err(FormulaError::mismatch("Boolean", formula.formula_type()));
        }
        let ctx = raw::raw_context(self.context());
        let ast = formula.native();

        unsafe {
            if Z3_get_ast_kind(ctx, ast) == AstKind::Quantifier {
                let quantifier = if Z3_is_quantifier_forall(ctx, ast) {
                    Quantifier::Forall
                } else {
                    Quantifier::Exists
                };
                let mut bound = Vec::new();
                for idx in 0..Z3_get_quantifier_num_bound(ctx, ast) {
                    let name = raw::symbol_to_string(ctx, Z3_get_quantifier_bound_name(ctx, ast, idx));
                    let ty = FormulaType::from_native(ctx, Z3_get_quantifier_bound_sort(ctx, ast, idx))?;
                    bound.push((name, ty));
                }
                let body = Formula::wrap(self.context(), Z3_get_quantifier_body(ctx, ast))?;
                return Ok(visitor.visit_quantifier(formula, quantifier, &bound, &body));
            }

            let kind = match raw::app_decl_kind(ctx, ast) {
                Some(kind) => kind,
                None => return Ok(visitor.visit_atom(formula)),
            };
            let args = self.arguments(ast)?;
            let visited = match (kind, args.as_slice()) {
                (DeclKind::TRUE, []) => visitor.visit_constant(formula, true),
                (DeclKind::FALSE, []) => visitor.visit_constant(formula, false),
                (DeclKind::NOT, [operand]) => visitor.visit_not(formula, operand),
                (DeclKind::AND, operands) => visitor.visit_and(formula, operands),
                (DeclKind::OR, operands) => visitor.visit_or(formula, operands),
                (DeclKind::XOR, [a, b]) => visitor.visit_xor(formula, a, b),
                (DeclKind::IMPLIES, [a, b]) => visitor.visit_implication(formula, a, b),
                (DeclKind::EQ, [a, b]) if a.formula_type() == &FormulaType::Boolean => {
                    visitor.visit_equivalence(formula, a, b)
                }
                (DeclKind::ITE, [c, t, e]) => visitor.visit_ite(formula, c, t, e),
                _ => visitor.visit_atom(formula),
            };
            Ok(visited)
        }
    }

    unsafe fn arguments(&self, ast: Z3_ast) -> Result<Vec<Formula<'ctx>>, FormulaError> {
        let ctx = raw::raw_context(self.context());
        let app = Z3_to_app(ctx, ast);
        (0..Z3_get_app_num_args(ctx, app))
            .map(|idx| Formula::wrap(self.context(), Z3_get_app_arg(ctx, app, idx)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use z3::{Config, Context};

    /// Counts atoms, descending through every connective.
    struct AtomCounter<'a, 'ctx> {
        fmgr: &'a FormulaManager<'ctx>,
    }

    impl<'a, 'ctx> AtomCounter<'a, 'ctx> {
        fn all(&mut self, operands: &[Formula<'ctx>]) -> usize {
            let fmgr = self.fmgr;
            operands
                .iter()
                .map(|op| fmgr.visit_boolean(op, self).unwrap())
                .sum()
        }
    }

    impl<'a, 'ctx> BooleanFormulaVisitor<'ctx, usize> for AtomCounter<'a, 'ctx> {
        fn visit_default(&mut self, _formula: &Formula<'ctx>) -> usize {
            0
        }

        fn visit_atom(&mut self, _formula: &Formula<'ctx>) -> usize {
            1
        }

        fn visit_not(&mut self, _formula: &Formula<'ctx>, operand: &Formula<'ctx>) -> usize {
            self.all(std::slice::from_ref(operand))
        }

        fn visit_and(&mut self, _formula: &Formula<'ctx>, operands: &[Formula<'ctx>]) -> usize {
            self.all(operands)
        }

        fn visit_or(&mut self, _formula: &Formula<'ctx>, operands: &[Formula<'ctx>]) -> usize {
            self.all(operands)
        }

        fn visit_implication(&mut self, _formula: &Formula<'ctx>, a: &Formula<'ctx>, b: &Formula<'ctx>) -> usize {
            self.all(&[a.clone(), b.clone()])
        }
    }

    #[test]
    fn counts_atoms_through_connectives() {
        let ctx = Context::new(&Config::new());
        let fmgr = FormulaManager::new(&ctx);
        let p = fmgr.make_variable("p", FormulaType::Boolean).unwrap();
        let q = fmgr.make_variable("q", FormulaType::Boolean).unwrap();
        let x = fmgr.make_variable("x", FormulaType::Integer).unwrap();
        let positive = fmgr.greater_than(&x, &fmgr.make_int(0)).unwrap();

        let f = fmgr
            .and(&[
                p.clone(),
                fmgr.not(&q).unwrap(),
                fmgr.implies(&positive, &p).unwrap(),
            ])
            .unwrap();

        let mut counter = AtomCounter { fmgr: &fmgr };
        assert_eq!(fmgr.visit_boolean(&f, &mut counter).unwrap(), 4);
        assert_eq!(fmgr.visit_boolean(&fmgr.make_boolean(true), &mut counter).unwrap(), 0);
    }

    struct Shape;

    impl<'ctx> BooleanFormulaVisitor<'ctx, &'static str> for Shape {
        fn visit_default(&mut self, _formula: &Formula<'ctx>) -> &'static str {
            "other"
        }

        fn visit_equivalence(&mut self, _f: &Formula<'ctx>, _a: &Formula<'ctx>, _b: &Formula<'ctx>) -> &'static str {
            "equivalence"
        }

        fn visit_quantifier(
            &mut self,
            _formula: &Formula<'ctx>,
            quantifier: Quantifier,
            bound: &[(String, FormulaType)],
            _body: &Formula<'ctx>,
        ) -> &'static str {
            assert_eq!(bound, &[("x".to_owned(), FormulaType::Integer)]);
            match quantifier {
                Quantifier::Forall => "forall",
                Quantifier::Exists => "exists",
            }
        }
    }

    #[test]
    fn dispatches_quantifiers_and_equivalences() {
        let ctx = Context::new(&Config::new());
        let fmgr = FormulaManager::new(&ctx);
        let p = fmgr.make_variable("p", FormulaType::Boolean).unwrap();
        let q = fmgr.make_variable("q", FormulaType::Boolean).unwrap();
        let x = fmgr.make_variable("x", FormulaType::Integer).unwrap();
        let body = fmgr.greater_or_equals(&x, &x).unwrap();

        let forall = fmgr.forall(&[x.clone()], &body).unwrap();
        assert_eq!(fmgr.visit_boolean(&forall, &mut Shape).unwrap(), "forall");
        let exists = fmgr.exists(&[x.clone()], &body).unwrap();
        assert_eq!(fmgr.visit_boolean(&exists, &mut Shape).unwrap(), "exists");

        let iff = fmgr.equivalence(&p, &q).unwrap();
        assert_eq!(fmgr.visit_boolean(&iff, &mut Shape).unwrap(), "equivalence");

        assert!(fmgr.visit_boolean(&x, &mut Shape).is_err());
    }
}
