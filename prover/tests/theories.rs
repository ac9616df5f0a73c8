mod common;

use common::{session, solver_context, z3_context};
use formula::{bool_var, bv_var, conj, int_var, FormulaType};
use num_bigint::{BigInt, BigUint};
use num_rational::BigRational;
use prover::{Capability, Value};

fn rational(numer: i64, denom: i64) -> BigRational {
    BigRational::new(BigInt::from(numer), BigInt::from(denom))
}

#[test]
fn integers_beyond_machine_width() {
    let ctx = z3_context();
    let context = solver_context(&ctx);
    let fmgr = context.formula_manager();
    let mut prover = session(&context);

    let x = int_var!(fmgr, "x");
    let big = BigInt::parse_bytes(b"-123456789012345678901234567890", 10).unwrap();
    let doubled = fmgr.add(&x, &x).unwrap();
    prover
        .add_constraint(&fmgr.equal(&doubled, &fmgr.make_integer(&(&big * 2)).unwrap()).unwrap())
        .unwrap();
    assert!(prover.is_satisfiable().unwrap());

    let model = prover.get_model().unwrap();
    assert_eq!(model.evaluate_int(&x).unwrap(), Some(big.clone()));
    assert_eq!(model.assignments_named("x")[0].value(), &Value::Int(big));
}

#[test]
fn modular_congruence() {
    let ctx = z3_context();
    let context = solver_context(&ctx);
    let fmgr = context.formula_manager();
    let mut prover = session(&context);

    let x = int_var!(fmgr, "x");
    let seven = BigInt::from(7);
    let congruent = fmgr.modular_congruence(&x, &fmgr.make_int(3), &seven).unwrap();
    let lower = fmgr.greater_than(&x, &fmgr.make_int(20)).unwrap();
    let upper = fmgr.less_than(&x, &fmgr.make_int(30)).unwrap();
    prover.add_constraint(&conj!(fmgr; congruent, lower, upper).unwrap()).unwrap();
    assert!(prover.is_satisfiable().unwrap());
    assert_eq!(prover.get_model().unwrap().evaluate_int(&x).unwrap(), Some(BigInt::from(24)));

    // no modulus, no constraint
    let free = fmgr.modular_congruence(&x, &fmgr.make_int(3), &BigInt::from(0)).unwrap();
    assert_eq!(free, fmgr.make_boolean(true));
}

#[test]
fn integer_division_rounds_down() {
    let ctx = z3_context();
    let context = solver_context(&ctx);
    let fmgr = context.formula_manager();
    let mut prover = session(&context);

    let a = int_var!(fmgr, "a");
    let b = int_var!(fmgr, "b");
    let quotient = fmgr.divide(&a, &b).unwrap();
    let remainder = fmgr.modulo(&a, &b).unwrap();
    // (a, b, a div b, a mod b)
    for (x, y, q, r) in [(10, 3, 3, 1), (-10, 3, -4, 2), (10, -3, -3, 1), (-10, -3, 4, 2)] {
        prover.push_formula(&fmgr.equal(&a, &fmgr.make_int(x)).unwrap()).unwrap();
        prover.add_constraint(&fmgr.equal(&b, &fmgr.make_int(y)).unwrap()).unwrap();
        assert!(prover.is_satisfiable().unwrap());

        let model = prover.get_model().unwrap();
        assert_eq!(model.evaluate_int(&quotient).unwrap(), Some(BigInt::from(q)), "{} div {}", x, y);
        assert_eq!(model.evaluate_int(&remainder).unwrap(), Some(BigInt::from(r)), "{} mod {}", x, y);
        prover.pop().unwrap();
    }

    // constants fold the same way
    let folded = fmgr.divide(&fmgr.make_int(-10), &fmgr.make_int(3)).unwrap();
    prover.add_constraint(&fmgr.equal(&a, &folded).unwrap()).unwrap();
    assert!(prover.is_satisfiable().unwrap());
    assert_eq!(prover.get_model().unwrap().evaluate_int(&a).unwrap(), Some(BigInt::from(-4)));
}

#[test]
fn modulo_needs_integers() {
    let ctx = z3_context();
    let context = solver_context(&ctx);
    let fmgr = context.formula_manager();

    let r = fmgr.make_rational_variable("r");
    assert!(fmgr.modulo(&r, &fmgr.make_int(3)).is_err());
}

#[test]
fn rational_division_is_exact() {
    let ctx = z3_context();
    let context = solver_context(&ctx);
    let fmgr = context.formula_manager();
    let mut prover = session(&context);

    let r = fmgr.make_rational_variable("r");
    let seven = fmgr.make_rational(&rational(7, 1)).unwrap();
    let halved = fmgr.divide(&seven, &fmgr.make_rational(&rational(2, 1)).unwrap()).unwrap();
    prover.add_constraint(&fmgr.equal(&r, &halved).unwrap()).unwrap();
    assert!(prover.is_satisfiable().unwrap());
    assert_eq!(prover.get_model().unwrap().evaluate_rational(&r).unwrap(), Some(rational(7, 2)));
}

#[test]
fn nonlinear_multiplication() {
    let ctx = z3_context();
    let context = solver_context(&ctx);
    assert!(context.supports(Capability::NonLinearArithmetic));
    let fmgr = context.formula_manager();
    let mut prover = session(&context);

    let x = int_var!(fmgr, "x");
    let y = int_var!(fmgr, "y");
    let product = fmgr.multiply(&x, &y).unwrap();
    let one = fmgr.make_int(1);
    prover.add_constraint(&fmgr.equal(&product, &fmgr.make_int(6)).unwrap()).unwrap();
    prover.add_constraint(&fmgr.greater_than(&x, &one).unwrap()).unwrap();
    prover.add_constraint(&fmgr.less_than(&x, &y).unwrap()).unwrap();
    assert!(prover.is_satisfiable().unwrap());

    let model = prover.get_model().unwrap();
    assert_eq!(model.evaluate_int(&x).unwrap(), Some(BigInt::from(2)));
    assert_eq!(model.evaluate_int(&y).unwrap(), Some(BigInt::from(3)));
    assert_eq!(model.evaluate_int(&product).unwrap(), Some(BigInt::from(6)));

    // 3 * y = 6 forces y = 2, below x
    prover.push_formula(&fmgr.equal(&x, &fmgr.make_int(3)).unwrap()).unwrap();
    assert!(prover.is_unsat().unwrap());
}

#[test]
fn nonlinear_division() {
    let ctx = z3_context();
    let context = solver_context(&ctx);
    assert!(context.supports(Capability::NonLinearArithmetic));
    let fmgr = context.formula_manager();
    let mut prover = session(&context);

    let x = int_var!(fmgr, "x");
    let y = int_var!(fmgr, "y");
    let quotient = fmgr.divide(&x, &y).unwrap();
    prover.add_constraint(&fmgr.equal(&x, &fmgr.make_int(7)).unwrap()).unwrap();
    prover.add_constraint(&fmgr.greater_than(&y, &fmgr.make_int(0)).unwrap()).unwrap();
    prover.add_constraint(&fmgr.equal(&quotient, &fmgr.make_int(2)).unwrap()).unwrap();
    assert!(prover.is_satisfiable().unwrap());

    let model = prover.get_model().unwrap();
    assert_eq!(model.evaluate_int(&y).unwrap(), Some(BigInt::from(3)));
    assert_eq!(model.evaluate_int(&quotient).unwrap(), Some(BigInt::from(2)));
}

#[test]
fn uninterpreted_functions_over_booleans() {
    let ctx = z3_context();
    let context = solver_context(&ctx);
    let fmgr = context.formula_manager();
    let mut prover = session(&context);

    let h = fmgr.declare_uf("h", FormulaType::Boolean, vec![FormulaType::Boolean]).unwrap();
    let yes = fmgr.make_boolean(true);
    let no = fmgr.make_boolean(false);
    let h_yes = fmgr.call_uf(&h, &[yes.clone()]).unwrap();
    let h_no = fmgr.call_uf(&h, &[no]).unwrap();
    prover.add_constraint(&h_yes).unwrap();
    prover.add_constraint(&fmgr.not(&h_no).unwrap()).unwrap();
    assert!(prover.is_satisfiable().unwrap());

    let model = prover.get_model().unwrap();
    assert_eq!(model.evaluate_bool(&h_yes).unwrap(), Some(true));
    assert_eq!(model.evaluate_bool(&h_no).unwrap(), Some(false));
    assert!(model.evaluate_int(&h_yes).is_err());

    // h(p) differs from both h(true) and h(false)
    let p = bool_var!(fmgr, "p");
    let h_p = fmgr.call_uf(&h, &[p]).unwrap();
    prover.add_constraint(&fmgr.not(&fmgr.equal(&h_p, &h_yes).unwrap()).unwrap()).unwrap();
    prover.add_constraint(&fmgr.not(&fmgr.equal(&h_p, &h_no).unwrap()).unwrap()).unwrap();
    assert!(prover.is_unsat().unwrap());
}

#[test]
fn rationals() {
    let ctx = z3_context();
    let context = solver_context(&ctx);
    let fmgr = context.formula_manager();
    let mut prover = session(&context);

    let r = fmgr.make_variable("r", FormulaType::Rational).unwrap();
    let three = fmgr.make_rational(&rational(3, 1)).unwrap();
    let product = fmgr.multiply(&r, &three).unwrap();
    prover
        .add_constraint(&fmgr.equal(&product, &fmgr.make_int(-1)).unwrap())
        .unwrap();
    assert!(prover.is_satisfiable().unwrap());

    let model = prover.get_model().unwrap();
    assert_eq!(model.evaluate_rational(&r).unwrap(), Some(rational(-1, 3)));
    assert_eq!(model.assignments_named("r")[0].to_string(), "r = -1/3");
}

#[test]
fn integer_valued_rationals_read_as_rationals() {
    let ctx = z3_context();
    let context = solver_context(&ctx);
    let fmgr = context.formula_manager();
    let mut prover = session(&context);

    let r = fmgr.make_variable("r", FormulaType::Rational).unwrap();
    prover
        .add_constraint(&fmgr.equal(&r, &fmgr.make_rational(&rational(4, 2)).unwrap()).unwrap())
        .unwrap();
    assert!(prover.is_satisfiable().unwrap());
    let model = prover.get_model().unwrap();
    assert_eq!(model.evaluate_rational(&r).unwrap(), Some(rational(2, 1)));
}

#[test]
fn bitvector_shift() {
    let ctx = z3_context();
    let context = solver_context(&ctx);
    let fmgr = context.formula_manager();
    let mut prover = session(&context);

    let x = bv_var!(fmgr, "x", 8).unwrap();
    let one = fmgr.make_bitvector(8, &BigInt::from(1)).unwrap();
    let six = fmgr.make_bitvector(8, &BigInt::from(6)).unwrap();
    let shifted = fmgr.bv_shift_left(&x, &one).unwrap();
    prover.add_constraint(&fmgr.equal(&shifted, &six).unwrap()).unwrap();
    let small = fmgr.bv_less_than(&x, &fmgr.make_bitvector(8, &BigInt::from(100)).unwrap(), false).unwrap();
    prover.add_constraint(&small).unwrap();
    assert!(prover.is_satisfiable().unwrap());

    let model = prover.get_model().unwrap();
    assert_eq!(model.evaluate_bitvector(&x).unwrap(), Some(BigUint::from(3u32)));
    assert_eq!(
        model.evaluate(&x).unwrap(),
        Some(Value::Bitvector { value: BigUint::from(3u32), width: 8 })
    );
    assert_eq!(model.assignments_named("x")[0].to_string(), "x = #b00000011");
}

#[test]
fn negative_bitvector_literals_wrap() {
    let ctx = z3_context();
    let context = solver_context(&ctx);
    let fmgr = context.formula_manager();
    let mut prover = session(&context);

    let x = bv_var!(fmgr, "x", 8).unwrap();
    let minus_one = fmgr.make_bitvector(8, &BigInt::from(-1)).unwrap();
    prover.add_constraint(&fmgr.equal(&x, &minus_one).unwrap()).unwrap();
    let negative = fmgr.bv_less_than(&x, &fmgr.make_bitvector(8, &BigInt::from(0)).unwrap(), true).unwrap();
    prover.add_constraint(&negative).unwrap();
    assert!(prover.is_satisfiable().unwrap());
    assert_eq!(
        prover.get_model().unwrap().evaluate_bitvector(&x).unwrap(),
        Some(BigUint::from(255u32))
    );
}

#[test]
fn array_cells() {
    let ctx = z3_context();
    let context = solver_context(&ctx);
    let fmgr = context.formula_manager();
    let mut prover = session(&context);

    let arr = fmgr.make_variable("arr", FormulaType::array(FormulaType::Integer, FormulaType::Integer)).unwrap();
    let one = fmgr.make_int(1);
    let two = fmgr.make_int(2);
    let at_one = fmgr.select(&arr, &one).unwrap();
    let at_two = fmgr.select(&arr, &two).unwrap();
    prover.add_constraint(&fmgr.equal(&at_one, &fmgr.make_int(11)).unwrap()).unwrap();
    prover.add_constraint(&fmgr.equal(&at_two, &fmgr.make_int(20)).unwrap()).unwrap();
    assert!(prover.is_satisfiable().unwrap());

    let model = prover.get_model().unwrap();
    assert_eq!(model.evaluate_int(&at_one).unwrap(), Some(BigInt::from(11)));
    assert_eq!(model.evaluate_int(&at_two).unwrap(), Some(BigInt::from(20)));
    let cells = model.assignments_named("arr");
    for cell in &cells {
        assert_eq!(cell.arguments().len(), 1);
        assert_eq!(cell.key().formula_type(), &FormulaType::Integer);
    }
    let at = |index: i64| {
        cells
            .iter()
            .find(|cell| cell.arguments() == [Value::from(index)])
            .map(|cell| cell.value().clone())
    };
    assert_eq!(at(1), Some(Value::from(11i64)));
    assert_eq!(at(2), Some(Value::from(20i64)));
}

#[test]
fn nested_array_cells() {
    let ctx = z3_context();
    let context = solver_context(&ctx);
    let fmgr = context.formula_manager();
    let mut prover = session(&context);

    let inner = FormulaType::array(FormulaType::Integer, FormulaType::Integer);
    let m = fmgr.make_variable("m", FormulaType::array(FormulaType::Integer, inner)).unwrap();
    let cell = |i: i64, j: i64| {
        let row = fmgr.select(&m, &fmgr.make_int(i)).unwrap();
        fmgr.select(&row, &fmgr.make_int(j)).unwrap()
    };
    prover.add_constraint(&fmgr.equal(&cell(3, 4), &fmgr.make_int(40)).unwrap()).unwrap();
    prover.add_constraint(&fmgr.equal(&cell(5, 4), &fmgr.make_int(41)).unwrap()).unwrap();
    assert!(prover.is_satisfiable().unwrap());

    let model = prover.get_model().unwrap();
    assert_eq!(model.evaluate_int(&cell(3, 4)).unwrap(), Some(BigInt::from(40)));
    assert_eq!(model.evaluate_int(&cell(5, 4)).unwrap(), Some(BigInt::from(41)));
    assert!(model.faults().is_empty());

    let records = model.assignments_named("m");
    assert_eq!(records.len(), 2);
    let at = |i: i64, j: i64| {
        records
            .iter()
            .find(|record| record.arguments() == [Value::from(i), Value::from(j)])
            .map(|record| record.value().clone())
    };
    assert_eq!(at(3, 4), Some(Value::from(40i64)));
    assert_eq!(at(5, 4), Some(Value::from(41i64)));
}

#[test]
fn array_records_reassert_consistently() {
    let ctx = z3_context();
    let context = solver_context(&ctx);
    let fmgr = context.formula_manager();
    let mut prover = session(&context);

    let arr = fmgr.make_variable("arr", FormulaType::array(FormulaType::Integer, FormulaType::Boolean)).unwrap();
    let stored = fmgr.store(&arr, &fmgr.make_int(7), &fmgr.make_boolean(true)).unwrap();
    let other = fmgr.make_variable("other", FormulaType::array(FormulaType::Integer, FormulaType::Boolean)).unwrap();
    prover.add_constraint(&fmgr.equal(&other, &stored).unwrap()).unwrap();
    let at_eight = fmgr.select(&other, &fmgr.make_int(8)).unwrap();
    prover.add_constraint(&at_eight).unwrap();
    assert!(prover.is_satisfiable().unwrap());

    let equalities = prover
        .model_assignments()
        .unwrap()
        .iter()
        .map(|record| record.as_equality(fmgr).unwrap())
        .collect::<Vec<_>>();
    for equality in &equalities {
        prover.add_constraint(equality).unwrap();
    }
    assert!(prover.is_satisfiable().unwrap());
}
