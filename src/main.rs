use std::time::Instant;

use anyhow::{bail, Context as _};
use flags::{parse_flags, FLAGS};
use formula::{bool_var, conj, disj, int_var, FormulaManager, FormulaType};
use logging::Logger;
use num_bigint::BigInt;
use prover::{Model, ProverOption, ProverSession, SolverContext};

type Scenario = fn(&SolverContext<'_>, &Logger) -> anyhow::Result<()>;

const ALL: &[(&str, Scenario, bool)] = &[
    ("stack", stack, false),
    ("model", model, true),
    ("unsat", unsat, false),
    ("array", array, true),
    ("uf", uf, true),
];

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let (logger, config) = parse_flags();
    let models = config.generate_models;

    let ctx = z3::Context::new(&config.z3_config());
    let context = SolverContext::new(&ctx, config);
    logger.info(&format!("Running on {}", context.version()));

    let now = Instant::now();
    for (name, scenario, needs_models) in ALL {
        if FLAGS.scenario != "all" && FLAGS.scenario != *name {
            continue;
        }
        if *needs_models && !models {
            logger.warning(&format!("Skipping {}: models are off", name));
            continue;
        }
        println!("== {} ==", name);
        scenario(&context, &logger).with_context(|| format!("scenario {} failed", name))?;
        logger.completion(name);
    }
    println!("> finished: {} s", now.elapsed().as_micros() as f64 / 1_000_000.0);
    Ok(())
}

fn session<'ctx>(context: &SolverContext<'ctx>, options: &[ProverOption]) -> anyhow::Result<ProverSession<'ctx>> {
    let mut options = options.to_vec();
    if context.config().generate_models {
        options.push(ProverOption::GenerateModels);
    }
    Ok(context.new_prover_environment(&options)?)
}

fn print_model(model: &Model<'_>) {
    for assignment in model {
        println!("  {}", assignment);
    }
    for fault in model.faults() {
        println!("  (skipped: {})", fault);
    }
}

fn check_answer(what: &str, actual: bool, expected: bool) -> anyhow::Result<()> {
    println!("{}: {}", what, if actual { "sat" } else { "unsat" });
    if actual != expected {
        bail!("{} should be {}", what, if expected { "sat" } else { "unsat" });
    }
    Ok(())
}

/// Pushes a∨b, c∧d and ¬(a∨b), then pops back to a∨b.
fn stack(context: &SolverContext<'_>, logger: &Logger) -> anyhow::Result<()> {
    let fmgr = context.formula_manager();
    let mut prover = session(context, &[])?;
    let a = bool_var!(fmgr, "a");
    let b = bool_var!(fmgr, "b");
    let c = bool_var!(fmgr, "c");
    let d = bool_var!(fmgr, "d");
    let or = disj!(fmgr; a, b)?;

    prover.push_formula(&or)?;
    check_answer("a | b", prover.is_satisfiable()?, true)?;
    prover.push_formula(&conj!(fmgr; c, d)?)?;
    check_answer("a | b, c & d", prover.is_satisfiable()?, true)?;
    prover.push_formula(&fmgr.not(&or)?)?;
    check_answer("a | b, c & d, !(a | b)", prover.is_satisfiable()?, false)?;

    prover.pop()?;
    prover.pop()?;
    logger.info(&format!("depth after two pops: {}", prover.depth()?));
    check_answer("a | b", prover.is_satisfiable()?, true)?;
    prover.pop()?;
    if prover.pop().is_ok() {
        bail!("pop on an empty stack succeeded");
    }
    println!("pop on an empty stack is refused");
    Ok(())
}

/// Constants, a function and a rational, read back as records.
fn model(context: &SolverContext<'_>, _logger: &Logger) -> anyhow::Result<()> {
    let fmgr = context.formula_manager();
    let mut prover = session(context, &[])?;
    let x = int_var!(fmgr, "x");
    let r = fmgr.make_variable("r", FormulaType::Rational)?;
    let f = fmgr.declare_uf("f", FormulaType::Integer, vec![FormulaType::Integer])?;

    let big = BigInt::parse_bytes(b"100000000000000000000", 10).context("literal")?;
    prover.add_constraint(&fmgr.greater_than(&x, &fmgr.make_integer(&big)?)?)?;
    let three_r = fmgr.multiply(&r, &fmgr.make_int(3))?;
    prover.add_constraint(&fmgr.equal(&three_r, &fmgr.make_int(1))?)?;
    let f_x = fmgr.call_uf(&f, &[x.clone()])?;
    prover.add_constraint(&fmgr.equal(&f_x, &fmgr.make_int(-4))?)?;
    check_answer("model", prover.is_satisfiable()?, true)?;

    let model = prover.get_model()?;
    print_model(model);
    println!("x evaluates to {:?}", model.evaluate_int(&x)?);
    reassert(fmgr, &mut prover)
}

/// Re-asserts every record of the current model; the result must stay sat.
fn reassert<'ctx>(fmgr: &FormulaManager<'ctx>, prover: &mut ProverSession<'ctx>) -> anyhow::Result<()> {
    let records = prover.model_assignments()?;
    for record in &records {
        prover.add_constraint(&record.as_equality(fmgr)?)?;
    }
    check_answer("model re-asserted", prover.is_satisfiable()?, true)
}

fn unsat(context: &SolverContext<'_>, _logger: &Logger) -> anyhow::Result<()> {
    let fmgr = context.formula_manager();
    let x = int_var!(fmgr, "x");
    let above = fmgr.greater_than(&x, &fmgr.make_int(5))?;
    let below = fmgr.less_than(&x, &fmgr.make_int(3))?;

    let mut tracked = session(context, &[ProverOption::GenerateUnsatCore])?;
    tracked.add_constraint(&above)?;
    tracked.add_constraint(&bool_var!(fmgr, "p"))?;
    tracked.add_constraint(&below)?;
    check_answer("x > 5, p, x < 3", tracked.is_satisfiable()?, false)?;
    for formula in tracked.unsat_core()? {
        println!("  core: {}", formula);
    }
    tracked.close();

    let mut assuming = session(context, &[ProverOption::GenerateUnsatCoreOverAssumptions])?;
    let q = bool_var!(fmgr, "q");
    let s = bool_var!(fmgr, "s");
    assuming.add_constraint(&above)?;
    assuming.add_constraint(&fmgr.implies(&q, &below)?)?;
    match assuming.unsat_core_over_assumptions(&[q, s])? {
        Some(core) => {
            let names: Vec<String> = core.iter().map(ToString::to_string).collect();
            println!("  core over assumptions: {}", names.join(", "));
        }
        None => bail!("assumptions q, s should be inconsistent"),
    }
    Ok(())
}

fn array(context: &SolverContext<'_>, _logger: &Logger) -> anyhow::Result<()> {
    let fmgr = context.formula_manager();
    let mut prover = session(context, &[])?;
    let row = FormulaType::array(FormulaType::Integer, FormulaType::Integer);
    let m = fmgr.make_variable("m", FormulaType::array(FormulaType::Integer, row))?;

    for (i, j, value) in [(3, 4, 40), (3, 5, 41), (7, 4, 70)] {
        let cell = fmgr.select(&fmgr.select(&m, &fmgr.make_int(i))?, &fmgr.make_int(j))?;
        prover.add_constraint(&fmgr.equal(&cell, &fmgr.make_int(value))?)?;
    }
    check_answer("nested array", prover.is_satisfiable()?, true)?;
    print_model(prover.get_model()?);
    reassert(fmgr, &mut prover)
}

fn uf(context: &SolverContext<'_>, _logger: &Logger) -> anyhow::Result<()> {
    let fmgr = context.formula_manager();
    let mut prover = session(context, &[])?;
    let a = int_var!(fmgr, "a");
    let b = int_var!(fmgr, "b");
    let zero = fmgr.make_int(0);
    let g = fmgr.declare_uf("g", FormulaType::Integer, vec![FormulaType::Integer])?;

    prover.push_formula(&fmgr.equal(&a, &zero)?)?;
    prover.push_formula(&fmgr.equal(&b, &fmgr.make_int(1))?)?;
    prover.push_formula(&fmgr.equal(&fmgr.call_uf(&g, &[a.clone()])?, &fmgr.make_int(10))?)?;
    prover.push_formula(&fmgr.equal(&fmgr.call_uf(&g, &[b.clone()])?, &fmgr.make_int(11))?)?;
    check_answer("g(a) = 10, g(b) = 11", prover.is_satisfiable()?, true)?;
    print_model(prover.get_model()?);

    prover.pop()?;
    prover.pop()?;
    // declarations outlive the levels that used them
    let again = fmgr.declare_uf("g", FormulaType::Integer, vec![FormulaType::Integer])?;
    prover.push_formula(&fmgr.equal(&fmgr.call_uf(&again, &[a])?, &fmgr.make_int(12))?)?;
    check_answer("g(a) = 12", prover.is_satisfiable()?, true)?;
    print_model(prover.get_model()?);
    Ok(())
}
