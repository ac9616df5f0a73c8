
// Shorthands for the declarations and connectives that tests and drivers
// write over and over.

#[macro_export]
macro_rules! bool_var {
    ($fmgr:expr, $name:expr) => {
        $fmgr.make_boolean_variable($name)
    };
}

#[macro_export]
macro_rules! int_var {
    ($fmgr:expr, $name:expr) => {
        $fmgr.make_integer_variable($name)
    };
}

#[macro_export]
/// Fails for width zero, like [`FormulaManager::make_variable`].
///
/// [`FormulaManager::make_variable`]: crate::FormulaManager::make_variable
macro_rules! bv_var {
    ($fmgr:expr, $name:expr, $width:expr) => {
        $fmgr.make_variable($name, $crate::FormulaType::Bitvector($width))
    };
}

/// `conj!(fmgr; a, b, c)` is `fmgr.and(&[a, b, c])` over clones.
#[macro_export]
macro_rules! conj {
    ($fmgr:expr; $( $x:expr ),* $(,)?) => {
        $fmgr.and(&[ $( $x.clone() ),* ])
    };
}

#[macro_export]
macro_rules! disj {
    ($fmgr:expr; $( $x:expr ),* $(,)?) => {
        $fmgr.or(&[ $( $x.clone() ),* ])
    };
}
