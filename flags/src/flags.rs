use gflags::*;
use lazy_static::lazy_static;
use logging::{raise_error, Level, Logger};
use prover::SolverConfig;

define! {
    /// Seed for the engine's random choices
    -s, --seed: i32 = 42
}
define! {
    /// Time limit per satisfiability check in milliseconds
    /// # Possible values
    /// * `0` - No limit
    /// * `n in Z+` - Any positive integer
    -t, --timeout: i32 = 0
}
define! {
    /// Which scripted session to run
    /// # Possible values
    /// * `stack` - Push, pop and check a boolean stack
    /// * `model` - Read back a model with constants, functions and arrays
    /// * `unsat` - Unsat cores over tracked assertions and assumptions
    /// * `array` - Nested array models
    /// * `uf` - Uninterpreted functions across stack levels
    /// * `all` - Every one of the above
    --scenario: &str = "all"
}
define! {
    /// Turns model generation off; scenarios that read models are skipped
    --no_models: bool = false
}
define! {
    /// The help command
    -h, --help: bool = false
}
define! {
    /// The debug command
    /// # Possible values
    /// * `0` - No debug
    /// * `1` - Debug
    -d, --debug: i32 = 0
}
define! {
    /// The level of debug you want
    /// # Possible values
    /// * `1` - Prints everything
    /// * `2` - Does not print when a task is completed
    /// * `3` - Does not print when task is completed or general info
    /// * `4` - Does not print when task is completed, general info, or warnings
    /// * `5` - Will only print errors
    --debug_level: i32 = 1
}

pub const SCENARIOS: &[&str] = &["stack", "model", "unsat", "array", "uf", "all"];

pub struct Flags {
    pub seed: i32,
    pub timeout: i32,
    pub scenario: String,
    pub models: bool,
    pub help: bool,
    pub debug: bool,
    pub debug_level: i32,
}

lazy_static! {
    pub static ref FLAGS: Flags = Flags {
        seed: SEED.flag,
        timeout: TIMEOUT.flag,
        scenario: SCENARIO.flag.to_string(),
        models: !NO_MODELS.flag,
        help: HELP.flag,
        debug: DEBUG.flag != 0,
        debug_level: DEBUG_LEVEL.flag,
    };
}

impl Flags {
    /// The engine settings these flags describe.
    pub fn solver_config(&self) -> Result<SolverConfig, String> {
        let random_seed = u32::try_from(self.seed)
            .map_err(|_| format!("The seed must not be negative, got {}", self.seed))?;
        let timeout_ms = match self.timeout {
            0 => None,
            t if t > 0 => Some(t as u32),
            t => return Err(format!("The timeout must not be negative, got {}", t)),
        };
        Ok(SolverConfig {
            generate_models: self.models,
            random_seed,
            timeout_ms,
        })
    }

    pub fn threshold(&self) -> Option<Level> {
        Level::from_flag(self.debug_level)
    }
}

pub fn parse_flags() -> (Logger, SolverConfig) {
    let args = parse();

    if HELP.flag {
        // print the doc string of each flag
        print_help_and_exit(0);
    }

    let threshold = match FLAGS.threshold() {
        Some(level) => level,
        None if FLAGS.debug => {
            raise_error("The debug level must be between 1 and 5", Level::Fatal);
            Level::Fatal
        }
        None => Level::Fatal,
    };
    let logger = Logger::new(FLAGS.debug, threshold);

    if !SCENARIOS.contains(&FLAGS.scenario.as_str()) {
        logger.log(
            &format!("The scenario must be one of {}", SCENARIOS.join(", ")),
            Level::Fatal,
        );
    }
    let config = match FLAGS.solver_config() {
        Ok(config) => config,
        Err(message) => {
            raise_error(&message, Level::Fatal);
            SolverConfig::default()
        }
    };

    logger.info(&format!("The seed is: {}", config.random_seed));
    logger.info(&format!("The timeout is: {:?}", config.timeout_ms));
    logger.info(&format!("The scenario is: {}", FLAGS.scenario));
    logger.info(&format!("Models are: {}", if FLAGS.models { "on" } else { "off" }));
    logger.info(&format!("The debug level is: {}", FLAGS.debug_level));
    if !args.is_empty() {
        logger.warning(&format!("Ignoring positional arguments: {:?}", args));
    }
    logger.completion("Flag Parsing");
    (logger, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(seed: i32, timeout: i32) -> Flags {
        Flags {
            seed,
            timeout,
            scenario: "all".to_owned(),
            models: true,
            help: false,
            debug: false,
            debug_level: 1,
        }
    }

    #[test]
    fn solver_config_from_flags() {
        assert_eq!(flags(42, 0).solver_config(), Ok(SolverConfig::default()));

        let config = flags(7, 1500).solver_config().unwrap();
        assert_eq!(config.random_seed, 7);
        assert_eq!(config.timeout_ms, Some(1500));
    }

    #[test]
    fn negative_values_are_rejected() {
        assert!(flags(-1, 0).solver_config().is_err());
        assert!(flags(1, -5).solver_config().is_err());
    }

    #[test]
    fn debug_levels() {
        let mut f = flags(1, 0);
        assert_eq!(f.threshold(), Some(Level::Completion));
        f.debug_level = 9;
        assert_eq!(f.threshold(), None);
    }

    #[test]
    fn models_off() {
        let mut f = flags(1, 0);
        f.models = false;
        assert!(!f.solver_config().unwrap().generate_models);
    }
}
