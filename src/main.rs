use clap::{Parser, Subcommand};
use lazyrt::engine::{unparse, Machine, ReduceConfig};
use lazyrt::error::{ReduceError, Result};
use lazyrt::samples::{self, Program};
use tracing::{debug, info};

#[derive(Parser)]
#[command(
    name = "lazyrt",
    version = env!("CARGO_PKG_VERSION"),
    about = "Runs built-in programs on the call-by-need graph reducer"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (use multiple times for increased verbosity)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Maximum nesting of forces (overrides LAZYRT_DEPTH_LIMIT)
    #[arg(long, global = true)]
    depth_limit: Option<usize>,

    /// Abort after this many reduction steps, 0 for no limit (overrides LAZYRT_STEP_LIMIT)
    #[arg(long, global = true)]
    step_limit: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Upper-case TEXT through a lazily built string
    Upper { text: String },

    /// Write TEXT to stderr with `dump` and print VALUE
    Echo {
        text: String,
        #[arg(default_value_t = 0, allow_negative_numbers = true)]
        value: i64,
    },

    /// Raise TEXT with the `error` primitive
    Error { text: String },

    /// Print BASE raised to EXPONENT
    Pow {
        #[arg(allow_negative_numbers = true)]
        base: i64,
        #[arg(allow_negative_numbers = true)]
        exponent: i64,
    },

    /// Print the larger of two integers
    Max {
        #[arg(allow_negative_numbers = true)]
        a: i64,
        #[arg(allow_negative_numbers = true)]
        b: i64,
    },

    /// Force a global defined as itself
    Loop,

    /// Tail-call forever, stopped only by --step-limit
    Spin,

    /// Recurse through switch scrutinees until the depth limit
    Nest,
}

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let mut config = ReduceConfig::from_env();
    if let Some(limit) = cli.depth_limit {
        config.depth_limit = limit;
    }
    if let Some(limit) = cli.step_limit {
        config.step_limit = (limit > 0).then_some(limit);
    }
    debug!(?config, "reducer configuration");

    match run(cli.command, config) {
        Ok(text) => println!("{}", text),
        // the message is already on stderr
        Err(err @ ReduceError::Raised(_)) => std::process::exit(err.exit_code()),
        Err(err) => {
            eprintln!("lazyrt: {}", err);
            std::process::exit(err.exit_code());
        }
    }
}

fn run(command: Commands, config: ReduceConfig) -> Result<String> {
    let raw = matches!(command, Commands::Upper { .. });
    let Program { globals, root } = match command {
        Commands::Upper { text } => samples::upper_program(&text),
        Commands::Echo { text, value } => samples::dump_program(&text, value),
        Commands::Error { text } => samples::error_program(&text),
        Commands::Pow { base, exponent } => samples::pow_program(base, exponent),
        Commands::Max { a, b } => samples::max_program(a, b),
        Commands::Loop => samples::self_loop_program(),
        Commands::Spin => samples::spin_program(),
        Commands::Nest => samples::nest_program(),
    };

    let mut machine = Machine::with_config(globals, config);
    let value = machine.eval(&root)?;
    let text = if raw {
        machine.realize_string(&value)?
    } else {
        unparse(&mut machine, &value)?
    };
    let stats = machine.stats();
    info!(reductions = stats.reductions, max_stack = stats.max_stack, "done");
    Ok(text)
}

fn setup_logging(verbose: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    let formatter = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_timer(tracing_subscriber::fmt::time::uptime())
        .with_level(true);

    tracing_subscriber::registry()
        .with(formatter)
        .with(filter)
        .init();
}
