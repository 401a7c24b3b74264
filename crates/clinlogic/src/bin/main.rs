//! clinlogic command-line interface

use clap::{Parser, Subcommand};
use clinlogic::cli::output::{self, ColorMode, OutputFormat};
use clinlogic::cli::{check, eval, rules};
use log::LevelFilter;
use std::path::PathBuf;

/// Clinical logic command-line tool
#[derive(Parser)]
#[command(name = "clinlogic")]
#[command(author, version, about = "Evaluate clinical logic rules against patient data", long_about = None)]
struct Cli {
    /// Verbose output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value = "pretty", global = true)]
    format: OutputFormat,

    /// Output file (default: stdout)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Color output
    #[arg(long, value_enum, default_value = "auto", global = true)]
    color: ColorMode,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate queries or a registered rule for each subject of a data file
    Eval {
        /// Queries to evaluate, e.g. "LAST {CD4 COUNT} < 200"
        queries: Vec<String>,

        /// Data file (JSON: concepts and observations)
        #[arg(short, long)]
        data: PathBuf,

        /// Evaluate a rule from the rules file instead of, or as well as, queries
        #[arg(long)]
        rule: Option<String>,

        /// Rules file (JSON list of rule definitions)
        #[arg(short, long)]
        rules: Option<PathBuf>,

        /// Only evaluate this subject
        #[arg(short, long)]
        subject: Option<String>,

        /// Parameters (name=value); rule arguments when --rule is given
        #[arg(short, long = "param")]
        params: Vec<String>,

        /// Reference time, e.g. 2024-06-01 or 2024-06-01T08:30
        #[arg(long)]
        now: Option<String>,

        /// Engine configuration file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Check query syntax and rule files without evaluating
    Check {
        /// Queries to check
        queries: Vec<String>,

        /// Rules files to check
        #[arg(short, long)]
        rules: Vec<PathBuf>,
    },

    /// List the rules of a rules file
    Rules {
        /// Rules file (JSON list of rule definitions)
        file: PathBuf,

        /// Only tokens containing this text (case-insensitive)
        #[arg(long)]
        filter: Option<String>,

        /// Only rules with this tag
        #[arg(short, long)]
        tag: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    human_panic::setup_panic!();

    let cli = Cli::parse();

    output::setup_colors(cli.color);

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level.as_str()))
        .init();

    let result = match cli.command {
        Commands::Eval {
            queries,
            data,
            rule,
            rules,
            subject,
            params,
            now,
            config,
        } => {
            let config = eval::EvalConfig {
                queries,
                rule,
                data,
                subject,
                params,
                now,
                rules_file: rules,
                config_file: config,
                format: cli.format,
                output_file: cli.output.clone(),
            };
            eval::eval(config).await
        }

        Commands::Check { queries, rules } => check::check(check::CheckConfig {
            queries,
            rules_files: rules,
        }),

        Commands::Rules { file, filter, tag } => rules::list(rules::RulesConfig {
            rules_file: file,
            filter,
            tag,
            format: cli.format,
            output_file: cli.output.clone(),
        }),
    };

    if let Err(e) = result {
        eprintln!("{}", output::format_error(&e));
        std::process::exit(1);
    }
}
