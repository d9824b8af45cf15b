//! The command line interface for the model.
use crate::batch::{BatchResult, BatchStatus, run_batch};
use crate::config::{RunConfig, ScenarioSelector};
use crate::input::load_snapshot;
use crate::log;
use crate::output::{create_output_directory, get_output_dir, write_batch};
use crate::route::RouteID;
use crate::scenario::scenarios_for_run;
use crate::settings::Settings;
use crate::solver::SolverKind;
use crate::units::Dimensionless;
use ::log::{info, warn};
use anyhow::{Context, Result, bail};
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};

pub mod example;
use example::ExampleSubcommands;

pub mod settings;
use settings::SettingsSubcommands;

/// The command line interface for the model.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// The available commands.
    #[command(subcommand)]
    command: Option<Commands>,
    /// Flag to provide the CLI docs as markdown
    #[arg(long, hide = true)]
    markdown_help: bool,
}

/// Options for the `run` command
#[derive(Args, Default)]
pub struct RunOpts {
    /// Directory for output files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
    /// Whether to overwrite the output directory if it already exists
    #[arg(long)]
    pub overwrite: bool,
    /// Scenario to run ("all" or a scenario ID)
    #[arg(long)]
    pub scenario: Option<String>,
    /// Solver backend
    #[arg(long, value_enum)]
    pub solver: Option<SolverKind>,
    /// Annual discount rate
    #[arg(long)]
    pub discount_rate: Option<f64>,
    /// Maximum utilisation of installed capacity
    #[arg(long)]
    pub max_utilisation: Option<f64>,
    /// Whether routes with carbon capture are available
    #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true")]
    pub capture: Option<bool>,
    /// Make a route unavailable (may be repeated)
    #[arg(long = "disable-route", value_name = "ROUTE")]
    pub disabled_routes: Vec<String>,
    /// Hydrogen price case
    #[arg(long)]
    pub hydrogen_case: Option<String>,
    /// Allow fractional capacity modules
    #[arg(long)]
    pub continuous_builds: bool,
    /// Time limit for each solve, in seconds
    #[arg(long)]
    pub time_limit: Option<f64>,
    /// Relative MIP gap at which the solver may stop
    #[arg(long)]
    pub mip_rel_gap: Option<f64>,
    /// Solve scenarios in parallel
    #[arg(long)]
    pub parallel: bool,
}

impl RunOpts {
    /// Apply command-line overrides to a run configuration
    pub fn apply_to(&self, config: &mut RunConfig) {
        if let Some(scenario) = &self.scenario {
            let Ok(selector) = scenario.parse::<ScenarioSelector>();
            config.scenario = selector;
        }
        if let Some(solver) = self.solver {
            config.solver = solver;
        }
        if let Some(rate) = self.discount_rate {
            config.discount_rate = Dimensionless(rate);
        }
        if let Some(max) = self.max_utilisation {
            config.max_utilisation = Dimensionless(max);
        }
        if let Some(capture) = self.capture {
            config.capture_enabled = capture;
        }
        config.disabled_routes.extend(
            self.disabled_routes
                .iter()
                .map(|id| RouteID::from(id.as_str())),
        );
        if let Some(case) = &self.hydrogen_case {
            config.hydrogen_case = case.as_str().into();
        }
        if self.continuous_builds {
            config.integer_builds = false;
        }
        if self.time_limit.is_some() {
            config.time_limit = self.time_limit;
        }
        if self.mip_rel_gap.is_some() {
            config.mip_rel_gap = self.mip_rel_gap;
        }
        if self.parallel {
            config.parallel = true;
        }
    }
}

/// The available commands.
#[derive(Subcommand)]
enum Commands {
    /// Run a model.
    Run {
        /// Path to the model directory.
        model_dir: PathBuf,
        /// Other run options
        #[command(flatten)]
        opts: RunOpts,
    },
    /// Manage example models.
    Example {
        /// The available subcommands for managing example models.
        #[command(subcommand)]
        subcommand: ExampleSubcommands,
    },
    /// Validate a model.
    Validate {
        /// The path to the model directory.
        model_dir: PathBuf,
    },
    /// Manage settings file.
    Settings {
        /// The subcommands for managing the settings file.
        #[command(subcommand)]
        subcommand: SettingsSubcommands,
    },
}

impl Commands {
    /// Execute the supplied CLI command
    fn execute(self) -> Result<()> {
        match self {
            Self::Run { model_dir, opts } => handle_run_command(&model_dir, &opts, None),
            Self::Example { subcommand } => subcommand.execute(),
            Self::Validate { model_dir } => handle_validate_command(&model_dir, None),
            Self::Settings { subcommand } => subcommand.execute(),
        }
    }
}

/// Parse CLI arguments and start the program
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    // Invoked as: `$ steel-decarb --markdown-help`
    if cli.markdown_help {
        clap_markdown::print_help_markdown::<Cli>();
        return Ok(());
    }

    if let Some(command) = cli.command {
        command.execute()?;
    } else {
        // No command provided. Show help.
        Cli::command().print_long_help()?;
    }

    Ok(())
}

/// Handle the `run` command.
pub fn handle_run_command(
    model_path: &Path,
    opts: &RunOpts,
    settings: Option<Settings>,
) -> Result<()> {
    // Load program settings, if not provided
    let mut settings = if let Some(settings) = settings {
        settings
    } else {
        Settings::load().context("Failed to load settings.")?
    };

    // This setting can be overridden by command-line arguments
    if opts.overwrite {
        settings.overwrite = true;
    }

    // Get path to output folder
    let pathbuf: PathBuf;
    let output_path = if let Some(p) = opts.output_dir.as_deref() {
        p
    } else {
        pathbuf = get_output_dir(model_path, settings.results_root)?;
        &pathbuf
    };

    let overwrite =
        create_output_directory(output_path, settings.overwrite).with_context(|| {
            format!(
                "Failed to create output directory: {}",
                output_path.display()
            )
        })?;

    // Initialise program logger
    log::init(&settings.log_level, Some(output_path)).context("Failed to initialise logging.")?;

    info!("Starting steel-decarb v{}", env!("CARGO_PKG_VERSION"));

    // Load the model to run
    let snapshot = load_snapshot(model_path).context("Failed to load model.")?;
    info!("Loaded model from {}", model_path.display());
    info!("Output folder: {}", output_path.display());

    // NB: We have to wait until the logger is initialised to display this warning
    if overwrite {
        warn!("Output folder will be overwritten");
    }

    let mut config = RunConfig::from_model_dir(model_path)?;
    opts.apply_to(&mut config);
    config.validate().context("Invalid run options.")?;

    let scenarios = scenarios_for_run(&snapshot, &config)?;
    let budget = snapshot.carbon_budget();
    info!(
        "Running {} scenarios against a carbon budget of {:.1} MtCO2",
        scenarios.len(),
        budget.total.0
    );
    let batch = run_batch(&snapshot, &scenarios, &config, &budget);

    // Outputs are written whatever the outcome
    write_batch(output_path, model_path, &config, &batch)?;
    print_status_table(&batch);

    match batch.status() {
        BatchStatus::Failed => bail!("No scenario could be solved"),
        status => info!("Run {status}! Results saved to {}", output_path.display()),
    }

    Ok(())
}

/// Format the per-scenario status table
fn format_status_table(batch: &BatchResult) -> String {
    let mut lines = vec![format!(
        "{:<24} {:<16} {:>12} {:>12} {:>10} {:>10} {:>16} {:>9}",
        "scenario",
        "status",
        "emissions",
        "budget",
        "overshoot%",
        "compliant",
        "cost (bn USD)",
        "time (s)"
    )];

    for result in &batch.scenarios {
        let (emissions, overshoot, compliant) = match &result.compliance {
            Some(report) => (
                format!("{:.1}", report.cumulative_emissions.0),
                format!("{:.1}", report.overshoot_pct),
                if report.compliant { "yes" } else { "no" }.to_string(),
            ),
            None => ("-".into(), "-".into(), "-".into()),
        };
        let cost = result
            .results
            .as_ref()
            .map_or("-".into(), |results| format!("{:.2}", results.costs.total().0 * 1e-9));
        lines.push(format!(
            "{:<24} {:<16} {:>12} {:>12.1} {:>10} {:>10} {:>16} {:>9.2}",
            result.scenario_id.to_string(),
            result.status.to_string(),
            emissions,
            batch.budget.total.0,
            overshoot,
            compliant,
            cost,
            result.runtime.as_secs_f64()
        ));
    }

    lines.join("\n")
}

/// Print the per-scenario status table to stdout
fn print_status_table(batch: &BatchResult) {
    println!("{}", format_status_table(batch));
    println!("Batch status: {}", batch.status());
}

/// Handle the `validate` command.
pub fn handle_validate_command(model_path: &Path, settings: Option<Settings>) -> Result<()> {
    // Load program settings, if not provided
    let settings = if let Some(settings) = settings {
        settings
    } else {
        Settings::load().context("Failed to load settings.")?
    };

    // Initialise program logger (we won't save log files when running the validate command)
    log::init(&settings.log_level, None).context("Failed to initialise logging.")?;

    // Load/validate the model
    let snapshot = load_snapshot(model_path).context("Failed to validate model.")?;
    let config = RunConfig::from_model_dir(model_path).context("Failed to validate model.")?;

    // Problems with individual scenarios don't prevent the others from running
    for scenario in scenarios_for_run(&snapshot, &config)? {
        if let Err(err) = scenario.check_inputs(&snapshot) {
            warn!("Scenario {} cannot be run: {err:#}", scenario.id);
        }
    }
    info!("Model validation successful!");

    Ok(())
}
