use bac_core::config::DefaultsConfig;
use bac_core::report::decay_curve;
use bac_core::*;
use clap::{Args, Parser, Subcommand};
use std::fs::File;
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bacdash")]
#[command(about = "Blood alcohol estimate with a risk dashboard chart", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate BAC, print the summary and optionally write the chart
    Calc {
        #[command(flatten)]
        drink: DrinkArgs,

        /// Write the dashboard chart as PNG to this path
        #[arg(long)]
        out: Option<PathBuf>,

        /// Print the report as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Export the sampled decay curve as CSV
    Curve {
        #[command(flatten)]
        drink: DrinkArgs,

        /// Number of samples (defaults to chart.samples from config)
        #[arg(long, value_parser = clap::value_parser!(u64).range(2..=100_000))]
        samples: Option<u64>,

        /// Write to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Show the effective configuration
    Config {
        /// Print the config file location instead of its contents
        #[arg(long)]
        path: bool,
    },
}

#[derive(Args)]
struct DrinkArgs {
    /// Number of drinks
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=20))]
    drinks: u32,

    /// Size of one drink in fluid ounces
    #[arg(long)]
    drink_size: f64,

    /// Alcohol by volume, percent
    #[arg(long)]
    alcohol: f64,

    /// Body weight in pounds
    #[arg(long)]
    weight: Option<f64>,

    /// Sex (male or female)
    #[arg(long)]
    sex: Option<String>,

    /// Hours since the first drink
    #[arg(long, default_value_t = 0.0)]
    hours: f64,

    /// BAC cleared per hour, percent
    #[arg(long)]
    metabolism: Option<f64>,
}

impl DrinkArgs {
    fn to_input(&self, defaults: &DefaultsConfig) -> BacInput {
        let sex_label = self.sex.as_deref().unwrap_or(&defaults.sex);

        BacInput {
            drinks: self.drinks,
            drink_size_oz: self.drink_size,
            alcohol_percent: self.alcohol,
            weight_lbs: self.weight.unwrap_or(defaults.weight_lbs),
            sex: Sex::from_label(sex_label),
            hours_elapsed: self.hours,
            metabolism_rate: self.metabolism.unwrap_or(defaults.metabolism_rate),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    bac_core::logging::init_with_level(level);

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::Calc { drink, out, json } => cmd_calc(&drink, out, json, &config),
        Commands::Curve {
            drink,
            samples,
            out,
        } => cmd_curve(&drink, samples, out, &config),
        Commands::Config { path } => cmd_config(cli.config, path, &config),
    }
}

fn cmd_calc(drink: &DrinkArgs, out: Option<PathBuf>, json: bool, config: &Config) -> Result<()> {
    let input = drink.to_input(&config.defaults);
    input.validate()?;

    let report = match &out {
        Some(_) => run(&input, &config.chart)?,
        None => BacReport::from_estimate(BacEstimate::compute(&input), Vec::new()),
    };

    if let Some(ref path) = out {
        std::fs::write(path, &report.chart_png)?;
        tracing::info!("Wrote chart to {:?}", path);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", report.summary.trim_end());
    if let Some(ref path) = out {
        println!();
        println!("Chart: {}", path.display());
    }

    Ok(())
}

fn cmd_curve(
    drink: &DrinkArgs,
    samples: Option<u64>,
    out: Option<PathBuf>,
    config: &Config,
) -> Result<()> {
    let input = drink.to_input(&config.defaults);
    input.validate()?;

    let mut chart = config.chart.clone();
    if let Some(samples) = samples {
        chart.samples = samples as usize;
    }
    let curve = decay_curve(&input, &chart);

    let rows = match out {
        Some(path) => {
            let rows = write_curve_csv(&curve, File::create(&path)?)?;
            println!("Wrote {} samples to {}", rows, path.display());
            rows
        }
        None => write_curve_csv(&curve, io::stdout().lock())?,
    };

    tracing::info!("Exported {} curve samples", rows);
    Ok(())
}

fn cmd_config(override_path: Option<PathBuf>, path_only: bool, config: &Config) -> Result<()> {
    if path_only {
        match override_path.or_else(Config::default_config_path) {
            Some(path) => println!("{}", path.display()),
            None => {
                return Err(Error::Config(
                    "no config directory on this platform".into(),
                ))
            }
        }
        return Ok(());
    }

    print!("{}", config.to_toml_string()?);
    Ok(())
}
