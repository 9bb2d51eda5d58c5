mod aggregate;
mod cell;
mod columns;
mod error;
mod ledger;
mod normalize;
mod orders;
mod router;
mod sheets;
mod tags;
mod template;
#[cfg(test)]
mod testutil;

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Arg, ArgMatches, Command};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::ledger::{FacilityMode, DEFAULT_SUPPLIER};
use crate::orders::{generate_order_forms_both_facilities, generate_order_workbook};

pub fn make_app() -> Command {
    Command::new("hatchu")
        .about("Generate Maruhachi supplier order-form workbooks from a food inspection ledger")
        .arg(
            Arg::new("ledger")
                .long("ledger")
                .value_name("FILE")
                .help("Inspection ledger workbook (.xlsx)"),
        )
        .arg(
            Arg::new("template")
                .long("template")
                .value_name("FILE")
                .help("Order-form template workbook (.xlsm)"),
        )
        .arg(
            Arg::new("tags")
                .long("tags")
                .value_name("FILE")
                .help("Tag reference workbook holding the タグ sheet"),
        )
        .arg(
            Arg::new("out-dir")
                .long("out-dir")
                .value_name("DIR")
                .help("Directory the order forms are written into"),
        )
        .arg(
            Arg::new("facility")
                .long("facility")
                .value_name("MODE")
                .default_value("both")
                .help("Facility to generate for: tokuyou, yuhouse or both"),
        )
        .arg(
            Arg::new("supplier")
                .long("supplier")
                .value_name("NAME")
                .default_value(DEFAULT_SUPPLIER)
                .help("Supplier name the ledger is filtered to"),
        )
        .arg(
            Arg::new("prefix")
                .long("prefix")
                .value_name("NAME")
                .default_value("丸八発注書")
                .help("Output file name prefix"),
        )
}

fn main() {
    // Load .env file if present (for local configuration)
    // Silently ignore if .env file doesn't exist
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let matches = make_app().get_matches();
    if let Err(e) = run(&matches) {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn run(matches: &ArgMatches) -> Result<()> {
    let ledger = resolve_path(matches, "ledger", "HATCHU_LEDGER_FILE")?;
    let template = resolve_path(matches, "template", "HATCHU_TEMPLATE_FILE")?;
    let tags = resolve_path(matches, "tags", "HATCHU_TAG_FILE")?;
    let out_dir = matches
        .get_one::<String>("out-dir")
        .cloned()
        .or_else(|| std::env::var("HATCHU_OUT_DIR").ok())
        .map(|p| expand_home(&p))
        .unwrap_or_else(|| PathBuf::from("."));
    let supplier = matches
        .get_one::<String>("supplier")
        .expect("has default value");
    let prefix = matches
        .get_one::<String>("prefix")
        .expect("has default value");
    let facility = matches
        .get_one::<String>("facility")
        .expect("has default value");

    if facility == "both" {
        let (tokuyou, yuhouse) = generate_order_forms_both_facilities(
            &ledger, &template, &tags, supplier, &out_dir, prefix,
        )?;
        println!("{}", tokuyou.display());
        println!("{}", yuhouse.display());
    } else {
        let mode: FacilityMode = facility.parse()?;
        let out_path = out_dir.join(format!("{prefix}_{}.xlsm", mode.output_suffix()));
        let written =
            generate_order_workbook(&ledger, &template, &tags, supplier, mode, &out_path)?;
        println!("{}", written.display());
    }
    Ok(())
}

/// Input paths come from the command line, falling back to the environment
/// (typically set via .env).
fn resolve_path(matches: &ArgMatches, flag: &str, env_var: &str) -> Result<PathBuf> {
    matches
        .get_one::<String>(flag)
        .cloned()
        .or_else(|| std::env::var(env_var).ok())
        .map(|p| expand_home(&p))
        .ok_or_else(|| anyhow!("missing input: pass --{flag} or set {env_var}"))
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(stripped);
        }
    }
    PathBuf::from(path)
}
