mod aggregate;
mod cli;
mod combine;
mod config;
mod error;
mod extract;
mod identity;
mod normalize;
mod report;
mod score;
mod store;
mod types;

use crate::error::TeamScoreError;
use crate::store::{RuleUpdate, TeamStore};
use crate::types::config::ScoreConfig;
use clap::Parser;
use std::path::Path;
use tracing_subscriber::EnvFilter;

pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const RUNTIME_FAILURE: i32 = 3;
}

fn init_tracing(verbose: u8, quiet: bool) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn open_store(path: &Path) -> Result<(TeamStore, ScoreConfig), TeamScoreError> {
    if !path.exists() {
        return Err(TeamScoreError::PathNotFound(path.display().to_string()));
    }
    let config = config::load_config(path)?.unwrap_or_default();
    let store = TeamStore::new(path, config.layout());
    Ok((store, config))
}

fn team_or_active(store: &TeamStore, team: Option<String>) -> Result<String, TeamScoreError> {
    team.or_else(|| store.active_team_id())
        .ok_or(TeamScoreError::NoActiveTeam)
}

fn run() -> Result<i32, TeamScoreError> {
    let cli = cli::Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        cli::Commands::Score(cmd) => {
            let (store, config) = open_store(&cmd.path)?;
            let team_id = team_or_active(&store, cmd.team)?;
            let score_report = aggregate::aggregate_team_scores(&store, &team_id, &config)?;

            let output_format = match cmd.format {
                cli::ReportFormat::Json => report::OutputFormat::Json,
                cli::ReportFormat::Md => report::OutputFormat::Md,
            };
            let rendered = report::render(&score_report, output_format)?;
            match cmd.out {
                Some(out) => {
                    std::fs::write(&out, rendered)?;
                    println!("report written to {}", out.display());
                }
                None => println!("{rendered}"),
            }

            if !score_report.unmatched.is_empty() && !cli.quiet {
                eprintln!(
                    "warning: {} source key(s) matched no student and were excluded",
                    score_report.unmatched.len()
                );
            }
            Ok(exit_code::SUCCESS)
        }
        cli::Commands::Teams(cmd) => {
            let (store, _) = open_store(&cmd.path)?;
            let teams = store.load_teams()?;
            if teams.is_empty() {
                println!("teams: none");
                return Ok(exit_code::SUCCESS);
            }

            let active = store.active_team_id();
            for team in &teams {
                let marker = if active.as_deref() == Some(team.id.as_str()) {
                    "*"
                } else {
                    " "
                };
                println!(
                    "{} {} {} ({}) - {} students",
                    marker,
                    team.id,
                    team.name,
                    team.code,
                    team.students.len()
                );
            }
            Ok(exit_code::SUCCESS)
        }
        cli::Commands::Activate(cmd) => {
            let (store, _) = open_store(&cmd.path)?;
            store.set_active_team(&cmd.id)?;
            println!("active team: {}", cmd.id);
            Ok(exit_code::SUCCESS)
        }
        cli::Commands::Setup(cmd) => {
            let (store, _) = open_store(&cmd.path)?;
            if !cmd.file.exists() {
                return Err(TeamScoreError::PathNotFound(cmd.file.display().to_string()));
            }
            let content = std::fs::read_to_string(&cmd.file)?;
            let new_team = serde_json::from_str(&content)?;
            let team = store.create_team(new_team)?;
            println!(
                "created {} ({}) with {} students; now active",
                team.id,
                team.name,
                team.students.len()
            );
            Ok(exit_code::SUCCESS)
        }
        cli::Commands::Rules(cmd) => {
            let (store, config) = open_store(&cmd.path)?;
            let team_id = team_or_active(&store, cmd.team)?;
            let team = store.find_team(&team_id)?;
            let defaults = config.default_weights();

            let mut rule_set = team
                .rules
                .as_ref()
                .map(|rules| rules.to_rule_set(&defaults))
                .unwrap_or_else(|| types::rules::RuleSet::from_weights(&defaults));

            let updating =
                !cmd.set.is_empty() || cmd.auto_recalc.is_some() || cmd.cross_verify.is_some();
            if updating {
                for (name, value) in &cmd.set {
                    rule_set.set_rule(name, *value);
                }
                let update = RuleUpdate {
                    rules: (!cmd.set.is_empty()).then(|| rule_set.rules.clone()),
                    auto_recalc: cmd.auto_recalc,
                    cross_verify: cmd.cross_verify,
                    ..RuleUpdate::default()
                };
                rule_set = store.save_rules(&team_id, update, &defaults)?;
                println!("rules saved for {team_id}");
            }

            println!("rules for {} ({}):", team.name, team_id);
            for rule in &rule_set.rules {
                let known = types::metrics::Dimension::from_name(&rule.name).is_some();
                println!(
                    "- {}: {}{}",
                    rule.name,
                    rule.value,
                    if known { "" } else { " (not scored)" }
                );
            }
            println!(
                "auto_recalc: {} | cross_verify: {}",
                rule_set.auto_recalc, rule_set.cross_verify
            );

            let total = rule_set.total();
            println!("total: {total}");
            if (total - 100.0).abs() > f64::EPSILON {
                eprintln!("warning: rule weights total {total}, not 100; weights apply relatively");
            }
            Ok(exit_code::SUCCESS)
        }
        cli::Commands::CombineDocs(cmd) => {
            let (store, _) = open_store(&cmd.path)?;
            match combine::combine_documentation_metrics(&store)? {
                Some(result) => {
                    let count = result["students"].as_object().map_or(0, |s| s.len());
                    println!(
                        "combined documentation metrics for {} students into {}",
                        count,
                        store.layout().combined_docs_file
                    );
                }
                None => println!("combine-docs: upload registry is empty"),
            }
            Ok(exit_code::SUCCESS)
        }
    }
}

fn main() {
    match run() {
        Ok(code) => {
            if code != 0 {
                std::process::exit(code);
            }
        }
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(exit_code::RUNTIME_FAILURE);
        }
    }
}
