use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "teamscore",
    version,
    about = "Per-student contribution scoring for project teams"
)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Aggregate every source for a team and print the ranking
    Score(ScoreCommand),
    /// List stored teams
    Teams(TeamsCommand),
    /// Make a team the active one
    Activate(ActivateCommand),
    /// Create a team from a JSON roster
    Setup(SetupCommand),
    /// Show or update a team's rule weights
    Rules(RulesCommand),
    /// Rebuild combined documentation metrics from the upload registry
    CombineDocs(CombineDocsCommand),
}

#[derive(Clone, ValueEnum)]
pub enum ReportFormat {
    Json,
    Md,
}

#[derive(Args)]
pub struct ScoreCommand {
    pub path: PathBuf,
    /// Team id; defaults to the active team
    #[arg(long)]
    pub team: Option<String>,
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: ReportFormat,
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Args)]
pub struct TeamsCommand {
    pub path: PathBuf,
}

#[derive(Args)]
pub struct ActivateCommand {
    pub path: PathBuf,
    pub id: String,
}

#[derive(Args)]
pub struct SetupCommand {
    pub path: PathBuf,
    /// JSON file with { name, code, repo?, students }
    #[arg(long)]
    pub file: PathBuf,
}

#[derive(Args)]
pub struct RulesCommand {
    pub path: PathBuf,
    #[arg(long)]
    pub team: Option<String>,
    /// Rule weight as NAME=VALUE; repeatable
    #[arg(long = "set", value_parser = parse_rule_assignment)]
    pub set: Vec<(String, f64)>,
    #[arg(long)]
    pub auto_recalc: Option<bool>,
    #[arg(long)]
    pub cross_verify: Option<bool>,
}

#[derive(Args)]
pub struct CombineDocsCommand {
    pub path: PathBuf,
}

fn parse_rule_assignment(raw: &str) -> Result<(String, f64), String> {
    let (name, value) = raw
        .rsplit_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err("rule name cannot be empty".to_string());
    }
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid weight '{}': {e}", value.trim()))?;
    if !value.is_finite() || value < 0.0 {
        return Err(format!("weight must be finite and non-negative: {value}"));
    }
    Ok((name.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_assignment_accepts_labels_with_spaces() {
        assert_eq!(
            parse_rule_assignment("Total Commits=12.5"),
            Ok(("Total Commits".to_string(), 12.5))
        );
    }

    #[test]
    fn rule_assignment_rejects_bad_input() {
        assert!(parse_rule_assignment("commits").is_err());
        assert!(parse_rule_assignment("=4").is_err());
        assert!(parse_rule_assignment("commits=lots").is_err());
        assert!(parse_rule_assignment("commits=-2").is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
