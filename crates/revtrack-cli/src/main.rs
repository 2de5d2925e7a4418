//! `revtrack` - review dashboard over a protocol export file

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use revtrack_core::{parse_date_text, EngineConfig, ProtocolRef, ReviewerIdentity};
use revtrack_report::{
    completion_by_period, due_soon_assignments, overdue_assignments, reviewer_queue,
    reviewer_stats, speed_rankings, Dashboard,
};
use revtrack_store::{InMemoryStore, ProtocolRepository, Reassignment, StatusChange};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod render;

fn protocol_arg() -> Arg {
    Arg::new("protocol")
        .long("protocol")
        .required(true)
        .help("Protocol path: <id> or <month>/<week>/<id>")
}

fn cli() -> Command {
    Command::new("revtrack")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Review assignment tracking over a protocol export")
        .subcommand_required(true)
        .arg(
            Arg::new("data")
                .long("data")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("JSON export holding `protocols` and `protocols_by_month`"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Engine configuration (TOML)"),
        )
        .arg(
            Arg::new("today")
                .long("today")
                .global(true)
                .help("Reference date (YYYY-MM-DD); defaults to the local date"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Output as JSON"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines on stderr"),
        )
        .subcommand(Command::new("overdue").about("Pending assignments past their due date"))
        .subcommand(Command::new("due-soon").about("Pending assignments due within the window"))
        .subcommand(Command::new("stats").about("Reviewer workload and completion speed"))
        .subcommand(Command::new("periods").about("Completion tally per release period"))
        .subcommand(Command::new("summary").about("Full dashboard"))
        .subcommand(
            Command::new("queue")
                .about("Everything one reviewer holds")
                .arg(Arg::new("reviewer-id").long("reviewer-id").required(true))
                .arg(Arg::new("reviewer-name").long("reviewer-name")),
        )
        .subcommand(
            Command::new("reassign")
                .about("Move one assignment to another reviewer")
                .arg(protocol_arg())
                .arg(Arg::new("from").long("from").required(true).help("Current reviewer id"))
                .arg(Arg::new("from-name").long("from-name").help("Current reviewer name"))
                .arg(Arg::new("to").long("to").required(true).help("New reviewer id"))
                .arg(Arg::new("to-name").long("to-name").required(true).help("New reviewer name")),
        )
        .subcommand(
            Command::new("complete")
                .about("Record a submitted review")
                .arg(protocol_arg())
                .arg(Arg::new("reviewer").long("reviewer").required(true))
                .arg(Arg::new("reviewer-name").long("reviewer-name"))
                .arg(Arg::new("on").long("on").help("Completion date; defaults to --today")),
        )
        .subcommand(
            Command::new("reopen")
                .about("Revert a submitted review for correction")
                .arg(protocol_arg())
                .arg(Arg::new("reviewer").long("reviewer").required(true))
                .arg(Arg::new("reviewer-name").long("reviewer-name")),
        )
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn parse_day(text: &str, flag: &str) -> Result<NaiveDate> {
    parse_date_text(text).with_context(|| format!("invalid --{flag} value `{text}`"))
}

fn identity(args: &ArgMatches, id_key: &str, name_key: &str) -> Result<ReviewerIdentity> {
    let id = args
        .get_one::<String>(id_key)
        .with_context(|| format!("--{id_key} is required"))?;
    Ok(match args.get_one::<String>(name_key) {
        Some(name) => ReviewerIdentity::new(id.as_str(), name.as_str()),
        None => ReviewerIdentity::from_id(id.as_str()),
    })
}

fn protocol_ref(args: &ArgMatches) -> Result<ProtocolRef> {
    let text = args
        .get_one::<String>("protocol")
        .context("--protocol is required")?;
    text.parse::<ProtocolRef>()
        .with_context(|| format!("invalid protocol path `{text}`"))
}

#[derive(Serialize)]
struct StatsView<'a> {
    reviewers: &'a [revtrack_report::ReviewerStats],
    speed: &'a [revtrack_report::SpeedStat],
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("log-json"));

    let Some(data) = matches.get_one::<PathBuf>("data").cloned() else {
        bail!("--data <export.json> is required");
    };
    let config = match matches.get_one::<PathBuf>("config") {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    let today = match matches.get_one::<String>("today") {
        Some(text) => parse_day(text, "today")?,
        None => chrono::Local::now().date_naive(),
    };
    let json = matches.get_flag("json");
    tracing::debug!(%today, data = %data.display(), "reference date");
    let policy = config.temporal_policy();

    let store = InMemoryStore::load_json(&data)
        .with_context(|| format!("loading export {}", data.display()))?;
    let repo = ProtocolRepository::with_config(store, config.clone());

    let Some((name, args)) = matches.subcommand() else {
        bail!("no subcommand given");
    };

    match name {
        "overdue" => {
            let rows = overdue_assignments(&repo.load_all().await?, today);
            render::emit(rows.as_slice(), json, |r| render::assignment_rows("Overdue Reviews", r))?;
        }
        "due-soon" => {
            let rows = due_soon_assignments(&repo.load_all().await?, today, &policy);
            render::emit(rows.as_slice(), json, |r| render::assignment_rows("Due Soon", r))?;
        }
        "stats" => {
            let protocols = repo.load_all().await?;
            let reviewers = reviewer_stats(&protocols, today);
            let speed = speed_rankings(&protocols, config.min_completed_for_speed);
            let view = StatsView {
                reviewers: &reviewers,
                speed: &speed,
            };
            render::emit(&view, json, |v| render::reviewer_table(v.reviewers, v.speed))?;
        }
        "periods" => {
            let periods = completion_by_period(&repo.load_all().await?, &config);
            render::emit(periods.as_slice(), json, render::period_table)?;
        }
        "summary" => {
            let dashboard = Dashboard::build(&repo.load_all().await?, today, &config);
            render::emit(&dashboard, json, Dashboard::generate_text)?;
        }
        "queue" => {
            let who = identity(args, "reviewer-id", "reviewer-name")?;
            let entries = reviewer_queue(&repo.load_all().await?, &who, today, &policy);
            render::emit(entries.as_slice(), json, render::queue_table)?;
        }
        "reassign" => {
            let reference = protocol_ref(args)?;
            let change = Reassignment::new(
                identity(args, "from", "from-name")?,
                identity(args, "to", "to-name")?,
            );
            let protocol = repo.reassign(&reference, &change).await?;
            repo.store().save_json(&data)?;
            render::emit(&protocol, json, render::protocol_detail)?;
        }
        "complete" => {
            let reference = protocol_ref(args)?;
            let on = match args.get_one::<String>("on") {
                Some(text) => parse_day(text, "on")?,
                None => today,
            };
            let change = StatusChange::complete(identity(args, "reviewer", "reviewer-name")?, on);
            let protocol = repo.set_review_status(&reference, &change).await?;
            repo.store().save_json(&data)?;
            render::emit(&protocol, json, render::protocol_detail)?;
        }
        "reopen" => {
            let reference = protocol_ref(args)?;
            let change = StatusChange::reopen(identity(args, "reviewer", "reviewer-name")?);
            let protocol = repo.set_review_status(&reference, &change).await?;
            repo.store().save_json(&data)?;
            render::emit(&protocol, json, render::protocol_detail)?;
        }
        other => bail!("unknown subcommand `{other}`"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn reassign_arguments_parse() {
        let matches = cli()
            .try_get_matches_from([
                "revtrack", "--data", "x.json", "reassign", "--protocol", "2024-05/week-2/P-1",
                "--from", "R1", "--to", "R2", "--to-name", "Dr. Kim",
            ])
            .unwrap();
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "reassign");
        assert_eq!(
            protocol_ref(args).unwrap(),
            ProtocolRef::nested("2024-05", "week-2", "P-1")
        );
        assert_eq!(identity(args, "from", "from-name").unwrap().name, "R1");
        assert_eq!(identity(args, "to", "to-name").unwrap().name, "Dr. Kim");
    }

    #[test]
    fn bad_dates_are_rejected() {
        assert!(parse_day("2024-13-40", "today").is_err());
        assert_eq!(
            parse_day("2024-05-01", "today").unwrap(),
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
        );
    }
}
