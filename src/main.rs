use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{CommandFactory, Parser, Subcommand};
use common::Configuration;
use common::cli::{CommonArgs, CommonCommands, utils};
use sli_query::metrics::legacy;
use sli_query::{SliQuery, Timeframe};

#[derive(Parser)]
#[command(name = "sliquery")]
#[command(about = "sliquery - parse, upgrade and encode SLI queries")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    #[command(subcommand)]
    command: Option<SliQueryCommands>,
}

#[derive(Subcommand)]
enum SliQueryCommands {
    /// Parse a query and print its kind and canonical form
    Parse {
        query: String,
        #[arg(long, help = "Print the parsed query as JSON")]
        json: bool,
    },
    /// Rewrite a legacy `<metricSelector>?scope=<selector>` query in the current syntax
    Upgrade { query: String },
    /// Print the API request answering a query over a timeframe
    Request {
        query: String,
        #[arg(long, help = "Start of the timeframe (RFC 3339)")]
        from: DateTime<Utc>,
        #[arg(long, help = "End of the timeframe (RFC 3339)")]
        to: DateTime<Utc>,
    },
    #[command(flatten)]
    Common(CommonCommands),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on CLI arguments
    utils::init_logging(&cli.common);

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let config = utils::load_config(cli.common.config.as_ref())?;
    let output = run(command, config)?;
    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}

fn run(command: SliQueryCommands, config: &Configuration) -> Result<String> {
    match command {
        SliQueryCommands::Parse { query, json } => {
            let parsed = parse_query(&query)?;
            if json {
                return serde_json::to_string_pretty(&parsed)
                    .context("Failed to serialize query to JSON");
            }
            Ok(format!("{}\t{}", parsed.kind(), parsed.canonical()))
        }
        SliQueryCommands::Upgrade { query } => {
            let query = query.trim();
            if !legacy::is_legacy(query)? {
                log::info!("Query already uses the current syntax");
                return Ok(query.to_string());
            }
            legacy::upgrade(query).with_context(|| format!("Failed to upgrade query '{query}'"))
        }
        SliQueryCommands::Request { query, from, to } => {
            let parsed = parse_query(&query)?;
            let timeframe = Timeframe::new(from, to)?;
            let request = parsed.request_string(timeframe, &config.request_options())?;
            log::debug!("Built {} request for '{}'", parsed.kind(), parsed.canonical());
            Ok(request)
        }
        SliQueryCommands::Common(common_cmd) => {
            utils::handle_common_command(&common_cmd, config)?;
            Ok(String::new())
        }
    }
}

fn parse_query(query: &str) -> Result<SliQuery> {
    sli_query::parse(query).with_context(|| format!("Failed to parse query '{query}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_args(args: &[&str]) -> Result<String> {
        let cli = Cli::try_parse_from(args)?;
        let command = cli.command.context("missing subcommand")?;
        run(command, &Configuration::default())
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_command() {
        let output = run_args(&["sliquery", "parse", "PV2;problemSelector=status(open)"]).unwrap();
        assert_eq!(output, "PV2\tPV2;problemSelector=status(open)");
    }

    #[test]
    fn test_parse_command_reports_errors() {
        let err = run_args(&["sliquery", "parse", "metricSelector=a&bogus=b"]).unwrap_err();
        assert!(format!("{err:#}").contains("Unknown key 'bogus'"));
    }

    #[test]
    fn test_upgrade_command() {
        let output = run_args(&["sliquery", "upgrade", "m?scope=tag(x)"]).unwrap();
        assert_eq!(output, "metricSelector=m&entitySelector=tag(x),type(SERVICE)");

        let output = run_args(&["sliquery", "upgrade", "metricSelector=m"]).unwrap();
        assert_eq!(output, "metricSelector=m");
    }

    #[test]
    fn test_request_command() {
        let output = run_args(&[
            "sliquery",
            "request",
            "SLO;abc",
            "--from",
            "2021-06-01T00:00:00Z",
            "--to",
            "2021-06-01T00:05:00Z",
        ])
        .unwrap();
        assert_eq!(
            output,
            "/api/v2/slo/abc?from=1622505600000&to=1622505900000&timeFrame=GTF"
        );
    }

    #[test]
    fn test_request_command_rejects_inverted_timeframe() {
        let result = run_args(&[
            "sliquery",
            "request",
            "SLO;abc",
            "--from",
            "2021-06-01T00:05:00Z",
            "--to",
            "2021-06-01T00:00:00Z",
        ]);
        assert!(result.is_err());
    }
}
