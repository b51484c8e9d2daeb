use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use chrono::Utc;
use clap::{ArgMatches, Command, arg, value_parser};
use serde_json::json;

use repair_router::{
    BatchStrategy, Coordinates, CrewType, InMemoryStore, MaintenancePoint, PlannerConfig, RouteReport, RouteRequest,
    Scorer, create_work_batches, init_tracing, load_points, plan_route, schedule_crews,
};

fn cli() -> Command {
    Command::new("plan-routes")
        .about("Plans maintenance crew routes from a JSON point file")
        .arg_required_else_help(true)
        .arg(
            arg!(--"log-level" [LEVEL] "Default log level when RUST_LOG is unset")
                .global(true)
                .default_value("info"),
        )
        .arg(
            arg!(--config [FILE] "Planner configuration json")
                .global(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .subcommand(
            Command::new("route")
                .about("Optimizes the route of one crew type")
                .arg(arg!(--points <FILE> "Point file (json array)").value_parser(value_parser!(PathBuf)))
                .arg(arg!(--crew <CREW> "Crew type, e.g. asfalto").value_parser(value_parser!(CrewType)))
                .arg(arg!(--hours [HOURS] "Shift length in hours").value_parser(value_parser!(u32)))
                .arg(arg!(--start [LAT_LON] "Start location as LAT,LON").allow_hyphen_values(true))
                .arg(arg!(--ids [IDS] "Comma separated point ids to route instead of all open points")),
        )
        .subcommand(
            Command::new("balance")
                .about("Distributes points across crews")
                .arg(arg!(--points <FILE> "Point file (json array)").value_parser(value_parser!(PathBuf)))
                .arg(arg!(--crews <CREWS> "Crew counts, e.g. asfalto=2,eletrica=1"))
                .arg(arg!(--hours [HOURS] "Shift length in hours").value_parser(value_parser!(u32))),
        )
        .subcommand(
            Command::new("batches")
                .about("Splits points into work batches")
                .arg(arg!(--points <FILE> "Point file (json array)").value_parser(value_parser!(PathBuf)))
                .arg(
                    arg!(--strategy [STRATEGY] "priority, geographic or mixed")
                        .default_value("mixed")
                        .value_parser(value_parser!(BatchStrategy)),
                )
                .arg(
                    arg!(--size [SIZE] "Points per batch")
                        .default_value("10")
                        .value_parser(value_parser!(usize)),
                ),
        )
}

fn main() -> Result<()> {
    let matches = cli().get_matches();

    let level = matches
        .get_one::<String>("log-level")
        .map(String::as_str)
        .unwrap_or("info");
    init_tracing(level)?;

    let config = match matches.get_one::<PathBuf>("config") {
        Some(path) => PlannerConfig::from_path(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => PlannerConfig::default(),
    };

    let output = match matches.subcommand() {
        Some(("route", sub)) => route(sub, config)?,
        Some(("balance", sub)) => balance(sub, config)?,
        Some(("batches", sub)) => batches(sub)?,
        _ => bail!("invalid subcommand"),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn points_arg(sub: &ArgMatches) -> Result<Vec<MaintenancePoint>> {
    let path = sub
        .get_one::<PathBuf>("points")
        .ok_or_else(|| anyhow!("--points is required"))?;
    load_points(path).with_context(|| format!("loading points from {}", path.display()))
}

fn route(sub: &ArgMatches, config: PlannerConfig) -> Result<serde_json::Value> {
    let crew = *sub
        .get_one::<CrewType>("crew")
        .ok_or_else(|| anyhow!("--crew is required"))?;

    let mut request = RouteRequest::new(crew);
    request.max_hours = sub
        .get_one::<u32>("hours")
        .copied()
        .unwrap_or(config.optimize.max_hours);
    if let Some(start) = sub.get_one::<String>("start") {
        request = request.starting_at(parse_start(start)?);
    }
    if let Some(ids) = sub.get_one::<String>("ids") {
        request = request.with_point_ids(ids.split(',').map(str::trim).filter(|s| !s.is_empty()));
    }

    let store = InMemoryStore::from_points(points_arg(sub)?)?;
    let result = plan_route(&store, &request, &config.optimize)?;
    let report = RouteReport::from_result(&result, &config.report, request.max_hours);
    Ok(serde_json::to_value(report)?)
}

fn balance(sub: &ArgMatches, config: PlannerConfig) -> Result<serde_json::Value> {
    let mut options = config.balance;
    if let Some(crews) = sub.get_one::<String>("crews") {
        options.crews = parse_crews(crews)?;
    }
    if let Some(&hours) = sub.get_one::<u32>("hours") {
        options.work_hours = hours;
    }

    let points = points_arg(sub)?;
    let scorer = Scorer::new(config.weights);
    let schedule = schedule_crews(&points, &scorer, Utc::now(), &options)?;

    let crews: BTreeMap<String, Vec<Vec<Option<String>>>> = schedule
        .into_iter()
        .map(|(crew_type, crews)| {
            let ids: Vec<Vec<Option<String>>> = crews
                .into_iter()
                .map(|crew| crew.into_iter().map(|p| p.id).collect())
                .collect();
            (crew_type.to_string(), ids)
        })
        .collect();
    Ok(json!({ "crews": crews }))
}

fn batches(sub: &ArgMatches) -> Result<serde_json::Value> {
    let strategy = sub
        .get_one::<BatchStrategy>("strategy")
        .copied()
        .unwrap_or_default();
    let size = sub.get_one::<usize>("size").copied().unwrap_or(10);

    let batches = create_work_batches(&points_arg(sub)?, size, strategy)?;
    let ids: Vec<Vec<Option<String>>> = batches
        .into_iter()
        .map(|batch| batch.into_iter().map(|p| p.id).collect())
        .collect();
    Ok(json!({ "strategy": strategy.to_string(), "batches": ids }))
}

fn parse_start(text: &str) -> Result<Coordinates> {
    let (lat, lng) = text
        .split_once(',')
        .ok_or_else(|| anyhow!("start must be LAT,LON, got '{text}'"))?;
    let start = Coordinates::new(lat.trim().parse()?, lng.trim().parse()?);
    if !start.is_valid() {
        bail!("start coordinates out of range: {text}");
    }
    Ok(start)
}

fn parse_crews(text: &str) -> Result<BTreeMap<CrewType, usize>> {
    text.split(',')
        .filter(|part| !part.trim().is_empty())
        .map(|part| -> Result<(CrewType, usize)> {
            let (crew, count) = part
                .split_once('=')
                .ok_or_else(|| anyhow!("crew entry must be TYPE=COUNT, got '{part}'"))?;
            Ok((crew.parse::<CrewType>()?, count.trim().parse::<usize>()?))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        cli().debug_assert();
    }

    #[test]
    fn parses_crew_counts() {
        let crews = parse_crews("asfalto=2, eletrica=1").unwrap();
        assert_eq!(crews[&CrewType::Asphalt], 2);
        assert_eq!(crews[&CrewType::Electrical], 1);
        assert!(parse_crews("asfalto").is_err());
        assert!(parse_crews("pintura=1").is_err());
    }

    #[test]
    fn parses_start_location() {
        let start = parse_start("-10.9111, -37.0717").unwrap();
        assert_eq!(start, Coordinates::new(-10.9111, -37.0717));
        assert!(parse_start("-10.9").is_err());
        assert!(parse_start("100,0").is_err());
    }
}
