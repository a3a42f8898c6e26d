use std::io::Read;
use std::process::ExitCode;

use kleene::prelude::*;
use kleene::show_duration;

use tracing::{debug, error, info, trace};
use tracing_subscriber::{filter, prelude::*};

use clap::{Arg, ArgMatches, Command};
use thiserror::Error;

fn automaton_arg(name: &'static str) -> Arg {
    Arg::new(name).help("file containing a JSON automaton record, stdin if omitted")
}

fn unary(name: &'static str, about: &'static str) -> Command {
    Command::new(name).about(about).arg(automaton_arg("input"))
}

fn binary(name: &'static str, about: &'static str) -> Command {
    Command::new(name)
        .about(about)
        .arg(Arg::new("left").required(true))
        .arg(Arg::new("right").required(true))
}

fn cli() -> Command {
    Command::new("kleene")
        .about("Finite automata and regular expressions")
        .subcommand_required(true)
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbosity")
                .num_args(0..=1)
                .require_equals(true)
                .value_parser(["info", "debug", "trace"])
                .default_missing_value("info")
                .global(true),
        )
        .arg(
            Arg::new("format")
                .short('f')
                .long("format")
                .value_parser(["json", "table", "dot", "png"])
                .default_value("json")
                .global(true),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .help("file the png image is written to")
                .global(true),
        )
        .subcommand(
            Command::new("thompson")
                .about("builds the Thompson automaton of a regular expression")
                .arg(Arg::new("regex").required(true)),
        )
        .subcommand(
            Command::new("glushkov")
                .about("builds the position automaton of a regular expression")
                .arg(Arg::new("regex").required(true)),
        )
        .subcommand(unary("determinize", "subset construction"))
        .subcommand(unary("complete", "adds a sink state where transitions are missing"))
        .subcommand(unary("prune", "removes states that are not useful"))
        .subcommand(unary("minimize", "computes the minimal complete DFA"))
        .subcommand(unary("canonical", "computes the canonical DFA"))
        .subcommand(unary("remove-epsilon", "eliminates epsilon transitions"))
        .subcommand(unary("add-epsilon", "splits every symbol transition by an epsilon step"))
        .subcommand(unary("complement", "accepts exactly the rejected words"))
        .subcommand(unary("star", "Kleene star of the accepted language"))
        .subcommand(unary("to-regex", "regular expression by state elimination"))
        .subcommand(unary("analyze", "prints structural properties"))
        .subcommand(binary("union", "accepts the words of either automaton"))
        .subcommand(binary("concat", "concatenation of the accepted languages"))
        .subcommand(binary("intersection", "accepts the words of both automata"))
        .subcommand(
            Command::new("solve")
                .about("solves a system of language equations")
                .arg(Arg::new("input").help("file containing the equations, stdin if omitted")),
        )
}

fn setup_logging(matches: &ArgMatches) {
    let level = match matches
        .try_get_one::<String>("verbosity")
        .ok()
        .flatten()
        .map(|m| m.as_str())
    {
        Some("trace") => filter::LevelFilter::TRACE,
        Some("debug") => filter::LevelFilter::DEBUG,
        Some("info") => filter::LevelFilter::INFO,
        _ => filter::LevelFilter::WARN,
    };

    let stderr_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(stderr_log.with_filter(level))
        .init();

    trace!("setup {level} logging");
}

/// Everything that can go wrong in the driver.
#[derive(Debug, Error)]
enum CliError {
    #[error("could not read input: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Record(#[from] RecordError),
    #[error("malformed expression: {0}")]
    Regex(#[from] RegexParseError),
    #[error("malformed equation system: {0}")]
    Equation(#[from] EquationError),
    #[error("could not write output: {0}")]
    Json(#[from] serde_json::Error),
    #[error("could not render image: {0}")]
    Render(std::io::Error),
    #[error("the png format needs an --output file")]
    MissingOutput,
}

fn read_input(path: Option<&String>) -> Result<String, CliError> {
    match path {
        Some(path) => {
            debug!("reading {path}");
            Ok(std::fs::read_to_string(path)?)
        }
        None => {
            debug!("reading from stdin");
            let mut buf = String::new();
            std::io::stdin().lock().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

fn read_automaton(matches: &ArgMatches, name: &str) -> Result<Automaton, CliError> {
    let aut = Automaton::from_json(&read_input(matches.get_one::<String>(name))?)?;
    debug!("read automaton with {} states", aut.size());
    Ok(aut)
}

fn render(aut: &Automaton, format: &str, output: Option<&String>) -> Result<String, CliError> {
    Ok(match format {
        "table" => aut.build_transition_table(),
        "dot" => aut.dot_representation(),
        "png" => {
            let path = output.ok_or(CliError::MissingOutput)?;
            aut.render_to_file_name(path).map_err(CliError::Render)?;
            info!("wrote {} states to {path}", aut.size());
            format!("wrote {path}")
        }
        _ => aut.to_json()?,
    })
}

fn analyze(aut: &Automaton) -> String {
    let closures = aut.epsilon_closures();
    let closures: Vec<String> = closures
        .iter()
        .map(|(q, closure)| {
            let closure: OrderedSet<State> = closure.iter().map(|p| (*p).clone()).collect();
            format!("  {q}: {}", closure.show())
        })
        .collect();
    let accessible: OrderedSet<State> = aut.accessible_states().into_iter().cloned().collect();
    let useful: OrderedSet<State> = aut.useful_states().into_iter().cloned().collect();
    [
        format!("states: {}", aut.size()),
        format!("deterministic: {}", aut.is_deterministic()),
        format!("complete: {}", aut.is_complete()),
        format!("epsilon transitions: {}", aut.has_epsilon_transitions()),
        format!("pruned: {}", aut.is_pruned()),
        format!("minimal: {}", aut.is_minimal()),
        format!("canonical: {}", aut.is_canonical()),
        format!("empty language: {}", aut.is_empty_language()),
        format!("accessible: {}", accessible.show()),
        format!("useful: {}", useful.show()),
        "epsilon closures:".to_string(),
    ]
    .into_iter()
    .chain(closures)
    .collect::<Vec<_>>()
    .join("\n")
}

fn run(matches: &ArgMatches) -> Result<String, CliError> {
    let format = matches
        .get_one::<String>("format")
        .map(|f| f.as_str())
        .unwrap_or("json");
    let output = matches.get_one::<String>("output");
    let start = std::time::Instant::now();

    let out = match matches.subcommand() {
        Some(("thompson", sub)) | Some(("glushkov", sub)) => {
            let input = sub.get_one::<String>("regex").map(String::as_str).unwrap_or_default();
            let regex = kleene::regex::parse(input)?;
            let aut = match matches.subcommand_name() {
                Some("thompson") => regex.thompson(),
                _ => regex.glushkov(),
            };
            render(&aut, format, output)?
        }
        Some(("to-regex", sub)) => read_automaton(sub, "input")?.to_regex().to_string(),
        Some(("analyze", sub)) => analyze(&read_automaton(sub, "input")?),
        Some(("solve", sub)) => {
            let system = EquationSystem::parse(&read_input(sub.get_one::<String>("input"))?)?;
            system.solve()?.to_string()
        }
        Some((op @ ("union" | "concat" | "intersection"), sub)) => {
            let left = read_automaton(sub, "left")?;
            let right = read_automaton(sub, "right")?;
            let aut = match op {
                "union" => left.union(&right),
                "concat" => left.concatenate(&right),
                _ => left.intersection(&right),
            };
            render(&aut, format, output)?
        }
        Some((op, sub)) => {
            let aut = read_automaton(sub, "input")?;
            let aut = match op {
                "determinize" => aut.determinize(),
                "complete" => aut.complete(),
                "prune" => aut.prune(),
                "minimize" => aut.minimize(),
                "canonical" => aut.canonicalize(),
                "remove-epsilon" => aut.remove_epsilon(),
                "add-epsilon" => aut.add_epsilon(),
                "complement" => aut.complement(),
                "star" => aut.star(),
                other => unreachable!("unknown subcommand {other}"),
            };
            render(&aut, format, output)?
        }
        None => unreachable!("a subcommand is required"),
    };

    info!("computation took {}", show_duration(start.elapsed()));
    Ok(out)
}

pub fn main() -> ExitCode {
    let matches = cli().get_matches();

    setup_logging(&matches);

    match run(&matches) {
        Ok(out) => {
            println!("{out}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
