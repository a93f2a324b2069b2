use clap::Parser;
use critsel_lib::{parse_stylesheet, Classification, Pattern, ProfileOptions, Result};
use log::info;
use std::fs;

#[derive(Parser)]
#[command(name = "critsel")]
#[command(about = "Classify stylesheet selectors for critical CSS extraction")]
struct Args {
    /// Input CSS file.
    input: String,

    /// Always keep this exact selector (repeatable).
    #[arg(long = "include")]
    include: Vec<String>,

    /// Always drop this exact selector (repeatable).
    #[arg(long = "exclude")]
    exclude: Vec<String>,

    /// Always keep selectors matching `/source/flags` or a bare source (repeatable).
    #[arg(long = "include-regex")]
    include_regex: Vec<String>,

    /// Always drop selectors matching `/source/flags` or a bare source (repeatable).
    #[arg(long = "exclude-regex")]
    exclude_regex: Vec<String>,

    /// Also list force-kept and force-dropped selectors.
    #[arg(long)]
    all: bool,
}

/// Split a `/source/flags` literal; anything else is a bare source.
fn parse_regex_arg(arg: &str) -> Result<Pattern> {
    if let Some(body) = arg.strip_prefix('/') {
        if let Some(end) = body.rfind('/') {
            return Pattern::regexp(&body[..end], &body[end + 1..]);
        }
    }
    Pattern::regexp(arg, "")
}

fn build_patterns(literals: &[String], regexes: &[String]) -> Result<Option<Vec<Pattern>>> {
    let mut patterns: Vec<Pattern> = literals.iter().map(Pattern::literal).collect();
    for arg in regexes {
        patterns.push(parse_regex_arg(arg)?);
    }
    Ok(if patterns.is_empty() { None } else { Some(patterns) })
}

fn run(args: &Args) -> Result<()> {
    let options = ProfileOptions {
        force_include: build_patterns(&args.include, &args.include_regex)?,
        force_exclude: build_patterns(&args.exclude, &args.exclude_regex)?,
    };

    let css = fs::read_to_string(&args.input)?;
    info!("Successfully read {}", args.input);

    let sheet = parse_stylesheet(&css)?;
    let profile = options.profile(&sheet);

    for selector in profile.selectors() {
        println!("{}", selector);
    }

    if args.all {
        for (node, classification) in profile.classifications() {
            match classification {
                Classification::ForceKeep => println!("keep\t{}", sheet.arena.render(node)),
                Classification::ForceDrop => println!("drop\t{}", sheet.arena.render(node)),
                Classification::Testable(_) => {}
            }
        }
    }

    let summary = profile.summary();
    info!(
        "{} selectors to test ({} distinct), {} force kept, {} force dropped",
        summary.testable, summary.distinct, summary.force_kept, summary.force_dropped
    );
    Ok(())
}

fn main() {
    env_logger::init();

    // parse the args given in terminal
    let args: Args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
