use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use stencil::{GenerateError, GeneratorBuilder, PaginationMode, inputs_from_json};

/// Generate a PDF from a JSON template and a JSON array of input records.
#[derive(Parser, Debug)]
#[command(name = "stencil", version, about)]
struct Args {
    /// Template JSON (`{ basePdf, schemas }`).
    #[arg(short, long)]
    template: PathBuf,

    /// Input records: a JSON array of objects keyed by schema name.
    #[arg(short, long)]
    inputs: PathBuf,

    /// Where to write the PDF.
    #[arg(short, long, default_value = "out.pdf")]
    output: PathBuf,

    /// Register a TrueType font, as `Name=path/to/font.ttf`. Repeatable.
    #[arg(long = "font", value_name = "NAME=PATH")]
    fonts: Vec<String>,

    /// Keep schemas where the template puts them, even when tables grow.
    #[arg(long)]
    no_paginate: bool,

    /// Only validate the template and inputs and print the report.
    #[arg(long)]
    check: bool,

    #[arg(long)]
    title: Option<String>,

    #[arg(long)]
    author: Option<String>,
}

fn run(args: Args) -> Result<bool, GenerateError> {
    let mut builder = GeneratorBuilder::new().with_template_file(&args.template)?;
    for font in &args.fonts {
        let (name, path) = font.split_once('=').ok_or_else(|| {
            GenerateError::Config(format!("--font expects NAME=PATH, got '{font}'"))
        })?;
        log::info!("Loading font '{}' from {}", name, path);
        builder = builder.with_font(name, fs::read(path)?)?;
    }
    if args.no_paginate {
        builder = builder.with_pagination(PaginationMode::Off);
    }
    let generator = builder
        .with_title(args.title.clone())
        .with_author(args.author.clone())
        .build()?;

    let inputs = inputs_from_json(&fs::read_to_string(&args.inputs)?)?;

    if args.check {
        let report = generator.validate(&inputs);
        if report.is_empty() {
            println!("No problems found.");
        } else {
            println!("{report}");
        }
        return Ok(!report.has_errors());
    }

    generator.generate_to_file(&inputs, &args.output)?;
    println!("Successfully generated {}", args.output.display());
    Ok(true)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Args::parse()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
