extern crate chrono;
extern crate clap;
extern crate fern;
extern crate npystream;
extern crate serde_json;
#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;

mod convert;
mod settings;

use clap::{App, Arg, ArgMatches};
use settings::{key_or_default, key_or_none, Settings};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;
use std::process;

fn main() {
    let matches = get_matches();
    let settings = settings_from_matches(&matches);

    prepare_logger(settings.verbosity, settings.log_file.as_deref());

    let output = Path::new(&settings.output);
    let res = if settings.input == "-" {
        let stdin = io::stdin();
        let lock = stdin.lock();
        convert::run(lock, output, &settings.dtype, settings.delimiter, &settings.labels)
    } else {
        match File::open(&settings.input) {
            Ok(file) => convert::run(
                BufReader::new(file),
                output,
                &settings.dtype,
                settings.delimiter,
                &settings.labels,
            ),
            Err(err) => Err(format!("cannot open {}: {}", settings.input, err).into()),
        }
    };

    match res {
        Ok(summary) => match serde_json::to_string(&summary) {
            Ok(json) => println!("{}", json),
            Err(err) => error!("Error serializing summary: {}", err),
        },
        Err(err) => {
            error!("{}", err);
            process::exit(1);
        }
    }
}

fn settings_from_matches(matches: &ArgMatches) -> Settings {
    let dtype = match matches.value_of("dtype") {
        Some(dtype) => dtype.to_owned(),
        None => key_or_default("NPYCONVERT_DTYPE", "f8"),
    };
    let log_file = matches
        .value_of("log_file")
        .map(str::to_owned)
        .or_else(|| key_or_none("NPYCONVERT_LOG_FILE"));
    let labels = matches
        .value_of("labels")
        .map(|l| l.split(',').map(|s| s.trim().to_owned()).collect())
        .unwrap_or_default();

    Settings {
        input: matches.value_of("input").unwrap_or("-").to_owned(),
        output: matches.value_of("output").unwrap_or("out.npy").to_owned(),
        dtype,
        delimiter: matches.value_of("delimiter").and_then(|d| d.chars().next()),
        labels,
        verbosity: matches.occurrences_of("v") as u8,
        log_file,
    }
}

fn prepare_logger(verbosity: u8, log_file: Option<&str>) {
    let level = match verbosity {
        0 => log::LevelFilter::Error,
        1 => log::LevelFilter::Warn,
        2 => log::LevelFilter::Info,
        3 => log::LevelFilter::Debug,
        _ => log::LevelFilter::max(),
    };

    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S:%f]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(io::stderr());

    if let Some(log_file) = log_file {
        match fern::log_file(log_file) {
            Ok(file) => dispatch = dispatch.chain(file),
            Err(err) => eprintln!("Cannot open log file {}: {}", log_file, err),
        }
    }

    if let Err(err) = dispatch.apply() {
        eprintln!("Cannot install logger: {}", err);
    }
}

fn get_matches<'a>() -> ArgMatches<'a> {
    App::new("npyconvert")
    .version("0.1.0")
    .about("stream delimited numeric text into a .npy file")
    .arg(Arg::with_name("input")
        .value_name("INPUT")
        .help("Text file to read, - for stdin (default -)")
        .index(1))
    .arg(Arg::with_name("output")
        .value_name("OUTPUT")
        .help("Sets the .npy file to create (default out.npy)")
        .index(2))
    .arg(Arg::with_name("dtype")
        .short("t")
        .long("dtype")
        .value_name("DTYPE")
        .help("Sets the value type: i1 i2 i4 i8 u1 u2 u4 u8 f4 f8 (default f8, or $NPYCONVERT_DTYPE)")
        .takes_value(true))
    .arg(Arg::with_name("delimiter")
        .short("d")
        .long("delimiter")
        .value_name("CHAR")
        .help("Sets the column separator (default whitespace)")
        .takes_value(true))
    .arg(Arg::with_name("labels")
        .short("l")
        .long("labels")
        .value_name("LABELS")
        .help("Comma separated column names, writes one f8 record per line")
        .takes_value(true))
    .arg(Arg::with_name("v")
        .short("v")
        .multiple(true)
        .help("Sets the level of verbosity"))
    .arg(Arg::with_name("log_file")
        .long("log_file")
        .value_name("LOG_FILE")
        .help("Sets the log file to write to (or $NPYCONVERT_LOG_FILE)")
        .takes_value(true))
    .get_matches()
}
