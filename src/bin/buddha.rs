extern crate clap;
extern crate env_logger;
#[macro_use]
extern crate log;
extern crate num;
extern crate num_cpus;
extern crate orbitbrot;

use clap::{App, Arg, ArgMatches};
use num::Complex;
use orbitbrot::config::{EscapePolicy, RenderConfig, Schedule};
use orbitbrot::formula::{self, Formula};
use orbitbrot::output::{epoch_seconds, FileSink, Format, ImageSink, RoundPaths};
use orbitbrot::planes::PlaneWindow;
use orbitbrot::tonemap::{BitDepth, Curve, Raster, ToneMapper};
use orbitbrot::{render_schedule, RenderError, RenderResult};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::{Duration, Instant};

fn parse_pair<T>(s: &str, separator: char) -> Option<(T, T)>
where
    T: FromStr,
{
    match s.find(separator) {
        None => None,
        Some(index) => match (T::from_str(&s[..index]), T::from_str(&s[index + 1..])) {
            (Ok(l), Ok(r)) => Some((l, r)),
            _ => None,
        },
    }
}

fn parse_complex(s: &str) -> Option<Complex<f64>> {
    match parse_pair(s, ',') {
        Some((re, im)) => Some(Complex { re, im }),
        None => None,
    }
}

fn validate_pair<T: FromStr>(s: &str, separator: char, err: &str) -> Result<(), String> {
    match parse_pair::<T>(s, separator) {
        Some(_) => Ok(()),
        None => Err(err.to_string()),
    }
}

fn validate_range<T: FromStr + Ord>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

fn validate_float(s: &str, allow_zero: bool, err: &str) -> Result<(), String> {
    match f64::from_str(s) {
        Ok(v) if v.is_finite() && (v > 0.0 || (allow_zero && v == 0.0)) => Ok(()),
        _ => Err(err.to_string()),
    }
}

const OUTPUT: &str = "output";
const SIZE: &str = "size";
const LEFTLOWER: &str = "leftlower";
const RIGHTUPPER: &str = "rightupper";
const FORMULA: &str = "formula";
const POWERS: &str = "powers";
const ITERATIONS: &str = "iterations";
const THREADS: &str = "threads";
const DELTA: &str = "delta";
const BAILOUT: &str = "bailout";
const TOLERANCE: &str = "tolerance";
const HISTORY: &str = "history";
const SEED: &str = "seed";
const GAMMA: &str = "gamma";
const CURVE: &str = "curve";
const DEPTH: &str = "depth";
const CUTOFF: &str = "cutoff";
const FORMAT: &str = "format";
const RAW: &str = "raw";
const FIX_ORIGIN: &str = "fix-origin";
const RECORD_ESCAPE: &str = "record-escape";

fn args<'a>() -> ArgMatches<'a> {
    let max_threads = num_cpus::get();
    let formulas = formula::names();

    App::new("buddha")
        .version("0.3.0")
        .author("Elf M. Sternberg <elf.sternberg@gmail.com>")
        .about("Buddhabrot-family renderer")
        .arg(
            Arg::with_name(OUTPUT)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .default_value("out")
                .help("Output directory; images go in a subdirectory named after the formula"),
        )
        .arg(
            Arg::with_name(SIZE)
                .long(SIZE)
                .short("s")
                .takes_value(true)
                .default_value("2160x2160")
                .validator(|s| validate_pair::<u16>(&s, 'x', "Could not parse output image size"))
                .help("Size of output image"),
        )
        .arg(
            Arg::with_name(LEFTLOWER)
                .long(LEFTLOWER)
                .short("l")
                .takes_value(true)
                .default_value("-7,-5")
                .allow_hyphen_values(true)
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse left lower corner"))
                .help("Left lower corner of the complex plane window"),
        )
        .arg(
            Arg::with_name(RIGHTUPPER)
                .long(RIGHTUPPER)
                .short("r")
                .takes_value(true)
                .default_value("3,5")
                .allow_hyphen_values(true)
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse right upper corner"))
                .help("Right upper corner of the complex plane window"),
        )
        .arg(
            Arg::with_name(FORMULA)
                .long(FORMULA)
                .short("f")
                .takes_value(true)
                .default_value("tanh")
                .possible_values(&formulas)
                .help("Escape map to iterate"),
        )
        .arg(
            Arg::with_name(POWERS)
                .long(POWERS)
                .short("p")
                .takes_value(true)
                .default_value("4,13")
                .validator(|s| validate_pair::<u32>(&s, ',', "Could not parse power range"))
                .help("Render one round per iteration budget 2^LO through 2^HI"),
        )
        .arg(
            Arg::with_name(ITERATIONS)
                .long(ITERATIONS)
                .short("i")
                .takes_value(true)
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        10_000_000,
                        "Could not parse iteration count",
                        "Iteration count must be between 1 and 10000000",
                    )
                })
                .help("Render a single round with this iteration budget instead of --powers"),
        )
        .arg(
            Arg::with_name(THREADS)
                .long(THREADS)
                .short("t")
                .takes_value(true)
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        max_threads,
                        "Could not parse thread count",
                        &format!("Thread count must be between 1 and {}", max_threads),
                    )
                })
                .help("Number of threads to use in solver (default: all cores)"),
        )
        .arg(
            Arg::with_name(DELTA)
                .long(DELTA)
                .short("d")
                .takes_value(true)
                .default_value("0.125")
                .validator(|s| validate_float(&s, false, "Sample step must be a positive number"))
                .help("Distance between samples in pixels; smaller is slower and less noisy"),
        )
        .arg(
            Arg::with_name(BAILOUT)
                .long(BAILOUT)
                .short("b")
                .takes_value(true)
                .default_value("1024")
                .validator(|s| validate_float(&s, false, "Bailout must be a positive number"))
                .help("Squared magnitude past which an orbit has escaped"),
        )
        .arg(
            Arg::with_name(TOLERANCE)
                .long(TOLERANCE)
                .takes_value(true)
                .default_value("1e-20")
                .validator(|s| validate_float(&s, true, "Tolerance must not be negative"))
                .help("Squared distance under which two iterates are the same point"),
        )
        .arg(
            Arg::with_name(HISTORY)
                .long(HISTORY)
                .takes_value(true)
                .default_value("4")
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        1024,
                        "Could not parse history depth",
                        "History depth must be between 1 and 1024",
                    )
                })
                .help("How many previous iterates are checked for cycles"),
        )
        .arg(
            Arg::with_name(SEED)
                .long(SEED)
                .takes_value(true)
                .default_value("0")
                .validator(|s| {
                    u64::from_str(&s)
                        .map(|_| ())
                        .map_err(|_| "Could not parse seed".to_string())
                })
                .help("Seed basis; worker n jitters its grid with seed + n"),
        )
        .arg(
            Arg::with_name(GAMMA)
                .long(GAMMA)
                .short("g")
                .takes_value(true)
                .default_value("0.5")
                .validator(|s| validate_float(&s, false, "Gamma must be a positive number"))
                .help("Exponent applied to normalised counts"),
        )
        .arg(
            Arg::with_name(CURVE)
                .long(CURVE)
                .takes_value(true)
                .default_value("linear")
                .possible_values(&["linear", "log"])
                .help("Normalisation of counts before the exponent"),
        )
        .arg(
            Arg::with_name(DEPTH)
                .long(DEPTH)
                .takes_value(true)
                .default_value("8")
                .possible_values(&["8", "16"])
                .help("Bits per output sample"),
        )
        .arg(
            Arg::with_name(CUTOFF)
                .long(CUTOFF)
                .takes_value(true)
                .default_value("0")
                .validator(|s| validate_float(&s, true, "Cutoff must not be negative"))
                .help("Counts below this fraction of the largest count are drawn black"),
        )
        .arg(
            Arg::with_name(FORMAT)
                .long(FORMAT)
                .takes_value(true)
                .default_value("png")
                .possible_values(&["png", "pgm"])
                .help("Image format of the tone-mapped output"),
        )
        .arg(
            Arg::with_name(RAW)
                .long(RAW)
                .help("Also write the raw visit counts as a 16-bit image"),
        )
        .arg(
            Arg::with_name(FIX_ORIGIN)
                .long(FIX_ORIGIN)
                .help("Copy the count of the second pixel over the first"),
        )
        .arg(
            Arg::with_name(RECORD_ESCAPE)
                .long(RECORD_ESCAPE)
                .help("Also plot the iterate that crossed the bailout"),
        )
        .get_matches()
}

/// Everything a run needs, parsed out of the command line.
struct Settings {
    config: RenderConfig,
    formula: &'static Formula,
    schedule: Schedule,
    tone: ToneMapper,
    format: Format,
    output: PathBuf,
    raw: bool,
    fix_origin: bool,
}

// Clap has already validated everything, so these only fail on a bug.
fn value<T: FromStr>(matches: &ArgMatches, name: &'static str) -> Result<T, RenderError> {
    matches
        .value_of(name)
        .and_then(|s| T::from_str(s).ok())
        .ok_or_else(|| RenderError::InvalidParameter {
            name,
            reason: "could not be parsed".to_string(),
        })
}

fn pair<T: FromStr>(matches: &ArgMatches, name: &'static str, sep: char) -> Result<(T, T), RenderError> {
    matches
        .value_of(name)
        .and_then(|s| parse_pair(s, sep))
        .ok_or_else(|| RenderError::InvalidParameter {
            name,
            reason: "could not be parsed".to_string(),
        })
}

fn corner(matches: &ArgMatches, name: &'static str) -> Result<Complex<f64>, RenderError> {
    matches
        .value_of(name)
        .and_then(parse_complex)
        .ok_or_else(|| RenderError::InvalidParameter {
            name,
            reason: "could not be parsed".to_string(),
        })
}

fn settings(matches: &ArgMatches) -> Result<Settings, RenderError> {
    let (width, height): (usize, usize) = pair(matches, SIZE, 'x')?;
    let window = PlaneWindow::from_corners(corner(matches, LEFTLOWER)?, corner(matches, RIGHTUPPER)?);
    let formula = Formula::lookup(matches.value_of(FORMULA).unwrap_or("tanh"))?;

    let schedule = if matches.is_present(ITERATIONS) {
        Schedule::explicit(vec![value(matches, ITERATIONS)?])?
    } else {
        let (low, high) = pair(matches, POWERS, ',')?;
        Schedule::powers_of_two(low, high)?
    };

    let threads = if matches.is_present(THREADS) {
        value(matches, THREADS)?
    } else {
        num_cpus::get()
    };

    let config = RenderConfig {
        width,
        height,
        window,
        max_iterations: schedule.budgets()[0],
        step: value(matches, DELTA)?,
        bailout: value(matches, BAILOUT)?,
        tolerance: value(matches, TOLERANCE)?,
        history: value(matches, HISTORY)?,
        threads,
        seed: value(matches, SEED)?,
        escape_policy: if matches.is_present(RECORD_ESCAPE) {
            EscapePolicy::Include
        } else {
            EscapePolicy::Omit
        },
    };
    config.validate()?;

    let curve = match matches.value_of(CURVE) {
        Some("log") => Curve::Log,
        _ => Curve::Linear,
    };
    let depth = match matches.value_of(DEPTH) {
        Some("16") => BitDepth::Sixteen,
        _ => BitDepth::Eight,
    };
    let tone = ToneMapper::new(curve, value(matches, GAMMA)?, depth, value(matches, CUTOFF)?)?;
    let format = Format::from_extension(matches.value_of(FORMAT).unwrap_or("png"))?;

    Ok(Settings {
        config,
        formula,
        schedule,
        tone,
        format,
        output: PathBuf::from(matches.value_of(OUTPUT).unwrap_or("out")),
        raw: matches.is_present(RAW),
        fix_origin: matches.is_present(FIX_ORIGIN),
    })
}

/// Formats a duration as `[Nd ][Nh ][Nm ]S.mmms`, leaving off leading
/// units that are zero.
fn format_duration(duration: Duration) -> String {
    let millis = duration.as_secs() * 1000 + u64::from(duration.subsec_millis());
    let days = millis / 86_400_000;
    let hours = (millis / 3_600_000) % 24;
    let minutes = (millis / 60_000) % 60;
    let seconds = (millis / 1000) % 60;
    let mils = millis % 1000;

    let mut result = String::new();
    let mut shown = false;
    if days != 0 {
        result.push_str(&format!("{}d ", days));
        shown = true;
    }
    if hours != 0 || shown {
        result.push_str(&format!("{}h ", hours));
        shown = true;
    }
    if minutes != 0 || shown {
        result.push_str(&format!("{}m ", minutes));
    }
    result.push_str(&format!("{}.{:03}s", seconds, mils));
    result
}

fn write_round(settings: &Settings, sink: &dyn ImageSink, mut result: RenderResult) -> Result<(), RenderError> {
    let budget = result.config.max_iterations;
    let totals = result.totals();
    info!(
        "Completed {} [{}] in {}: {} samples, {} escaped, {} visits",
        settings.formula.name,
        budget,
        format_duration(result.elapsed),
        totals.samples,
        totals.escaped,
        totals.visits
    );

    if settings.fix_origin {
        result.histogram.copy_origin_from_neighbor();
    }

    let paths = RoundPaths::new(
        &settings.output,
        settings.formula.name,
        budget,
        epoch_seconds(),
        settings.format,
    );
    paths.create_dir()?;

    if settings.raw {
        sink.write(&Raster::raw_counts(&result.histogram), &paths.raw)?;
        info!("Wrote {}", paths.raw.display());
    }

    sink.write(&settings.tone.map(&result.histogram), &paths.image)?;
    info!("Wrote {}", paths.image.display());
    Ok(())
}

fn run(matches: &ArgMatches) -> Result<(), RenderError> {
    let settings = settings(matches)?;
    let sink = FileSink;
    let started = Instant::now();

    info!(
        "Rendering started: {} at {}x{}, {} rounds, {} threads",
        settings.formula.name,
        settings.config.width,
        settings.config.height,
        settings.schedule.len(),
        settings.config.threads
    );

    render_schedule(
        &settings.config,
        settings.formula,
        &settings.schedule,
        |result| write_round(&settings, &sink, result),
    )?;

    info!(
        "Rendering into {} took {}",
        settings.output.display(),
        format_duration(started.elapsed())
    );
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = args();
    if let Err(e) = run(&matches) {
        eprintln!("Render failure: {}", e);
        std::process::exit(1);
    }
}
