use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use anyhow::{bail, Context};
use structopt::StructOpt;
use grib2decode::config::{Config, Mode};
use grib2decode::output::{self, Cut, Extraction, OutputOptions, MAX_POINTS};

#[macro_use] extern crate log;

#[derive(Debug, StructOpt)]
#[structopt(about = "Extracts fields of a GRIB2 file as CSV grids")]
struct Cli {
    /// GRIB2 file
    #[structopt(parse(from_os_str))]
    file: PathBuf,

    /// config file
    #[structopt(long = "config", short = "c", parse(from_os_str))]
    config_file: Option<PathBuf>,

    /// directory receiving the CSV files
    #[structopt(long, parse(from_os_str))]
    out_dir: Option<PathBuf>,

    /// prefix of the CSV file names
    #[structopt(long)]
    out_name: Option<String>,

    /// product kind: auto, weather, guidance or tide
    #[structopt(long)]
    mode: Option<Mode>,

    /// parameter category to extract
    #[structopt(long)]
    category: Option<u8>,

    /// parameter number to extract
    #[structopt(long)]
    number: Option<u8>,

    /// cut-out window, 1-based: X1 Y1 X2 Y2
    #[structopt(long, number_of_values = 4, conflicts_with = "point")]
    window: Option<Vec<usize>>,

    /// grid point to pick, 1-based: X Y (repeatable)
    #[structopt(long, number_of_values = 2)]
    point: Vec<usize>,
}

fn cut(args: &Cli) -> anyhow::Result<Cut> {
  if let Some(window) = &args.window {
    return Ok(Cut::Window { x1: window[0], y1: window[1], x2: window[2], y2: window[3] });
  }

  if args.point.is_empty() {
    return Ok(Cut::All);
  }

  let points: Vec<(usize, usize)> = args.point.chunks(2).map(|xy| (xy[0], xy[1])).collect();
  if points.len() > MAX_POINTS {
    bail!("At most {} points can be picked, got {}", MAX_POINTS, points.len());
  }
  Ok(Cut::Points(points))
}

fn run(args: Cli) -> anyhow::Result<()> {
  let mut config = Config::load(args.config_file.as_deref())
    .with_context(|| format!("Loading config {:?}", args.config_file))?;
  config.mode = args.mode.unwrap_or(config.mode);
  config.category = args.category.or(config.category);
  config.number = args.number.or(config.number);

  let mode = config.mode_for(&args.file);
  info!("{:?} mode", mode);

  let extraction = Extraction {
    out_dir: args.out_dir.clone().unwrap_or_else(|| config.out_dir.clone().into()),
    out_name: args.out_name.clone().unwrap_or_else(|| config.out_name.clone()),
    target: config.target(mode),
    options: OutputOptions {
      fill_value: config.fill_value(mode),
      cut: cut(&args)?,
    },
  };

  let file = File::open(&args.file).with_context(|| format!("grib2 file {:?} open error", args.file))?;
  let written = output::extract(BufReader::new(file), &extraction)
    .with_context(|| format!("Decoding {:?}", args.file))?;

  info!("{} file(s) written", written.len());
  Ok(())
}

fn main() {

  std::env::var("RUST_LOG").map_err(|_| {
      std::env::set_var("RUST_LOG", "error,grib2decode=info");
  }).unwrap_or_default();
  env_logger::init();

  let args = Cli::from_args();

  if let Err(e) = run(args) {
    error!("{:?}", e);
    std::process::exit(1);
  }
}
