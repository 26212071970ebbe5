use anyhow::{bail, Context};
use eggplot::{
    decode, encode, init_logging, DrawingStats, LayerResolveMode, Pipeline, PlotConfig,
    SvgSegmenter,
};
use std::path::{Path, PathBuf};

const USAGE: &str = "\
Usage:
  eggplot convert <in.svg> [-o <out.txt>] [--layers none|color|inkscape]
  eggplot show <file>

Commands:
  convert   Segment an SVG, run the transform pipeline and write the
            instruction file for the plotter
  show      Decode an instruction file and print a drawing summary

The transform configuration is read from the platform config directory
when present, otherwise defaults are used.";

fn main() -> anyhow::Result<()> {
    init_logging()?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("convert") => convert(&args[1..]),
        Some("show") => show(&args[1..]),
        Some("--help" | "-h") | None => {
            println!("{USAGE}");
            Ok(())
        }
        Some(other) => bail!("unknown command '{other}'\n\n{USAGE}"),
    }
}

fn convert(args: &[String]) -> anyhow::Result<()> {
    let mut input: Option<PathBuf> = None;
    let mut output: Option<PathBuf> = None;
    let mut layers_override: Option<LayerResolveMode> = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-o" | "--output" => {
                let value = iter.next().context("-o requires a file name")?;
                output = Some(PathBuf::from(value));
            }
            "--layers" => {
                let value = iter.next().context("--layers requires a mode")?;
                layers_override = Some(value.parse()?);
            }
            other if input.is_none() => input = Some(PathBuf::from(other)),
            other => bail!("unexpected argument '{other}'\n\n{USAGE}"),
        }
    }
    let input = input.context("convert requires an input SVG file")?;
    let output = output.unwrap_or_else(|| input.with_extension("txt"));

    let mut config = load_config()?;
    if let Some(mode) = layers_override {
        config.layer_resolve_type = mode;
    }

    let svg = std::fs::read_to_string(&input)
        .with_context(|| format!("reading {}", input.display()))?;
    let drawing = SvgSegmenter::segment(&svg, config.layer_resolve_type)
        .with_context(|| format!("importing {}", input.display()))?;

    let (transformed, improvements) =
        Pipeline::apply_with_improvements(&config.pipeline_options(), &drawing.layers);
    let instructions = encode(&transformed);
    std::fs::write(&output, &instructions)
        .with_context(|| format!("writing {}", output.display()))?;

    let stats = DrawingStats::from_layers(&transformed);
    println!(
        "{} -> {}: {} layers, {} segments, {} points",
        input.display(),
        output.display(),
        transformed.len(),
        stats.segment_count,
        stats.point_count,
    );
    println!(
        "pipeline deltas: points {:+.1}%, travel {:+.1}%, segments {:+.1}%",
        improvements.points * 100.0,
        improvements.travel * 100.0,
        improvements.segments * 100.0,
    );
    Ok(())
}

fn show(args: &[String]) -> anyhow::Result<()> {
    let [file] = args else {
        bail!("show requires exactly one instruction file\n\n{USAGE}");
    };
    let path = Path::new(file);
    let text =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let layers = decode(&text);

    println!("{}: {} layers", path.display(), layers.len());
    for layer in &layers {
        let drawn: f64 = layer.segments.iter().map(|s| s.drawn_length()).sum();
        println!(
            "  {:<24} {:>4} segments {:>6} points {:>10.1} drawn",
            layer.description,
            layer.segments.len(),
            layer.point_count(),
            drawn,
        );
    }
    let stats = DrawingStats::from_layers(&layers);
    println!(
        "total: {} segments, {} points, {:.1} pen-up travel",
        stats.segment_count, stats.point_count, stats.travel_distance
    );
    Ok(())
}

fn load_config() -> anyhow::Result<PlotConfig> {
    let path = match PlotConfig::default_path() {
        Ok(path) => path,
        Err(_) => return Ok(PlotConfig::default()),
    };
    if path.exists() {
        Ok(PlotConfig::load_from_file(&path)
            .with_context(|| format!("loading config {}", path.display()))?)
    } else {
        Ok(PlotConfig::default())
    }
}
