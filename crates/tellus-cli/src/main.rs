//! Offline planet generator: run the full pipeline from CLI flags, print
//! field statistics, optionally dump the whole result as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use tellus_core::{GenParams, PostParams, Season, Session};

#[derive(Parser, Debug)]
#[command(name = "tellus", about = "Procedural planet geology & climate generator")]
struct Args {
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Target region count for the sphere mesh.
    #[arg(short = 'n', long, default_value_t = 10_000)]
    regions: usize,

    #[arg(short = 'p', long, default_value_t = 24)]
    plates: usize,

    #[arg(short = 'c', long, default_value_t = 5)]
    continents: usize,

    /// Mesh jitter in [0, 1].
    #[arg(long, default_value_t = 0.5)]
    jitter: f64,

    /// Elevation noise amplitude in [0, 1].
    #[arg(long, default_value_t = 0.04)]
    noise: f32,

    /// One strength for all five post-processing passes, in [0, 1].
    #[arg(long, default_value_t = 0.5)]
    erosion: f32,

    /// Write the full result as JSON to this path.
    #[arg(long)]
    json: Option<String>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let params = GenParams {
        seed: args.seed,
        num_regions: args.regions,
        num_plates: args.plates,
        num_continents: args.continents,
        jitter: args.jitter,
        noise_magnitude: args.noise,
        post: PostParams {
            smoothing: args.erosion,
            glacial_erosion: args.erosion,
            hydraulic_erosion: args.erosion,
            thermal_erosion: args.erosion,
            ridge_sharpening: args.erosion,
        },
        toggled_indices: Vec::new(),
    };

    let (session, result) = Session::generate_once(&params).context("generation failed")?;
    let n = session.mesh().num_regions;

    let land = result.r_elevation.iter().filter(|&&e| e >= 0.0).count();
    let peak = result.r_elevation.iter().cloned().fold(f32::MIN, f32::max);
    let trench = result.r_elevation.iter().cloned().fold(f32::MAX, f32::min);
    println!("regions:        {n}");
    println!("plates:         {} ({} ocean)", result.plate_seeds.len(), result
        .plate_is_ocean
        .iter()
        .filter(|&&o| o)
        .count());
    println!("land fraction:  {:.1}%", 100.0 * land as f64 / n as f64);
    println!("elevation:      [{trench:.3}, {peak:.3}]");
    println!("mountain cells: {}", result.mountain_r.iter().filter(|&&m| m).count());

    for season in Season::BOTH {
        let precip = result.climate.precipitation.get(season);
        let temp = result.climate.temperature.get(season);
        let mean = |v: &[f32]| v.iter().sum::<f32>() / v.len() as f32;
        println!(
            "{:6}: precip mean {:.3}, temperature mean {:.3}, itcz mean {:+.1} deg",
            season.label(),
            mean(precip),
            mean(temp),
            mean(result.climate.itcz.get(season)),
        );
    }

    if let Some(path) = args.json {
        let file = std::fs::File::create(&path).with_context(|| format!("creating {path}"))?;
        serde_json::to_writer(std::io::BufWriter::new(file), &result)
            .context("serializing result")?;
        println!("wrote {path}");
    }
    Ok(())
}
