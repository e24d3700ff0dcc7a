//! Write a synthetic raw listings CSV and register it in the local
//! artifact store, so `basic-cleaning` has something to fetch.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::{info, warn};

use basic_cleaning::artifact::{ArtifactStore, LocalArtifactStore};

const HEADER: [&str; 16] = [
    "id",
    "name",
    "host_id",
    "host_name",
    "neighbourhood_group",
    "neighbourhood",
    "latitude",
    "longitude",
    "room_type",
    "price",
    "minimum_nights",
    "number_of_reviews",
    "last_review",
    "reviews_per_month",
    "calculated_host_listings_count",
    "availability_365",
];

const BOROUGHS: [(&str, &str, f64, f64); 5] = [
    ("Manhattan", "Midtown", 40.754, -73.984),
    ("Brooklyn", "Williamsburg", 40.714, -73.953),
    ("Queens", "Astoria", 40.764, -73.923),
    ("Bronx", "Mott Haven", 40.809, -73.922),
    ("Staten Island", "St. George", 40.643, -74.077),
];

const ROOM_TYPES: [&str; 3] = ["Entire home/apt", "Private room", "Shared room"];
const HOSTS: [&str; 6] = ["Alice", "Bob", "Carmen", "Dmitri", "Erin", "Farid"];

/// Generate and register a synthetic listings dataset
#[derive(Parser, Debug)]
#[command(name = "seed-artifact", version)]
struct Args {
    /// Artifact name to register the dataset under
    #[arg(long, default_value = "sample.csv")]
    name: String,

    /// Number of listings to generate
    #[arg(long, default_value_t = 200)]
    rows: usize,

    /// Generator seed
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Root directory of the local artifact store
    #[arg(long = "artifact_root", env = "CLEANING_ARTIFACT_ROOT", default_value = "artifacts")]
    artifact_root: PathBuf,
}

/// splitmix64; enough for reproducible fixtures.
struct SplitMix(u64);

impl SplitMix {
    fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform in `[0, 1)`.
    fn unit(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }
}

fn listing(id: usize, rng: &mut SplitMix) -> Vec<String> {
    let (group, hood, lat, lon) = BOROUGHS[rng.below(BOROUGHS.len())];
    let room = ROOM_TYPES[rng.below(ROOM_TYPES.len())];
    let host = rng.below(HOSTS.len());

    // Roughly one listing in ten is an outlier of some kind.
    let (lat, lon) = match rng.below(20) {
        0 => (lat, -74.6),
        1 => (39.9, lon),
        _ => (lat + (rng.unit() - 0.5) * 0.08, lon + (rng.unit() - 0.5) * 0.08),
    };
    let price = match rng.below(20) {
        0 => 0,
        1 => 2_500 + rng.below(7_500),
        _ => 30 + rng.below(320),
    };
    let reviews = rng.below(150);
    let last_review = if reviews == 0 {
        String::new()
    } else {
        format!("2019-{:02}-{:02}", 1 + rng.below(7), 1 + rng.below(28))
    };
    let per_month = if reviews == 0 {
        String::new()
    } else {
        format!("{:.2}", reviews as f64 / 24.0)
    };

    vec![
        (2_539 + id).to_string(),
        format!("{room} in {hood}"),
        (1_000 + host).to_string(),
        HOSTS[host].to_string(),
        group.to_string(),
        hood.to_string(),
        format!("{lat:.5}"),
        format!("{lon:.5}"),
        room.to_string(),
        price.to_string(),
        (1 + rng.below(30)).to_string(),
        reviews.to_string(),
        last_review,
        per_month,
        (1 + rng.below(5)).to_string(),
        rng.below(366).to_string(),
    ]
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let staging = args.artifact_root.join(".staging");
    fs::create_dir_all(&staging)
        .with_context(|| format!("creating {}", staging.display()))?;
    let path = staging.join(&args.name);

    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(HEADER)?;
    let mut rng = SplitMix(args.seed);
    for id in 0..args.rows {
        writer.write_record(listing(id, &mut rng))?;
    }
    writer.flush()?;
    drop(writer);

    let mut store = LocalArtifactStore::new(&args.artifact_root);
    let artifact = store
        .register(&args.name, "raw_data", "Synthetic raw listings", &path)
        .context("registering seed dataset")?;
    if let Err(e) = fs::remove_file(&path) {
        warn!("Could not remove staging file {}: {e}", path.display());
    }

    info!("Wrote {} listings and registered {artifact}", args.rows);
    Ok(())
}
