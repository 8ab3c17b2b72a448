use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context};
use clap::Parser;
use crop_advisor::{ArtifactStore, CropLabel, Feature, FeatureVector, ModelContext};
use log::{info, warn};

/// Recommends the crop best suited to the given soil and climate readings.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Nitrogen (N) ratio, 0-100
    #[arg(short = 'N', long = "n", visible_alias = "nitrogen", default_value_t = Feature::Nitrogen.default_value())]
    nitrogen: f64,

    /// Phosphorous (P) ratio, 0-100
    #[arg(short = 'P', long = "p", visible_alias = "phosphorous", default_value_t = Feature::Phosphorous.default_value())]
    phosphorous: f64,

    /// Potassium (K) ratio, 0-100
    #[arg(short = 'K', long = "k", visible_alias = "potassium", default_value_t = Feature::Potassium.default_value())]
    potassium: f64,

    /// Temperature in °C, -10 to 50
    #[arg(short, long, allow_negative_numbers = true, default_value_t = Feature::Temperature.default_value())]
    temperature: f64,

    /// Relative humidity in %, 0-100
    #[arg(short = 'H', long, default_value_t = Feature::Humidity.default_value())]
    humidity: f64,

    /// Soil pH, 0-14
    #[arg(long, default_value_t = Feature::Ph.default_value())]
    ph: f64,

    /// Rainfall in mm, 0-500
    #[arg(short, long, default_value_t = Feature::Rainfall.default_value())]
    rainfall: f64,

    /// Directory holding scaler.json, encoder.json and model_gbc.json
    #[arg(short, long)]
    models_dir: Option<PathBuf>,

    /// Check artifact digests against digests.json before loading
    #[arg(long)]
    verify: bool,
}

impl Args {
    /// Readings clamped to the form ranges, plus every reading that had to be
    /// clamped with its original value.
    fn readings(&self) -> (FeatureVector, Vec<(Feature, f64)>) {
        let raw = FeatureVector::new(
            self.nitrogen,
            self.phosphorous,
            self.potassium,
            self.temperature,
            self.humidity,
            self.ph,
            self.rainfall,
        );
        let clamped = raw
            .out_of_range()
            .into_iter()
            .map(|feature| (feature, raw.get(feature)))
            .collect();
        (raw.clamped(), clamped)
    }
}

/// Fails unless a digest manifest is present and every artifact matches it.
fn verify_store(store: &ArtifactStore) -> anyhow::Result<()> {
    if store.digests().is_none() {
        bail!("--verify needs a digests.json manifest in {}", store.models_dir().display());
    }
    if !store.verify()? {
        bail!("Model artifacts in {} failed verification", store.models_dir().display());
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let store = match &args.models_dir {
        Some(dir) => ArtifactStore::new(dir),
        None => ArtifactStore::new_default(),
    };
    let store = store.with_digest_manifest()?;

    if args.verify {
        verify_store(&store)?;
        info!("Model artifacts verified");
    }

    let context = ModelContext::new(store);
    context
        .preload()
        .with_context(|| format!("Cannot make predictions: model artifacts in {} failed to load", context.describe()))?;

    let (readings, clamped) = args.readings();
    for (feature, value) in clamped {
        let range = feature.range();
        warn!(
            "{} = {} is outside {}..={}, clamping",
            feature,
            value,
            range.start(),
            range.end()
        );
    }

    let start = Instant::now();
    info!("Analyzing conditions: {}", readings);
    let crop = context
        .recommender()?
        .recommend(&readings)
        .context("Recommendation failed")?;
    info!("Recommendation took {:.2?}", start.elapsed());

    print_result(&crop, &readings);
    Ok(())
}

fn print_result(crop: &CropLabel, readings: &FeatureVector) {
    println!();
    println!("Best Crop Recommendation");
    println!("  {}", crop.display_name());
    println!("This crop has the highest suitability for your specified conditions");
    println!();
    println!("Parameters used for analysis:");
    println!("  N: {} | P: {} | K: {} | pH: {}", readings.n, readings.p, readings.k, readings.ph);
    println!(
        "  Temp: {}°C | Hum: {}% | Rain: {}mm",
        readings.temperature, readings.humidity, readings.rainfall
    );
}
