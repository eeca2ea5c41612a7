use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use triple_buffer::TripleBuffer;

use ms_audio::capture::CpalCapture;
use ms_audio::pipeline::{FeaturePipeline, FeatureUpdate};
use ms_audio::pool::BufferPool;
use ms_core::config::EngineConfig;

use crate::analyze::render_features;

/// Capture micro pendant `duration`, affiche la dernière humeur à chaque
/// intervalle puis la moyenne glissante.
///
/// # Errors
/// Returns an error if no input device is usable or the session cannot start.
pub fn run_live(config: EngineConfig, duration: Duration, interval: Duration) -> Result<()> {
    let capture = CpalCapture::open_default()?;
    let pool = Arc::new(BufferPool::new(&config.pool));
    let mut pipeline = FeaturePipeline::new(config, Arc::clone(&pool), Box::new(capture));

    // Analysis thread → main thread, latest value wins.
    let (mut input, mut output) = TripleBuffer::new(&None::<FeatureUpdate>).split();
    pipeline.start(move |update| input.write(Some(update)))?;

    let deadline = Instant::now() + duration;
    while Instant::now() < deadline {
        thread::sleep(interval);
        let fresh = output.updated();
        match *output.read() {
            Some(update) if fresh => println!(
                "{:>6.1} BPM  énergie {:.2}  valence {:.2}  → {}",
                update.features.tempo, update.features.energy, update.features.valence, update.mood
            ),
            Some(_) => log::debug!("Pas de nouvelle fenêtre depuis le dernier affichage"),
            None => log::debug!("En attente de la première fenêtre"),
        }
    }

    let averaged = pipeline.averaged_features();
    let mood = pipeline.averaged_mood();
    let dropped = pipeline.dropped_windows();
    pipeline.stop();

    match (averaged, mood) {
        (Some(avg), Some(mood)) => {
            println!("Moyenne glissante :");
            print!("{}", render_features(&avg));
            println!("  humeur : {mood}");
        }
        _ => println!("Aucune fenêtre analysée."),
    }

    let stats = pool.stats();
    println!(
        "Pool : {} / {} octets, {} allocation(s), réutilisation {:.0} %, {} éviction(s), {dropped} fenêtre(s) abandonnée(s)",
        stats.current_size,
        stats.max_size,
        stats.allocations,
        stats.reuse_efficiency() * 100.0,
        stats.evictions
    );
    pool.clear();
    Ok(())
}
