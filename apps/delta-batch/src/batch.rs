use std::fs::File;
use std::io::BufWriter;
use std::sync::Arc;

use analysis::{compute_session_deltas, EngineConfig, RacingLineBuilder};
use anyhow::{Context, Result};
use iox::MemoryStore;
use tracing::{info, warn};

use crate::Cli;

pub async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(p) => iox::load_config(p)?,
        None => EngineConfig::default(),
    };

    let laps = iox::import_laps(&cli.input)?;
    info!(laps = laps.len(), input = %cli.input.display(), "loaded laps");
    let store = Arc::new(MemoryStore::from_records(laps));

    let sessions = match cli.session {
        Some(s) => vec![s],
        None => store.sessions(),
    };
    for session in sessions {
        let report = compute_session_deltas(Arc::clone(&store), session).await?;
        for (lap, err) in &report.failed {
            warn!(%session, %lap, "skipped: {err}");
        }
    }

    let all = store.all_deltas();
    let ndjson = cli
        .out
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("ndjson"));
    if ndjson {
        let records: Vec<_> = all.into_iter().map(|(_, d)| d).collect();
        iox::export_deltas_ndjson(&records, &cli.out)?;
    } else {
        iox::export_deltas_csv(&all, &cli.out)?;
    }
    info!(out = %cli.out.display(), "wrote deltas");

    if let Some(lap_id) = cli.map_lap {
        let lap = store.lap(lap_id).with_context(|| format!("lap {lap_id} not in input"))?;
        let map = RacingLineBuilder::new(config).track_map(lap_id, &lap.series.points);
        let f = File::create(&cli.map_out)
            .with_context(|| format!("creating {}", cli.map_out.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(f), &map)?;
        info!(
            lap = %lap_id,
            line_points = map.racing_line.points.len(),
            rails = map.rails.len(),
            out = %cli.map_out.display(),
            "wrote track map"
        );
    }
    Ok(())
}
