use std::collections::BTreeMap;

use serde::Serialize;

use tilegrid_core::{ProcKind, ProcessorId, Rank, RegistrationInput, SampleId, TileCoord};
use tilegrid_placement::PlacementContext;

use super::{ClusterArgs, InputArgs};

#[derive(Debug, Serialize)]
pub struct TilePlacement {
    pub sample: SampleId,
    pub tile: TileCoord,
    pub rank: Rank,
    pub slot: u32,
    pub processor: ProcessorId,
}

#[derive(Debug, Serialize)]
pub struct Plan {
    pub kind: ProcKind,
    pub placements: Vec<TilePlacement>,
    /// Tiles per rank, ranks with no tiles omitted.
    pub load: BTreeMap<Rank, u32>,
}

pub fn plan(inputs: &InputArgs, cluster: &ClusterArgs, format: &str) -> anyhow::Result<()> {
    let inputs = inputs.load()?;
    let plan = build_plan(&inputs, cluster)?;
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&plan)?),
        "text" => print_text(&plan),
        other => anyhow::bail!("unknown format '{other}' (expected text or json)"),
    }
    Ok(())
}

pub fn build_plan(inputs: &[RegistrationInput], cluster: &ClusterArgs) -> anyhow::Result<Plan> {
    let kind = ProcKind::from(cluster.kind);
    let ctx = PlacementContext::new(inputs, cluster.processors(), 0)?;

    let mut placements = Vec::new();
    let mut load = BTreeMap::new();
    for (sample, mapping) in ctx.registry().iter() {
        for tile in mapping.tiles() {
            let (rank, processor) = ctx.tile_processor(mapping, tile, kind)?;
            *load.entry(rank).or_insert(0) += 1;
            placements.push(TilePlacement {
                sample,
                tile,
                rank,
                slot: mapping.slot(tile),
                processor: processor.id,
            });
        }
    }
    Ok(Plan { kind, placements, load })
}

fn print_text(plan: &Plan) {
    println!("{:<8} {:<14} {:<6} {:<6} PROCESSOR", "SAMPLE", "TILE", "RANK", "SLOT");
    for p in &plan.placements {
        println!(
            "{:<8} {:<14} {:<6} {:<6} {}",
            p.sample,
            p.tile.to_string(),
            p.rank,
            p.slot,
            p.processor
        );
    }
    println!();
    println!("{} tile(s) on {} rank(s), {} tasks:", plan.placements.len(), plan.load.len(), plan.kind);
    for (rank, tiles) in &plan.load {
        println!("  rank {rank}: {tiles}");
    }
}
