use tilegrid_placement::SampleRegistry;

use super::InputArgs;

pub fn check(inputs: &InputArgs, ranks: u32) -> anyhow::Result<()> {
    let inputs = inputs.load()?;
    match SampleRegistry::build(&inputs, ranks) {
        Ok(registry) => {
            println!("✓ {} sample(s) fit on {} rank(s)", registry.len(), ranks);
            for (id, mapping) in registry.iter() {
                let [tx, ty, tz] = mapping.extents();
                let [sx, sy, sz] = mapping.tiles_per_rank();
                let range = mapping.ranks();
                println!(
                    "  sample {id}: {tx}x{ty}x{tz} tiles, {sx}x{sy}x{sz} per rank, ranks {}..{}",
                    range.start, range.end
                );
            }
            if registry.required_ranks() < ranks {
                println!("  {} rank(s) left idle", ranks - registry.required_ranks());
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("Check failed: {e}");
            Err(e.into())
        }
    }
}
