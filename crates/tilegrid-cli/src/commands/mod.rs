pub mod check;
pub mod plan;

use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgMatches, Args, ValueEnum};

use tilegrid_core::{MultiConfig, ProcKind, Processor, ProcessorId, Rank, RegistrationInput, SampleConfig};

/// Sample configuration files, registered in the order they appear on the
/// command line.
#[derive(Args, Debug)]
pub struct InputArgs {
    /// Single-sample config file (repeatable)
    #[arg(short = 'i', long = "input")]
    pub singles: Vec<PathBuf>,
    /// Dual-sample config file (repeatable)
    #[arg(short = 'm', long = "multi")]
    pub duals: Vec<PathBuf>,
    #[arg(skip)]
    positions: Option<(Vec<usize>, Vec<usize>)>,
}

impl InputArgs {
    /// Remember where each `-i` and `-m` value sat on the command line.
    ///
    /// Without this, `load` registers every single before every dual.
    pub fn with_positions(mut self, matches: &ArgMatches) -> Self {
        let indices = |id: &str| {
            matches
                .indices_of(id)
                .map(|i| i.collect::<Vec<_>>())
                .unwrap_or_default()
        };
        self.positions = Some((indices("singles"), indices("duals")));
        self
    }

    pub fn load(&self) -> anyhow::Result<Vec<RegistrationInput>> {
        if self.singles.is_empty() && self.duals.is_empty() {
            anyhow::bail!("no sample configs given (use -i or -m)");
        }
        let (single_pos, dual_pos) = match &self.positions {
            Some((s, d)) => (s.clone(), d.clone()),
            None => (
                (0..self.singles.len()).collect(),
                (self.singles.len()..self.singles.len() + self.duals.len()).collect(),
            ),
        };

        let mut inputs = Vec::with_capacity(self.singles.len() + self.duals.len());
        for (path, &pos) in self.singles.iter().zip(&single_pos) {
            let config = SampleConfig::from_file(path).with_context(|| format!("loading {}", path.display()))?;
            inputs.push((pos, RegistrationInput::Single(config)));
        }
        for (path, &pos) in self.duals.iter().zip(&dual_pos) {
            let mc = MultiConfig::from_file(path).with_context(|| format!("loading {}", path.display()))?;
            inputs.push((pos, RegistrationInput::Dual(mc)));
        }
        inputs.sort_by_key(|(pos, _)| *pos);
        Ok(inputs.into_iter().map(|(_, input)| input).collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Host,
    HostOffload,
    Accelerator,
}

impl From<KindArg> for ProcKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Host => ProcKind::Host,
            KindArg::HostOffload => ProcKind::HostOffload,
            KindArg::Accelerator => ProcKind::Accelerator,
        }
    }
}

/// Shape of a synthetic, homogeneous cluster.
#[derive(Args, Debug)]
pub struct ClusterArgs {
    /// Ranks in the job
    #[arg(short, long)]
    pub ranks: u32,
    /// Host CPUs per rank
    #[arg(long, default_value_t = 1)]
    pub cpus_per_rank: u32,
    /// Accelerators per rank
    #[arg(long, default_value_t = 0)]
    pub gpus_per_rank: u32,
    /// Host-offload processors per rank
    #[arg(long, default_value_t = 0)]
    pub omp_per_rank: u32,
    /// Processor kind tile tasks prefer
    #[arg(short, long, value_enum, default_value = "host")]
    pub kind: KindArg,
}

impl ClusterArgs {
    /// Enumerate processors rank by rank, kinds in a fixed order.
    pub fn processors(&self) -> Vec<Processor> {
        let mut procs = Vec::new();
        let mut next_id = 0u64;
        for rank in 0..self.ranks as Rank {
            for (kind, count) in [
                (ProcKind::Host, self.cpus_per_rank),
                (ProcKind::Accelerator, self.gpus_per_rank),
                (ProcKind::HostOffload, self.omp_per_rank),
            ] {
                for _ in 0..count {
                    procs.push(Processor { id: ProcessorId(next_id), rank, kind });
                    next_id += 1;
                }
            }
        }
        procs
    }
}
