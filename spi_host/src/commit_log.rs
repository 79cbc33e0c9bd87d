use spi_core::REGISTER_COUNT;
use std::collections::BTreeMap;

pub type Registers = [u8; REGISTER_COUNT];

// 1. register bank changes keyed by the tick they became visible
// btree so "what did the bank hold at tick t" is a log n range query
#[derive(Debug, Default, Clone)]
pub struct CommitLog {
    commits: BTreeMap<u64, Registers>,
}

impl CommitLog {
    // 2. walks a per-tick trace and keeps only the ticks where something changed
    pub fn from_trace(trace: impl IntoIterator<Item = Registers>) -> Self {
        let mut commits = BTreeMap::new();
        let mut current: Registers = [0; REGISTER_COUNT];

        for (tick, registers) in trace.into_iter().enumerate() {
            if registers != current {
                commits.insert(tick as u64, registers);
                current = registers;
            }
        }

        Self { commits }
    }

    // 3. bank contents as of `tick` (everything resets to zero)
    pub fn registers_at(&self, tick: u64) -> Registers {
        self.commits
            .range(..=tick)
            .next_back()
            .map(|(_, regs)| *regs)
            .unwrap_or([0; REGISTER_COUNT])
    }

    pub fn final_registers(&self) -> Registers {
        self.commits
            .values()
            .next_back()
            .copied()
            .unwrap_or([0; REGISTER_COUNT])
    }

    pub fn len(&self) -> usize {
        self.commits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, &Registers)> {
        self.commits.iter().map(|(tick, regs)| (*tick, regs))
    }
}
