use rhdl::prelude::*;
use rhdl_fpga::core::dff::DFF;

use crate::types::SpiPins;

// latency in ticks between a pin change and the stable sample
pub const SYNC_DEPTH: usize = 2;

// two flip-flop synchronizer, only `stable` leaves this module
#[derive(Synchronous, SynchronousDQ, Clone, Debug)]
pub struct Synchronizer {
    meta: DFF<SpiPins>,
    stable: DFF<SpiPins>,
}

impl Default for Synchronizer {
    fn default() -> Self {
        Self {
            meta: DFF::new(SpiPins::idle()),
            stable: DFF::new(SpiPins::idle()),
        }
    }
}

impl SynchronousIO for Synchronizer {
    type I = SpiPins; // raw pins
    type O = SpiPins; // pins delayed by SYNC_DEPTH ticks
    type Kernel = sync_kernel;
}

#[kernel]
pub fn sync_kernel(_cr: ClockReset, raw: SpiPins, q: Q) -> (SpiPins, D) {
    (
        q.stable,
        D {
            meta: raw,
            stable: q.meta,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pins(cs_n: bool, sclk: bool, mosi: bool) -> SpiPins {
        SpiPins { cs_n, sclk, mosi }
    }

    #[test]
    fn test_sync_latency_is_exact() -> miette::Result<()> {
        let uut = Synchronizer::default();

        let mut inputs = vec![SpiPins::idle(); 3];
        inputs.extend(vec![pins(false, true, true); 6]);

        let input = inputs.with_reset(1).clock_pos_edge(100);
        let samples: Vec<_> = uut
            .run(input)?
            .synchronous_sample()
            .filter(|t| !t.value.0.reset.any())
            .map(|t| (t.value.1, t.value.2))
            .collect();

        let changed_in = samples.iter().position(|(i, _)| !i.cs_n).unwrap();
        let changed_out = samples.iter().position(|(_, o)| !o.cs_n).unwrap();
        assert_eq!(changed_out - changed_in, SYNC_DEPTH);

        // all three pins travel through the same chain
        let (_, last) = samples.last().unwrap();
        assert_eq!(*last, pins(false, true, true));
        Ok(())
    }

    #[test]
    fn test_sync_single_tick_glitch_survives_whole() -> miette::Result<()> {
        let uut = Synchronizer::default();

        let mut inputs = vec![SpiPins::idle(); 2];
        inputs.push(pins(true, true, false));
        inputs.extend(vec![SpiPins::idle(); 4]);

        let input = inputs.with_reset(1).clock_pos_edge(100);
        let highs = uut
            .run(input)?
            .synchronous_sample()
            .filter(|t| !t.value.0.reset.any())
            .filter(|t| t.value.2.sclk)
            .count();

        // delayed, never stretched or dropped
        assert_eq!(highs, 1);
        Ok(())
    }

    #[test]
    fn test_sync_resets_to_idle() -> miette::Result<()> {
        let uut = Synchronizer::default();

        let inputs = vec![pins(false, true, true); 4];
        let input = inputs.with_reset(2).clock_pos_edge(100);
        let during_reset: Vec<_> = uut
            .run(input)?
            .synchronous_sample()
            .filter(|t| t.value.0.reset.any())
            .map(|t| t.value.2)
            .collect();

        assert!(!during_reset.is_empty());
        assert!(during_reset.iter().all(|o| *o == SpiPins::idle()));
        Ok(())
    }
}
