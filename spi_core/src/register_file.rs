use rhdl::prelude::*;
use rhdl_fpga::core::dff::DFF;

use crate::frame::decode_frame;
use crate::types::*;

// the five output registers plus the consumer half of the handshake
#[derive(Synchronous, SynchronousDQ, Clone, Debug)]
pub struct RegisterFile {
    registers: DFF<RegisterBank>,
    processed: DFF<bool>,
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self {
            registers: DFF::new(RegisterBank::default()),
            processed: DFF::new(false),
        }
    }
}

pub type RegisterFileIn = (bool, b16); // (ready, frame)

impl SynchronousIO for RegisterFile {
    type I = RegisterFileIn;
    type O = RegisterFileOutput;
    type Kernel = register_file_kernel;
}

#[kernel]
pub fn register_file_kernel(
    _cr: ClockReset,
    input: RegisterFileIn,
    q: Q,
) -> (RegisterFileOutput, D) {
    let (ready, frame) = input;
    let fields = decode_frame(frame);

    let mut next_registers = q.registers;
    let mut next_processed = q.processed;

    if ready & !q.processed {
        // reads and unmapped addresses still complete the handshake
        if fields.write {
            if fields.address == bits(0) {
                next_registers[0] = fields.data;
            } else if fields.address == bits(1) {
                next_registers[1] = fields.data;
            } else if fields.address == bits(2) {
                next_registers[2] = fields.data;
            } else if fields.address == bits(3) {
                next_registers[3] = fields.data;
            } else if fields.address == bits(4) {
                next_registers[4] = fields.data;
            }
        }
        next_processed = true;
    } else if !ready & q.processed {
        next_processed = false;
    }

    let output = RegisterFileOutput {
        registers: q.registers,
        processed: q.processed,
    };

    (
        output,
        D {
            registers: next_registers,
            processed: next_processed,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outputs(inputs: Vec<RegisterFileIn>) -> miette::Result<Vec<RegisterFileOutput>> {
        let uut = RegisterFile::default();
        let input = inputs.with_reset(1).clock_pos_edge(100);
        Ok(uut
            .run(input)?
            .synchronous_sample()
            .filter(|t| !t.value.0.reset.any())
            .map(|t| t.value.2)
            .collect())
    }

    #[test]
    fn test_commit_write() -> miette::Result<()> {
        let frame = bits(0b1_0000010_10100101);
        let outs = outputs(vec![(false, frame), (true, frame), (true, frame), (false, frame), (false, frame)])?;

        let last = outs.last().unwrap();
        assert_eq!(last.registers, [bits(0), bits(0), bits(0xA5), bits(0), bits(0)]);
        assert!(!last.processed);

        let processed: Vec<bool> = outs.iter().map(|o| o.processed).collect();
        assert_eq!(processed, vec![false, false, true, true, false]);
        Ok(())
    }

    #[test]
    fn test_commit_happens_once() -> miette::Result<()> {
        // ready held for several ticks while the frame keeps changing:
        // only the frame present on the first ready tick is committed
        let outs = outputs(vec![
            (true, bits(0x8011)),
            (true, bits(0x8022)),
            (true, bits(0x8033)),
            (false, bits(0x8044)),
            (false, bits(0x8044)),
        ])?;
        assert_eq!(outs.last().unwrap().registers[0], bits(0x11));
        Ok(())
    }

    #[test]
    fn test_out_of_range_and_read_are_noops() -> miette::Result<()> {
        let outs = outputs(vec![
            (true, bits(0x87FF)),
            (false, bits(0x87FF)),
            (false, bits(0x87FF)),
            (true, bits(0x0212)),
            (false, bits(0x0212)),
            (false, bits(0x0212)),
        ])?;

        assert!(outs.iter().all(|o| o.registers == RegisterBank::default()));
        // handshake still advanced both times
        assert_eq!(outs.iter().filter(|o| o.processed).count(), 2);
        Ok(())
    }

    #[test]
    fn test_every_address_maps_to_its_register() -> miette::Result<()> {
        let mut inputs = Vec::new();
        for address in 0..5u128 {
            let frame = bits((1 << 15) | (address << 8) | (0x10 + address));
            inputs.push((true, frame));
            inputs.push((false, frame));
            inputs.push((false, frame));
        }
        let outs = outputs(inputs)?;
        assert_eq!(
            outs.last().unwrap().registers,
            [bits(0x10), bits(0x11), bits(0x12), bits(0x13), bits(0x14)]
        );
        Ok(())
    }
}
