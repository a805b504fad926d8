//! A register-level stand-in for the chip, used by the unit tests.

use std::collections::VecDeque;
use std::vec::Vec;

use crate::bus::RegisterBus;
use crate::message::MESSAGE_LEN;
use crate::object_table::{INFORMATION_BLOCK_LEN, OBJECT_ENTRY_LEN};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FakeError(pub u16);

pub struct FakeChip {
    pub mem: Vec<u8>,
    pub fail_reads: Vec<u16>,
    pub fail_writes: Vec<u16>,
    pub reads: Vec<u16>,
    pub writes: Vec<(u16, Vec<u8>)>,
    /// Records served, one per read, from `message_processor`.
    pub messages: VecDeque<[u8; MESSAGE_LEN]>,
    pub message_processor: Option<u16>,
}

impl FakeChip {
    pub fn new() -> Self {
        Self {
            mem: std::vec![0; 0x800],
            fail_reads: Vec::new(),
            fail_writes: Vec::new(),
            reads: Vec::new(),
            writes: Vec::new(),
            messages: VecDeque::new(),
            message_processor: None,
        }
    }

    /// Lays out an information block and object table starting at register 0.
    pub fn with_objects(matrix: (u8, u8), objects: &[[u8; OBJECT_ENTRY_LEN]]) -> Self {
        let mut chip = Self::new();
        chip.mem[..INFORMATION_BLOCK_LEN]
            .copy_from_slice(&[166, 0x14, 0x10, 0xAA, matrix.0, matrix.1, objects.len() as u8]);
        for (i, object) in objects.iter().enumerate() {
            let at = INFORMATION_BLOCK_LEN + i * OBJECT_ENTRY_LEN;
            chip.mem[at..at + OBJECT_ENTRY_LEN].copy_from_slice(object);
        }
        chip
    }

    pub fn queue_message(&mut self, report_id: u8, data: &[u8]) {
        let mut record = [0u8; MESSAGE_LEN];
        record[0] = report_id;
        record[1..1 + data.len()].copy_from_slice(data);
        self.messages.push_back(record);
    }

    pub fn written_to(&self, address: u16) -> Option<&[u8]> {
        self.writes
            .iter()
            .rev()
            .find(|(at, _)| *at == address)
            .map(|(_, data)| data.as_slice())
    }
}

/// Builds a 6 byte object table entry.
pub fn object(type_id: u8, address: u16, size: u8, instances: u8, report_ids: u8) -> [u8; 6] {
    let [msb, lsb] = address.to_be_bytes();
    [type_id, lsb, msb, size - 1, instances - 1, report_ids]
}

impl RegisterBus for FakeChip {
    type Error = FakeError;

    async fn read(&mut self, address: u16, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.reads.push(address);
        if self.fail_reads.contains(&address) {
            return Err(FakeError(address));
        }
        if Some(address) == self.message_processor {
            let record = self.messages.pop_front().unwrap_or([0xFF; MESSAGE_LEN]);
            buf.copy_from_slice(&record[..buf.len()]);
            return Ok(());
        }
        let at = address as usize;
        buf.copy_from_slice(&self.mem[at..at + buf.len()]);
        Ok(())
    }

    async fn write(&mut self, address: u16, data: &[u8]) -> Result<(), Self::Error> {
        if self.fail_writes.contains(&address) {
            return Err(FakeError(address));
        }
        let at = address as usize;
        self.mem[at..at + data.len()].copy_from_slice(data);
        self.writes.push((address, data.to_vec()));
        Ok(())
    }
}
