//! Draining the message processor once per polling cycle.

use crate::bus::RegisterBus;
use crate::digitizer::{Applied, Digitizer};
use crate::err::{DecodeError, Error};
use crate::object_table::{ObjectTable, ObjectType};

/// Payload bytes following the report id.
pub const MESSAGE_DATA_LEN: usize = 9;
/// Bytes read from the message processor per message.
pub const MESSAGE_LEN: usize = 1 + MESSAGE_DATA_LEN;

/// One record read from the T5 message processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Message {
    /// Which object (and instance) produced the message.
    pub report_id: u8,
    /// Object specific payload.
    pub data: [u8; MESSAGE_DATA_LEN],
}

impl Message {
    /// Creates a message from its parts.
    pub const fn new(report_id: u8, data: [u8; MESSAGE_DATA_LEN]) -> Self {
        Self { report_id, data }
    }
}

impl From<[u8; MESSAGE_LEN]> for Message {
    fn from(raw: [u8; MESSAGE_LEN]) -> Self {
        let mut data = [0u8; MESSAGE_DATA_LEN];
        data.copy_from_slice(&raw[1..]);
        Self {
            report_id: raw[0],
            data,
        }
    }
}

/// Tally of one polling cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessageSummary {
    /// Messages the chip said were pending.
    pub pending: u8,
    /// Touch count reports seen.
    pub touch_count: u8,
    /// Contact reports applied.
    pub contacts: u8,
    /// Messages from objects we do not decode.
    pub unrecognized: u8,
    /// Contact reports for fingers beyond the digitizer capacity.
    pub out_of_range: u8,
    /// Messages that could not be read.
    pub failed_reads: u8,
}

/// Reads every pending message and folds it into `digitizer`.
///
/// Returns without touching the bus if the chip has no message count or
/// message processor object. A failure to read the message count ends the
/// cycle with the state unchanged. Never reads more messages than declared.
pub async fn read_messages<B: RegisterBus, const N: usize>(
    bus: &mut B,
    table: &ObjectTable,
    digitizer: &mut Digitizer<N>,
) -> Result<MessageSummary, Error<B::Error>> {
    let map = &table.addresses;
    let (Some(count_address), Some(processor_address)) = (
        map.address(ObjectType::MessageCount),
        map.address(ObjectType::MessageProcessor),
    ) else {
        return Ok(MessageSummary::default());
    };

    let mut count = [0u8; 1];
    bus.read(count_address, &mut count)
        .await
        .map_err(Error::Transport)?;

    let mut summary = MessageSummary {
        pending: count[0],
        ..Default::default()
    };
    for _ in 0..summary.pending {
        let mut raw = [0u8; MESSAGE_LEN];
        if let Err(err) = bus.read(processor_address, &mut raw).await {
            log::warn!("Failed to read message: {err:?}");
            summary.failed_reads += 1;
            continue;
        }
        let message = Message::from(raw);
        let result = match &table.touch_report_ids {
            Some(ids) => digitizer.apply(ids, &message),
            None => Err(DecodeError::UnrecognizedReportId(message.report_id)),
        };
        match result {
            Ok(Applied::TouchCount) => summary.touch_count += 1,
            Ok(Applied::Contact(_)) => summary.contacts += 1,
            Err(err @ DecodeError::UnrecognizedReportId(_)) => {
                log::warn!("Unhandled message: {err:?}");
                summary.unrecognized += 1;
            }
            Err(err @ DecodeError::ContactOutOfRange { .. }) => {
                log::warn!("Dropped contact: {err:?}");
                summary.out_of_range += 1;
            }
        }
    }
    Ok(summary)
}
