//! Error types for the maXTouch driver.

use core::fmt::{self, Debug};

/// The main error type for the maXTouch driver.
pub enum Error<TBUSERR> {
    /// A register read or write on the bus failed.
    Transport(TBUSERR),
    /// The object table has not been read, or the object needed is absent.
    NotResolved,
    /// The object is smaller than the record the driver would write.
    ObjectTooSmall {
        /// Size declared in the object table.
        size: usize,
        /// Bytes the driver needs.
        needed: usize,
    },
}

impl<TBUSERR: Debug> Debug for Error<TBUSERR> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(err) => write!(f, "Transport({err:?})"),
            Self::NotResolved => write!(f, "NotResolved"),
            Self::ObjectTooSmall { size, needed } => {
                write!(f, "ObjectTooSmall {{ size: {size}, needed: {needed} }}")
            }
        }
    }
}

/// Why a single message record could not be applied to the digitizer state.
///
/// These never abort a polling cycle, the record is dropped and counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// The report id does not belong to any object we decode.
    UnrecognizedReportId(u8),
    /// The report id maps to a finger slot beyond the digitizer capacity.
    ContactOutOfRange {
        /// The report id of the record.
        report_id: u8,
        /// The finger index it maps to.
        contact: usize,
    },
}
