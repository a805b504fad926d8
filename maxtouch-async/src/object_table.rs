//! Discovery of the chip's object table.
//!
//! maXTouch devices do not have fixed register addresses. The information
//! block at register 0 declares how many objects follow, and each object
//! table entry gives the register address of that object together with the
//! number of report ids it owns. Report ids are handed out in table order,
//! starting at 1, so every entry has to be accounted for whether we use it
//! or not.

use heapless::Vec;

use crate::bus::RegisterBus;
use crate::err::Error;

/// Register address of the information block.
pub const INFORMATION_BLOCK_ADDRESS: u16 = 0x0000;
/// Size of the information block in bytes.
pub const INFORMATION_BLOCK_LEN: usize = 7;
/// Size of one object table entry in bytes.
pub const OBJECT_ENTRY_LEN: usize = 6;
/// The most touches a T100 object can report.
pub const MAX_TOUCHES: usize = 10;
/// Report id 0 is reserved, numbering starts here.
pub const FIRST_REPORT_ID: u16 = 1;

/// Identification data read from the start of the memory map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InformationBlock {
    /// Device family.
    pub family_id: u8,
    /// Device variant within the family.
    pub variant_id: u8,
    /// Firmware version.
    pub version: u8,
    /// Firmware build.
    pub build: u8,
    /// Number of X lines in the sensor matrix.
    pub matrix_x_size: u8,
    /// Number of Y lines in the sensor matrix.
    pub matrix_y_size: u8,
    /// Number of entries in the object table.
    pub num_objects: u8,
}

impl From<[u8; INFORMATION_BLOCK_LEN]> for InformationBlock {
    fn from(raw: [u8; INFORMATION_BLOCK_LEN]) -> Self {
        Self {
            family_id: raw[0],
            variant_id: raw[1],
            version: raw[2],
            build: raw[3],
            matrix_x_size: raw[4],
            matrix_y_size: raw[5],
            num_objects: raw[6],
        }
    }
}

/// The object types this driver knows how to use.
///
/// Every other type id is inert but still owns report ids.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectType {
    /// T2, encryption status.
    EncryptionStatus = 2,
    /// T5, the message processor the event records are read from.
    MessageProcessor = 5,
    /// T6, command processor (reset, calibrate).
    CommandProcessor = 6,
    /// T7, power configuration.
    PowerConfig = 7,
    /// T8, acquisition configuration.
    AcquisitionConfig = 8,
    /// T44, number of pending messages.
    MessageCount = 44,
    /// T46, capacitive touch engine configuration.
    CteConfig = 46,
    /// T100, multiple touch touchscreen.
    MultipleTouchTouchscreen = 100,
}

impl ObjectType {
    const COUNT: usize = 8;

    /// Maps a raw type id onto a known object type.
    pub fn from_type_id(type_id: u8) -> Option<Self> {
        match type_id {
            2 => Some(Self::EncryptionStatus),
            5 => Some(Self::MessageProcessor),
            6 => Some(Self::CommandProcessor),
            7 => Some(Self::PowerConfig),
            8 => Some(Self::AcquisitionConfig),
            44 => Some(Self::MessageCount),
            46 => Some(Self::CteConfig),
            100 => Some(Self::MultipleTouchTouchscreen),
            _ => None,
        }
    }

    fn index(self) -> usize {
        match self {
            Self::EncryptionStatus => 0,
            Self::MessageProcessor => 1,
            Self::CommandProcessor => 2,
            Self::PowerConfig => 3,
            Self::AcquisitionConfig => 4,
            Self::MessageCount => 5,
            Self::CteConfig => 6,
            Self::MultipleTouchTouchscreen => 7,
        }
    }
}

/// One raw entry of the object table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectEntry {
    /// The object type id.
    pub type_id: u8,
    /// Start address of the object's registers.
    pub address: u16,
    /// Size of one instance, minus one.
    pub size_minus_one: u8,
    /// Number of instances, minus one.
    pub instances_minus_one: u8,
    /// Report ids owned by each instance.
    pub report_ids_per_instance: u8,
}

impl From<[u8; OBJECT_ENTRY_LEN]> for ObjectEntry {
    fn from(raw: [u8; OBJECT_ENTRY_LEN]) -> Self {
        Self {
            type_id: raw[0],
            // Stored as separate LSB/MSB bytes, combined big-endian.
            address: u16::from(raw[2]) << 8 | u16::from(raw[1]),
            size_minus_one: raw[3],
            instances_minus_one: raw[4],
            report_ids_per_instance: raw[5],
        }
    }
}

/// Where a resolved object lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectInfo {
    /// Start address of the object.
    pub address: u16,
    /// Size of one instance in bytes.
    pub size: usize,
}

/// The report ids that belong to the T100 touchscreen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TouchReportIds {
    /// Carries the number of touches (aux data).
    pub first: u16,
    /// Reserved by the object, unused here.
    pub second: u16,
    /// One id per tracked finger, consecutive, starting at `first + 2`.
    pub contacts: Vec<u16, MAX_TOUCHES>,
}

impl TouchReportIds {
    fn new(first: u16, report_ids_per_instance: u8, max_fingers: usize) -> Self {
        let count = max_fingers
            .min(MAX_TOUCHES)
            .min(usize::from(report_ids_per_instance));
        let contacts = (0..count as u16)
            .map(|i| first.saturating_add(2 + i))
            .collect();
        Self {
            first,
            second: first.saturating_add(1),
            contacts,
        }
    }

    /// Whether `report_id` is the touch count report.
    pub fn is_touch_count(&self, report_id: u8) -> bool {
        u16::from(report_id) == self.first
    }

    /// The finger slot a contact report id maps to, if it is one.
    pub fn contact_index(&self, report_id: u8) -> Option<usize> {
        let (first, last) = (self.contacts.first()?, self.contacts.last()?);
        let report_id = u16::from(report_id);
        (*first..=*last)
            .contains(&report_id)
            .then(|| usize::from(report_id - first))
    }
}

/// What one object table entry contributes.
///
/// The report id span is always present, so callers cannot advance the
/// numbering for some types and forget it for others.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// The object's location, for types we use.
    pub object: Option<(ObjectType, ObjectInfo)>,
    /// The touchscreen report ids, for the T100 entry.
    pub touch_report_ids: Option<TouchReportIds>,
    /// How many report ids this entry consumes.
    pub report_id_span: u16,
}

impl ObjectEntry {
    /// Size of one instance in bytes.
    pub fn size(&self) -> usize {
        usize::from(self.size_minus_one) + 1
    }

    /// Number of report ids the entry owns across all its instances.
    pub fn report_id_span(&self) -> u16 {
        u16::from(self.report_ids_per_instance) * (u16::from(self.instances_minus_one) + 1)
    }

    /// Resolves the entry given the first report id it owns.
    pub fn resolve(&self, first_report_id: u16, max_fingers: usize) -> Resolution {
        let object = ObjectType::from_type_id(self.type_id).map(|object_type| {
            let info = ObjectInfo {
                address: self.address,
                size: self.size(),
            };
            (object_type, info)
        });
        let touch_report_ids = match object {
            Some((ObjectType::MultipleTouchTouchscreen, _)) => Some(TouchReportIds::new(
                first_report_id,
                self.report_ids_per_instance,
                max_fingers,
            )),
            _ => None,
        };
        Resolution {
            object,
            touch_report_ids,
            report_id_span: self.report_id_span(),
        }
    }
}

/// Resolved register addresses, one slot per known object type.
///
/// A slot only ever goes from absent to resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressMap {
    objects: [Option<ObjectInfo>; ObjectType::COUNT],
}

impl AddressMap {
    /// The resolved object, or `None` if the chip does not have it.
    pub fn get(&self, object_type: ObjectType) -> Option<ObjectInfo> {
        self.objects[object_type.index()]
    }

    /// The resolved start address of an object.
    pub fn address(&self, object_type: ObjectType) -> Option<u16> {
        self.get(object_type).map(|info| info.address)
    }

    /// Payload bytes in a message, excluding report id and checksum.
    pub fn max_message_size(&self) -> Option<usize> {
        self.get(ObjectType::MessageProcessor)
            .map(|info| info.size.saturating_sub(2))
    }

    /// True if no object resolved at all.
    pub fn is_empty(&self) -> bool {
        self.objects.iter().all(Option::is_none)
    }

    fn insert(&mut self, object_type: ObjectType, info: ObjectInfo) {
        self.objects[object_type.index()] = Some(info);
    }
}

/// Everything learned from walking the object table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectTable {
    /// The information block.
    pub info: InformationBlock,
    /// Addresses of the known objects.
    pub addresses: AddressMap,
    /// Touchscreen report ids, if the chip has a T100 object.
    pub touch_report_ids: Option<TouchReportIds>,
    /// The next report id that would be assigned.
    pub next_report_id: u16,
}

impl ObjectTable {
    /// A table with nothing resolved.
    pub fn empty() -> Self {
        Self {
            info: InformationBlock::default(),
            addresses: AddressMap::default(),
            touch_report_ids: None,
            next_report_id: FIRST_REPORT_ID,
        }
    }

    /// Folds one entry into the table.
    pub fn absorb(&mut self, entry: &ObjectEntry, max_fingers: usize) {
        let resolution = entry.resolve(self.next_report_id, max_fingers);
        if let Some((object_type, info)) = resolution.object {
            log::debug!(
                "T{} at 0x{:04X}, {} bytes, report ids from {}",
                entry.type_id,
                info.address,
                info.size,
                self.next_report_id
            );
            self.addresses.insert(object_type, info);
        }
        if let Some(ids) = resolution.touch_report_ids {
            self.touch_report_ids = Some(ids);
        }
        self.next_report_id = self
            .next_report_id
            .saturating_add(resolution.report_id_span);
    }
}

/// Reads the information block and walks the object table.
///
/// Only a failure to read the information block is fatal. An entry that
/// cannot be read is logged and left out, the walk continues at the next
/// entry address.
pub async fn read_object_table<B: RegisterBus>(
    bus: &mut B,
    max_fingers: usize,
) -> Result<ObjectTable, Error<B::Error>> {
    let mut raw = [0u8; INFORMATION_BLOCK_LEN];
    bus.read(INFORMATION_BLOCK_ADDRESS, &mut raw)
        .await
        .map_err(|err| {
            log::error!("Failed to read the information block: {err:?}");
            Error::Transport(err)
        })?;

    let mut table = ObjectTable::empty();
    table.info = InformationBlock::from(raw);
    let info = &table.info;
    log::info!(
        "Found mXT {}:{}, fw {}.{} with {} objects. Matrix size {}x{}",
        info.family_id,
        info.variant_id,
        info.version,
        info.build,
        info.num_objects,
        info.matrix_x_size,
        info.matrix_y_size
    );

    let mut address = INFORMATION_BLOCK_ADDRESS + INFORMATION_BLOCK_LEN as u16;
    for index in 0..table.info.num_objects {
        let mut raw = [0u8; OBJECT_ENTRY_LEN];
        match bus.read(address, &mut raw).await {
            Ok(()) => table.absorb(&ObjectEntry::from(raw), max_fingers),
            Err(err) => log::warn!("Failed to read object table entry {index}: {err:?}"),
        }
        address += OBJECT_ENTRY_LEN as u16;
    }

    Ok(table)
}
