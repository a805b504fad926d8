//! An asynchronous, `no_std` driver core for Microchip maXTouch controllers
//! (mXT336UD and relatives) used as a touchpad.
//!
//! The chip describes itself through an object table, so nothing can be
//! configured or decoded before that table has been read. The driver is split
//! along those lines:
//!
//! * [`object_table`] walks the table once and yields the register addresses
//!   and the report id assignment.
//! * [`configure`] pushes sensing parameters to the objects that exist.
//! * [`message`] drains pending messages every polling cycle and folds them
//!   into a caller-owned [`digitizer::Digitizer`].
//!
//! [`MaxTouch`] ties the three together over any [`bus::RegisterBus`].
//!
//! # Usage
//!
//! ```no_run
//! # async fn demo<I: embedded_hal_async::i2c::I2c<Error = E>, E: embedded_hal_async::i2c::Error>(i2c: I) {
//! use maxtouch_async::bus::{I2cBus, DEFAULT_I2C_ADDRESS};
//! use maxtouch_async::{Config, Digitizer, MaxTouch};
//!
//! let bus = I2cBus::new(i2c, DEFAULT_I2C_ADDRESS);
//! let mut touchpad: MaxTouch<_, 5> = MaxTouch::new(bus, Config::new(96, 56));
//! touchpad.init().await.unwrap();
//!
//! let mut digitizer = Digitizer::<5>::new();
//! loop {
//!     if touchpad.read_messages(&mut digitizer).await.is_ok() {
//!         for (id, finger) in digitizer.active() {
//!             // log::info!("finger {id} at {},{}", finger.x, finger.y);
//!         }
//!     }
//! }
//! # }
//! ```

#![cfg_attr(not(test), no_std)]

pub mod bus;
pub mod conf;
pub mod configure;
pub mod digitizer;
pub mod err;
pub mod message;
pub mod object_table;

#[cfg(test)]
mod fake;

pub use conf::Config;
pub use configure::{cpi_from_samples, samples_from_cpi, ConfigSummary};
pub use digitizer::{Digitizer, FingerContact, TouchEvent};
pub use err::{DecodeError, Error};
pub use message::MessageSummary;
pub use object_table::{AddressMap, ObjectTable, ObjectType, TouchReportIds};

use bus::RegisterBus;

/// A maXTouch controller tracking up to `FINGERS` contacts.
pub struct MaxTouch<B: RegisterBus, const FINGERS: usize> {
    bus: B,
    config: Config,
    table: ObjectTable,
}

impl<B: RegisterBus, const FINGERS: usize> MaxTouch<B, FINGERS> {
    /// Creates a new `MaxTouch`. Nothing is sent until `init`.
    pub fn new(bus: B, config: Config) -> Self {
        Self {
            bus,
            config,
            table: ObjectTable::empty(),
        }
    }

    /// Reads the object table, then writes the configuration.
    ///
    /// If the object table cannot be read nothing is configured and the
    /// error is returned. Individual configuration failures are only logged.
    pub async fn init(&mut self) -> Result<ConfigSummary, Error<B::Error>> {
        self.read_object_table().await?;
        Ok(self.write_configuration().await)
    }

    /// Walks the object table. On failure every object is left absent.
    pub async fn read_object_table(&mut self) -> Result<&ObjectTable, Error<B::Error>> {
        self.table = ObjectTable::empty();
        self.table = object_table::read_object_table(&mut self.bus, FINGERS).await?;
        Ok(&self.table)
    }

    /// Writes the configuration of every object that resolved.
    pub async fn write_configuration(&mut self) -> ConfigSummary {
        configure::write_configuration(&mut self.bus, &self.table, &self.config, FINGERS).await
    }

    /// Drains pending messages into `digitizer`.
    pub async fn read_messages(
        &mut self,
        digitizer: &mut Digitizer<FINGERS>,
    ) -> Result<MessageSummary, Error<B::Error>> {
        message::read_messages(&mut self.bus, &self.table, digitizer).await
    }

    /// Changes the reported resolution and updates the chip.
    ///
    /// `cpi()` keeps the old value unless the write succeeds.
    pub async fn set_cpi(&mut self, cpi: u16) -> Result<(), Error<B::Error>> {
        let config = Config { cpi, ..self.config };
        configure::write_touchscreen_range(&mut self.bus, &self.table.addresses, &config).await?;
        self.config = config;
        Ok(())
    }

    /// The reported resolution in counts per inch.
    pub fn cpi(&self) -> u16 {
        self.config.cpi
    }

    /// Forces a recalibration of the sensor.
    pub async fn calibrate(&mut self) -> Result<(), Error<B::Error>> {
        configure::calibrate(&mut self.bus, &self.table.addresses).await
    }

    /// Resets the chip.
    pub async fn reset(&mut self) -> Result<(), Error<B::Error>> {
        configure::reset(&mut self.bus, &self.table.addresses).await
    }

    /// What the last object table walk found.
    pub fn object_table(&self) -> &ObjectTable {
        &self.table
    }

    /// Gives back the bus.
    pub fn release(self) -> B {
        self.bus
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conf::DEFAULT_CPI;
    use crate::fake::{object, FakeChip};
    use embassy_futures::block_on;

    fn chip() -> FakeChip {
        let mut chip = FakeChip::with_objects(
            (24, 14),
            &[
                object(5, 0x0090, 11, 1, 0),
                object(6, 0x00A0, 6, 1, 1),
                object(7, 0x00B0, 5, 1, 0),
                object(44, 0x00D0, 1, 1, 0),
                object(100, 0x0100, 60, 1, 12),
            ],
        );
        chip.message_processor = Some(0x0090);
        chip
    }

    #[test]
    fn init_resolves_and_configures() {
        let mut touchpad: MaxTouch<_, 5> = MaxTouch::new(chip(), Config::new(96, 56));
        let summary = block_on(touchpad.init()).unwrap();
        assert_eq!(summary.written, 2);
        assert_eq!(summary.skipped, 2);
        let ids = touchpad.object_table().touch_report_ids.clone().unwrap();
        assert_eq!(ids.contacts.len(), 5);
    }

    #[test]
    fn unreadable_information_block_writes_nothing() {
        let mut chip = chip();
        chip.fail_reads.push(0);
        let mut touchpad: MaxTouch<_, 5> = MaxTouch::new(chip, Config::new(96, 56));

        assert!(block_on(touchpad.init()).is_err());
        assert!(touchpad.object_table().addresses.is_empty());
        assert_eq!(touchpad.object_table().touch_report_ids, None);

        // Configuring anyway still has nothing to write to.
        let summary = block_on(touchpad.write_configuration());
        assert_eq!(summary.written, 0);
        let mut digitizer = Digitizer::<5>::new();
        let messages = block_on(touchpad.read_messages(&mut digitizer)).unwrap();
        assert_eq!(messages, MessageSummary::default());
        assert!(touchpad.release().writes.is_empty());
    }

    #[test]
    fn polling_cycle_updates_fingers() {
        let mut touchpad: MaxTouch<_, 5> = MaxTouch::new(chip(), Config::new(96, 56));
        block_on(touchpad.init()).unwrap();

        let mut chip = touchpad.release();
        chip.mem[0x00D0] = 2;
        chip.queue_message(4, &[4, 0x10, 0x01, 0x20, 0x02]);
        chip.queue_message(2, &[1]);
        let mut touchpad: MaxTouch<_, 5> = MaxTouch::new(chip, Config::new(96, 56));
        block_on(touchpad.read_object_table()).unwrap();

        let mut digitizer = Digitizer::<5>::new();
        let summary = block_on(touchpad.read_messages(&mut digitizer)).unwrap();
        assert_eq!(summary.contacts, 1);
        assert_eq!(summary.touch_count, 1);
        let (id, finger) = digitizer.active().next().unwrap();
        assert_eq!(id, 0);
        assert_eq!((finger.x, finger.y), (0x0110, 0x0220));
    }

    #[test]
    fn cpi_change_rewrites_ranges() {
        let mut touchpad: MaxTouch<_, 5> = MaxTouch::new(chip(), Config::new(96, 56));
        block_on(touchpad.init()).unwrap();
        block_on(touchpad.set_cpi(400)).unwrap();
        assert_eq!(touchpad.cpi(), 400);

        let chip = touchpad.release();
        let x = samples_from_cpi(400, 56).to_le_bytes();
        assert_eq!(chip.written_to(0x0100 + 13), Some(&x[..]));
    }

    #[test]
    fn failed_cpi_change_keeps_old_cpi() {
        let mut chip = chip();
        chip.fail_writes.push(0x0100 + 13);
        let mut touchpad: MaxTouch<_, 5> = MaxTouch::new(chip, Config::new(96, 56));
        block_on(touchpad.init()).unwrap();

        assert!(matches!(
            block_on(touchpad.set_cpi(400)),
            Err(Error::Transport(_))
        ));
        assert_eq!(touchpad.cpi(), DEFAULT_CPI);
    }

    #[test]
    fn cpi_change_without_touchscreen_keeps_old_cpi() {
        let mut chip = FakeChip::with_objects((24, 14), &[object(7, 0x00B0, 5, 1, 0)]);
        let mut touchpad: MaxTouch<_, 5> = MaxTouch::new(chip, Config::new(96, 56));
        block_on(touchpad.init()).unwrap();

        assert!(matches!(
            block_on(touchpad.set_cpi(1200)),
            Err(Error::NotResolved)
        ));
        assert_eq!(touchpad.cpi(), DEFAULT_CPI);
        assert!(touchpad.release().writes.iter().all(|(at, _)| *at == 0x00B0));
    }
}
