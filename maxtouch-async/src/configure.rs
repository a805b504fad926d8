//! Pushes sensing parameters to the objects the chip has.
//!
//! Objects that did not resolve are skipped without complaint. A failed
//! write is logged and the next object is still configured.

use crate::bus::{RegisterBus, MAX_WRITE_LEN};
use crate::conf::Config;
use crate::err::Error;
use crate::object_table::{AddressMap, InformationBlock, ObjectTable, ObjectType, MAX_TOUCHES};

// --- T6 command processor offsets ---
const T6_RESET: u16 = 0;
const T6_CALIBRATE: u16 = 2;
const T6_COMMAND: u8 = 0x01;

// --- T7 power config ---
const T7_CFG_ACTVPIPEEN: u8 = 0b0000_0010;
const T7_CFG_IDLEPIPEEN: u8 = 0b0000_0100;

// --- T100 touchscreen offsets ---
/// Bytes of the T100 record this driver reads and rewrites.
pub const T100_CONFIG_LEN: usize = 51;
const T100_CTRL: usize = 0;
const T100_CFG1: usize = 1;
const T100_SCRAUX: usize = 2;
const T100_NUMTCH: usize = 6;
const T100_XSIZE: usize = 9;
const T100_XPITCH: usize = 10;
const T100_XRANGE: usize = 13;
const T100_YSIZE: usize = 20;
const T100_YPITCH: usize = 21;
const T100_YRANGE: usize = 24;
const T100_GAIN: usize = 28;
const T100_DXGAIN: usize = 29;
const T100_TCHTHR: usize = 30;
const T100_MRGTHR: usize = 35;
const T100_MRGHYST: usize = 37;
const T100_MOVFILTER: usize = 44;
const T100_MOVSMOOTH: usize = 45;
const T100_MOVHYSTI: usize = 47;
const T100_MOVHYSTN: usize = 49;

// --- T100 bits ---
const T100_CTRL_ENABLE: u8 = 0b0000_0001;
const T100_CTRL_RPTEN: u8 = 0b0000_0010;
const T100_CFG_SWITCHXY: u8 = 0b0010_0000;
const T100_CFG_INVERTY: u8 = 0b0100_0000;
const T100_SCRAUX_NUMTCH: u8 = 0b0000_0001;

/// Divides, rounding halves away from zero.
const fn divide_rounded(numerator: u64, denominator: u64) -> u64 {
    if denominator == 0 {
        return 0;
    }
    (numerator + denominator / 2) / denominator
}

const fn clamp_u16(value: u64) -> u16 {
    if value > u16::MAX as u64 {
        u16::MAX
    } else {
        value as u16
    }
}

/// Number of samples the chip should report across `distance_mm` at `cpi`.
///
/// Saturates at `u16::MAX`.
pub const fn samples_from_cpi(cpi: u16, distance_mm: u16) -> u16 {
    clamp_u16(divide_rounded(cpi as u64 * distance_mm as u64 * 10, 254))
}

/// The CPI that `samples` across `distance_mm` corresponds to.
///
/// Saturates at `u16::MAX`, and is 0 for a zero distance.
pub const fn cpi_from_samples(samples: u16, distance_mm: u16) -> u16 {
    clamp_u16(divide_rounded(samples as u64 * 254, distance_mm as u64 * 10))
}

/// Tally of one configuration pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfigSummary {
    /// Objects written successfully.
    pub written: u8,
    /// Objects whose read or write failed.
    pub failed: u8,
    /// Objects the chip does not have.
    pub skipped: u8,
}

impl ConfigSummary {
    fn record<E: core::fmt::Debug>(&mut self, object: &str, result: Result<(), Error<E>>) {
        match result {
            Ok(()) => self.written += 1,
            Err(Error::NotResolved) => {
                log::trace!("{object} not present, skipped");
                self.skipped += 1;
            }
            Err(err) => {
                log::warn!("{object} configuration failed: {err:?}");
                self.failed += 1;
            }
        }
    }
}

/// Writes the configuration of every object present in `table`.
///
/// Never stops early, see `ConfigSummary` for what happened.
pub async fn write_configuration<B: RegisterBus>(
    bus: &mut B,
    table: &ObjectTable,
    config: &Config,
    max_fingers: usize,
) -> ConfigSummary {
    let map = &table.addresses;
    let mut summary = ConfigSummary::default();
    summary.record("T7", write_power_config(bus, map, config).await);
    summary.record(
        "T8",
        write_default_record(bus, map, ObjectType::AcquisitionConfig).await,
    );
    summary.record("T46", write_default_record(bus, map, ObjectType::CteConfig).await);
    summary.record(
        "T100",
        write_touchscreen_config(bus, map, &table.info, config, max_fingers).await,
    );
    log::debug!("Configuration done: {summary:?}");
    summary
}

/// Sets acquisition intervals and enables pipelining in active and idle mode.
pub async fn write_power_config<B: RegisterBus>(
    bus: &mut B,
    map: &AddressMap,
    config: &Config,
) -> Result<(), Error<B::Error>> {
    let address = map
        .address(ObjectType::PowerConfig)
        .ok_or(Error::NotResolved)?;
    let record = [
        config.idle_acquisition_interval,
        config.active_acquisition_interval,
        config.active_to_idle_timeout,
        T7_CFG_ACTVPIPEEN | T7_CFG_IDLEPIPEEN,
    ];
    bus.write(address, &record).await.map_err(Error::Transport)
}

/// Writes an all default (zeroed) record over the object.
pub async fn write_default_record<B: RegisterBus>(
    bus: &mut B,
    map: &AddressMap,
    object_type: ObjectType,
) -> Result<(), Error<B::Error>> {
    let info = map.get(object_type).ok_or(Error::NotResolved)?;
    let record = [0u8; MAX_WRITE_LEN];
    bus.write(info.address, &record[..info.size.min(MAX_WRITE_LEN)])
        .await
        .map_err(Error::Transport)
}

/// Read-modify-write of the touchscreen object.
///
/// If the current record cannot be read nothing is written.
pub async fn write_touchscreen_config<B: RegisterBus>(
    bus: &mut B,
    map: &AddressMap,
    info: &InformationBlock,
    config: &Config,
    max_fingers: usize,
) -> Result<(), Error<B::Error>> {
    let address = touchscreen_address(map)?;
    let mut record = [0u8; T100_CONFIG_LEN];
    bus.read(address, &mut record)
        .await
        .map_err(Error::Transport)?;
    let num_touches = max_fingers.min(MAX_TOUCHES) as u8;
    patch_touchscreen_record(&mut record, info, config, num_touches);
    bus.write(address, &record).await.map_err(Error::Transport)
}

/// Rewrites only the reported X/Y range, for a CPI change at runtime.
///
/// X and Y are two separate writes. If the Y write fails the chip is left
/// with the new X range and the old Y range.
pub async fn write_touchscreen_range<B: RegisterBus>(
    bus: &mut B,
    map: &AddressMap,
    config: &Config,
) -> Result<(), Error<B::Error>> {
    let address = touchscreen_address(map)?;
    let (x_range, y_range) = ranges(config);
    bus.write(address.wrapping_add(T100_XRANGE as u16), &x_range.to_le_bytes())
        .await
        .map_err(Error::Transport)?;
    bus.write(address.wrapping_add(T100_YRANGE as u16), &y_range.to_le_bytes())
        .await
        .map_err(Error::Transport)
}

/// The T100 address, if the object is large enough to hold every field we patch.
fn touchscreen_address<E>(map: &AddressMap) -> Result<u16, Error<E>> {
    let info = map
        .get(ObjectType::MultipleTouchTouchscreen)
        .ok_or(Error::NotResolved)?;
    if info.size < T100_CONFIG_LEN {
        return Err(Error::ObjectTooSmall {
            size: info.size,
            needed: T100_CONFIG_LEN,
        });
    }
    Ok(info.address)
}

/// Asks the chip to recalibrate its sensor references.
pub async fn calibrate<B: RegisterBus>(
    bus: &mut B,
    map: &AddressMap,
) -> Result<(), Error<B::Error>> {
    command(bus, map, T6_CALIBRATE).await
}

/// Resets the chip. The object table stays valid across a reset.
pub async fn reset<B: RegisterBus>(bus: &mut B, map: &AddressMap) -> Result<(), Error<B::Error>> {
    command(bus, map, T6_RESET).await
}

async fn command<B: RegisterBus>(
    bus: &mut B,
    map: &AddressMap,
    offset: u16,
) -> Result<(), Error<B::Error>> {
    let address = map
        .address(ObjectType::CommandProcessor)
        .ok_or(Error::NotResolved)?;
    bus.write(address.wrapping_add(offset), &[T6_COMMAND])
        .await
        .map_err(Error::Transport)
}

/// The axes are switched in hardware, so X spans the sensor height.
fn ranges(config: &Config) -> (u16, u16) {
    (
        samples_from_cpi(config.cpi, config.sensor_height_mm),
        samples_from_cpi(config.cpi, config.sensor_width_mm),
    )
}

fn pitch(span_mm: u16, lines: u8) -> u8 {
    span_mm
        .checked_div(u16::from(lines))
        .map_or(0, |pitch| pitch.min(u16::from(u8::MAX)) as u8)
}

/// Applies `config` to a T100 record read from the chip.
pub fn patch_touchscreen_record(
    record: &mut [u8; T100_CONFIG_LEN],
    info: &InformationBlock,
    config: &Config,
    num_touches: u8,
) {
    let (x_size, y_size) = config
        .matrix_size
        .unwrap_or((info.matrix_x_size, info.matrix_y_size));
    let (x_range, y_range) = ranges(config);

    record[T100_CTRL] = T100_CTRL_RPTEN | T100_CTRL_ENABLE;
    record[T100_CFG1] = if config.invert_x {
        T100_CFG_SWITCHXY | T100_CFG_INVERTY
    } else {
        T100_CFG_SWITCHXY
    };
    record[T100_SCRAUX] = T100_SCRAUX_NUMTCH;
    record[T100_NUMTCH] = num_touches;
    record[T100_XSIZE] = x_size;
    record[T100_XPITCH] = pitch(config.sensor_width_mm, x_size);
    record[T100_YSIZE] = y_size;
    record[T100_YPITCH] = pitch(config.sensor_height_mm, y_size);
    record[T100_GAIN] = config.gain;
    record[T100_DXGAIN] = config.dx_gain;
    record[T100_TCHTHR] = config.touch_threshold;
    record[T100_MRGTHR] = config.merge_threshold;
    record[T100_MRGHYST] = config.merge_hysteresis;
    record[T100_MOVSMOOTH] = config.movement_smoothing;
    record[T100_MOVFILTER] = config.movement_filter & 0x0F;
    record[T100_XRANGE..T100_XRANGE + 2].copy_from_slice(&x_range.to_le_bytes());
    record[T100_YRANGE..T100_YRANGE + 2].copy_from_slice(&y_range.to_le_bytes());
    record[T100_MOVHYSTI..T100_MOVHYSTI + 2]
        .copy_from_slice(&config.movement_hysteresis_initial.to_le_bytes());
    record[T100_MOVHYSTN..T100_MOVHYSTN + 2]
        .copy_from_slice(&config.movement_hysteresis_next.to_le_bytes());
}
