//! Wrapper for sensor configuration parameters.

/// Counts per inch used until told otherwise.
pub const DEFAULT_CPI: u16 = 600;

/// Parameters pushed to the chip by `write_configuration`.
///
/// Use `Config::new` with the physical sensor size, then adjust fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Physical width of the sensor in millimetres.
    pub sensor_width_mm: u16,
    /// Physical height of the sensor in millimetres.
    pub sensor_height_mm: u16,
    /// Reported resolution in counts per inch.
    pub cpi: u16,
    /// Matrix size actually wired up, as (X lines, Y lines).
    /// Set to `None` to use every line the information block reports.
    pub matrix_size: Option<(u8, u8)>,
    /// Invert the reported X axis (on top of the hardware XY switch).
    pub invert_x: bool,
    /// Single transmit gain for mutual capacitance measurements.
    pub gain: u8,
    /// Dual transmit gain. 255 lets the chip calibrate it.
    pub dx_gain: u8,
    /// Touch threshold.
    pub touch_threshold: u8,
    /// Merge threshold.
    pub merge_threshold: u8,
    /// Merge threshold hysteresis.
    pub merge_hysteresis: u8,
    /// Movement smoothing, tails off at higher speeds.
    pub movement_smoothing: u8,
    /// Speed response of the movement filter. Only the low nibble is used.
    pub movement_filter: u8,
    /// Initial movement hysteresis.
    pub movement_hysteresis_initial: u16,
    /// Next movement hysteresis.
    pub movement_hysteresis_next: u16,
    /// Acquisition interval while idle.
    pub idle_acquisition_interval: u8,
    /// Acquisition interval while active.
    pub active_acquisition_interval: u8,
    /// Timeout for falling back from active to idle.
    pub active_to_idle_timeout: u8,
}

impl Config {
    /// A configuration for a sensor of the given size with default tuning.
    pub const fn new(sensor_width_mm: u16, sensor_height_mm: u16) -> Self {
        Self {
            sensor_width_mm,
            sensor_height_mm,
            cpi: DEFAULT_CPI,
            matrix_size: None,
            invert_x: false,
            gain: 4,
            dx_gain: 255,
            touch_threshold: 18,
            merge_threshold: 5,
            merge_hysteresis: 5,
            movement_smoothing: 224,
            movement_filter: 4,
            movement_hysteresis_initial: 6,
            movement_hysteresis_next: 4,
            idle_acquisition_interval: 32,
            active_acquisition_interval: 10,
            active_to_idle_timeout: 50,
        }
    }
}
