use crate::aggregation::{DateRange, WeekTieBreak};
use crate::datamodel::{MetricName, MetricSelection};
use crate::error::MachineViewError;
use anyhow::Error;
use confique::Config;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, OnceLock};
use time::UtcOffset;

#[derive(Debug, Config)]
pub struct MachineViewConfig {
    /// Metric channels offered by the dashboard, in display order.
    #[config(
        env = "MACHINEVIEW_METRICS",
        parse_env = confique::env::parse::list_by_comma,
        default = [
            "G19",
            "G26",
            "MISFAT_3_Compresseur_3",
            "MISFAT_3_G39f",
            "MISFAT_3_D18f",
            "MISFAT_3_G10f",
            "MISFAT_3_TGBT_N3f"
        ]
    )]
    pub metrics: Vec<String>,

    /// Offset of the plant's local time from UTC, in minutes.
    #[config(env = "MACHINEVIEW_UTC_OFFSET_MINUTES", default = 0)]
    pub utc_offset_minutes: i32,

    #[config(env = "MACHINEVIEW_DEFAULT_DATE_RANGE", default = "30d")]
    pub default_date_range: String,

    #[config(env = "MACHINEVIEW_MAX_RENDER_POINTS", default = 1000)]
    pub max_render_points: usize,

    #[config(env = "MACHINEVIEW_HISTOGRAM_BINS", default = 10)]
    pub histogram_bins: usize,

    #[config(env = "MACHINEVIEW_MOVING_AVERAGE_WINDOW", default = 7)]
    pub moving_average_window: usize,

    #[config(env = "MACHINEVIEW_ANOMALY_THRESHOLD", default = 0.75)]
    pub anomaly_threshold: f64,

    #[config(env = "MACHINEVIEW_WEEKDAY", default = 1)]
    pub weekday: u8,

    #[config(env = "MACHINEVIEW_WEEKDAY_TIE_BREAK", default = "latest")]
    pub weekday_tie_break: String,
}

impl MachineViewConfig {
    pub fn load() -> Result<MachineViewConfig, Error> {
        let c = MachineViewConfig::builder()
            .env()
            .file("settings.toml")
            .load()?;

        Ok(c)
    }

    pub fn metric_selection(&self) -> crate::error::Result<MetricSelection> {
        self.metrics
            .iter()
            .map(|name| MetricName::new(name.trim()))
            .collect()
    }

    pub fn utc_offset(&self) -> crate::error::Result<UtcOffset> {
        let seconds = self.utc_offset_minutes.checked_mul(60).ok_or_else(|| {
            MachineViewError::Configuration(format!(
                "UTC offset out of range: {} minutes",
                self.utc_offset_minutes
            ))
        })?;
        UtcOffset::from_whole_seconds(seconds).map_err(|e| {
            MachineViewError::Configuration(format!(
                "UTC offset out of range: {} minutes ({})",
                self.utc_offset_minutes, e
            ))
        })
    }

    pub fn date_range(&self) -> DateRange {
        DateRange::parse(&self.default_date_range)
    }

    pub fn histogram_bins(&self) -> crate::error::Result<NonZeroUsize> {
        NonZeroUsize::new(self.histogram_bins).ok_or_else(|| {
            MachineViewError::Configuration("Histogram needs at least one bin".to_string())
        })
    }

    pub fn anomaly_threshold(&self) -> crate::error::Result<f64> {
        if self.anomaly_threshold.is_finite() && self.anomaly_threshold > 0.0 {
            Ok(self.anomaly_threshold)
        } else {
            Err(MachineViewError::Configuration(format!(
                "Anomaly threshold must be positive, got {}",
                self.anomaly_threshold
            )))
        }
    }

    pub fn weekday(&self) -> crate::error::Result<u8> {
        if self.weekday <= 6 {
            Ok(self.weekday)
        } else {
            Err(MachineViewError::InvalidWeekday(self.weekday))
        }
    }

    pub fn tie_break(&self) -> crate::error::Result<WeekTieBreak> {
        self.weekday_tie_break.parse()
    }
}

static MACHINEVIEW_CONFIG: OnceLock<Arc<MachineViewConfig>> = OnceLock::new();

pub fn get() -> Result<Arc<MachineViewConfig>, Error> {
    MACHINEVIEW_CONFIG.get().cloned().ok_or_else(|| {
        Error::msg(
            "Configuration not loaded. Please call load_configuration() before using the configuration",
        )
    })
}

pub fn load_configuration() -> Result<(), Error> {
    if MACHINEVIEW_CONFIG.get().is_some() {
        return Ok(());
    }

    let config = MachineViewConfig::load()?;
    MACHINEVIEW_CONFIG.get_or_init(|| Arc::new(config));

    Ok(())
}

#[allow(dead_code)] // Used by integration tests
static TEST_CONFIG_INIT: Mutex<()> = Mutex::new(());

/// Loads the default configuration once per test binary.
#[allow(dead_code)] // Used by integration tests
pub fn load_configuration_for_tests() -> Result<(), Error> {
    let _guard = TEST_CONFIG_INIT
        .lock()
        .map_err(|e| Error::msg(format!("Configuration lock poisoned: {}", e)))?;

    if MACHINEVIEW_CONFIG.get().is_some() {
        return Ok(());
    }

    let config = MachineViewConfig::load()?;
    MACHINEVIEW_CONFIG.get_or_init(|| Arc::new(config));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use time::macros::offset;

    #[test]
    #[serial]
    fn test_load_config() {
        let config = MachineViewConfig::load().unwrap();

        assert_eq!(config.metrics.len(), 7);
        assert_eq!(config.metrics[0], "G19");
        assert_eq!(config.max_render_points, 1000);
        assert_eq!(config.date_range(), DateRange::Last30Days);
        assert_eq!(config.utc_offset().unwrap(), UtcOffset::UTC);
        assert_eq!(config.histogram_bins().unwrap().get(), 10);
        assert_eq!(config.anomaly_threshold().unwrap(), 0.75);
        assert_eq!(config.weekday().unwrap(), 1);
        assert_eq!(config.tie_break().unwrap(), WeekTieBreak::Latest);

        temp_env::with_var("MACHINEVIEW_MAX_RENDER_POINTS", Some("250"), || {
            let config = MachineViewConfig::load().unwrap();
            assert_eq!(config.max_render_points, 250);
        });
    }

    #[test]
    #[serial]
    fn test_metrics_from_env() {
        temp_env::with_var("MACHINEVIEW_METRICS", Some("G19, G26"), || {
            let config = MachineViewConfig::load().unwrap();
            let selection = config.metric_selection().unwrap();
            assert_eq!(selection.len(), 2);
            assert_eq!(selection[1].as_str(), "G26");
        });

        temp_env::with_var("MACHINEVIEW_METRICS", Some("G19,Timestamp"), || {
            let config = MachineViewConfig::load().unwrap();
            assert!(config.metric_selection().is_err());
        });
    }

    #[test]
    #[serial]
    fn test_invalid_values() {
        temp_env::with_var("MACHINEVIEW_UTC_OFFSET_MINUTES", Some("120"), || {
            let config = MachineViewConfig::load().unwrap();
            assert_eq!(config.utc_offset().unwrap(), offset!(+2));
        });

        temp_env::with_var("MACHINEVIEW_UTC_OFFSET_MINUTES", Some("100000"), || {
            let config = MachineViewConfig::load().unwrap();
            assert!(config.utc_offset().is_err());
        });

        temp_env::with_var("MACHINEVIEW_HISTOGRAM_BINS", Some("0"), || {
            let config = MachineViewConfig::load().unwrap();
            assert!(config.histogram_bins().is_err());
        });

        temp_env::with_var("MACHINEVIEW_ANOMALY_THRESHOLD", Some("-1"), || {
            let config = MachineViewConfig::load().unwrap();
            assert!(config.anomaly_threshold().is_err());
        });

        temp_env::with_var("MACHINEVIEW_WEEKDAY", Some("9"), || {
            let config = MachineViewConfig::load().unwrap();
            assert!(config.weekday().is_err());
        });

        temp_env::with_var("MACHINEVIEW_WEEKDAY_TIE_BREAK", Some("median"), || {
            let config = MachineViewConfig::load().unwrap();
            assert!(config.tie_break().is_err());
        });

        temp_env::with_var("MACHINEVIEW_DEFAULT_DATE_RANGE", Some("2w"), || {
            let config = MachineViewConfig::load().unwrap();
            assert_eq!(config.date_range(), DateRange::Last24Hours);
        });
    }

    #[test]
    #[serial]
    fn test_load_configuration() {
        load_configuration().unwrap();
        assert!(MACHINEVIEW_CONFIG.get().is_some());

        let config = get().unwrap();
        assert_eq!(config.histogram_bins, 10);
    }
}
