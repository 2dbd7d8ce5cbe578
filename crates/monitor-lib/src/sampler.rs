//! Sample sources and boundary validation
//!
//! The monitor consumes `(metric, value)` readings from an injected
//! `SampleSource`. Readings are validated here, before they reach the
//! history, so the evaluator can assume a well-formed time-ordered stream.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::Mutex;

use crate::error::SampleError;
use crate::models::{DeviceTelemetry, MetricKind, MetricReading, Sample};

/// Probability that a simulated round carries a fault scenario
const DEFAULT_CRITICAL_PROBABILITY: f64 = 0.2;

/// Producer of metric readings
#[async_trait]
pub trait SampleSource: Send + Sync {
    /// Produce the next reading
    async fn next_sample(&self) -> Result<MetricReading, SampleError>;

    /// Device housekeeping data, for sources that report it
    async fn telemetry(&self, _now: DateTime<Utc>) -> Option<DeviceTelemetry> {
        None
    }
}

/// Rejects malformed readings at ingestion
#[derive(Debug, Default)]
pub struct SampleValidator {
    last_seen: HashMap<MetricKind, DateTime<Utc>>,
}

impl SampleValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check a reading stamped at `timestamp` and remember it if accepted
    pub fn validate(
        &mut self,
        reading: MetricReading,
        timestamp: DateTime<Utc>,
    ) -> Result<Sample, SampleError> {
        if !reading.value.is_finite() {
            return Err(SampleError::NonFinite {
                metric: reading.metric,
                value: reading.value,
            });
        }

        if let Some(previous) = self.last_seen.get(&reading.metric) {
            if timestamp <= *previous {
                return Err(SampleError::OutOfOrder {
                    metric: reading.metric,
                    timestamp,
                    previous: *previous,
                });
            }
        }

        self.last_seen.insert(reading.metric, timestamp);
        Ok(reading.at(timestamp))
    }
}

/// Fault conditions injected by the simulator
#[derive(Debug, Clone, Copy, PartialEq)]
enum Scenario {
    HighTemperature,
    LowTemperature,
    HighCo2,
}

impl Scenario {
    const ALL: [Scenario; 3] = [
        Scenario::HighTemperature,
        Scenario::LowTemperature,
        Scenario::HighCo2,
    ];

    /// Temperature, humidity and CO2 for the whole round
    fn readings(&self) -> [f64; 3] {
        match self {
            Scenario::HighTemperature => [41.2, 58.0, 450.0],
            Scenario::LowTemperature => [34.1, 62.0, 480.0],
            Scenario::HighCo2 => [37.8, 59.0, 650.0],
        }
    }

    fn value(&self, metric: MetricKind) -> f64 {
        let [temperature, humidity, co2] = self.readings();
        match metric {
            MetricKind::Temperature => temperature,
            MetricKind::Humidity => humidity,
            MetricKind::Co2 => co2,
        }
    }
}

struct SimulatorState {
    rng: StdRng,
    position: usize,
    scenario: Option<Scenario>,
}

/// Synthetic incubator readings
///
/// Cycles temperature, humidity, CO2. Each cycle may carry one fault
/// scenario that replaces the whole round.
pub struct SimulatedSource {
    state: Mutex<SimulatorState>,
    critical_probability: f64,
}

impl SimulatedSource {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            state: Mutex::new(SimulatorState {
                rng,
                position: 0,
                scenario: None,
            }),
            critical_probability: DEFAULT_CRITICAL_PROBABILITY,
        }
    }

    /// Set the probability of a fault scenario per cycle, clamped to [0, 1]
    ///
    /// NaN disables fault scenarios.
    pub fn with_critical_probability(mut self, probability: f64) -> Self {
        self.critical_probability = if probability.is_nan() {
            0.0
        } else {
            probability.clamp(0.0, 1.0)
        };
        self
    }

    pub fn critical_probability(&self) -> f64 {
        self.critical_probability
    }

    fn normal_value(rng: &mut StdRng, metric: MetricKind) -> f64 {
        match metric {
            MetricKind::Temperature => 37.5 + (rng.gen::<f64>() - 0.5) * 0.2,
            MetricKind::Humidity => 60.0 + (rng.gen::<f64>() - 0.5) * 4.0,
            MetricKind::Co2 => 350.0 + rng.gen::<f64>() * 200.0,
        }
    }
}

#[async_trait]
impl SampleSource for SimulatedSource {
    async fn next_sample(&self) -> Result<MetricReading, SampleError> {
        let mut state = self.state.lock().await;

        if state.position == 0 {
            state.scenario = if state.rng.gen_bool(self.critical_probability) {
                let index = state.rng.gen_range(0..Scenario::ALL.len());
                Some(Scenario::ALL[index])
            } else {
                None
            };
        }

        let metric = MetricKind::ALL[state.position];
        state.position = (state.position + 1) % MetricKind::ALL.len();

        let value = match state.scenario {
            Some(scenario) => scenario.value(metric),
            None => Self::normal_value(&mut state.rng, metric),
        };

        Ok(MetricReading::new(metric, value))
    }

    async fn telemetry(&self, now: DateTime<Utc>) -> Option<DeviceTelemetry> {
        let mut state = self.state.lock().await;
        let rng = &mut state.rng;

        let rotated_secs_ago = (rng.gen::<f64>() * 3600.0) as i64;
        Some(DeviceTelemetry {
            battery_level: 85.0 + rng.gen::<f64>() * 15.0,
            wifi_strength: 75.0 + rng.gen::<f64>() * 25.0,
            last_rotation: now - chrono::Duration::seconds(rotated_secs_ago),
        })
    }
}

/// Replays a fixed sequence of readings, then reports exhaustion
pub struct ScriptedSource {
    readings: Mutex<VecDeque<Result<MetricReading, SampleError>>>,
}

impl ScriptedSource {
    pub fn new(readings: impl IntoIterator<Item = MetricReading>) -> Self {
        Self::with_results(readings.into_iter().map(Ok))
    }

    /// Script that can also inject source errors
    pub fn with_results(
        results: impl IntoIterator<Item = Result<MetricReading, SampleError>>,
    ) -> Self {
        Self {
            readings: Mutex::new(results.into_iter().collect()),
        }
    }

    pub async fn remaining(&self) -> usize {
        self.readings.lock().await.len()
    }
}

#[async_trait]
impl SampleSource for ScriptedSource {
    async fn next_sample(&self) -> Result<MetricReading, SampleError> {
        self.readings
            .lock()
            .await
            .pop_front()
            .unwrap_or(Err(SampleError::Exhausted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_validator_rejects_non_finite() {
        let mut validator = SampleValidator::new();
        let err = validator
            .validate(MetricReading::new(MetricKind::Co2, f64::NAN), t0())
            .unwrap_err();
        assert!(matches!(err, SampleError::NonFinite { metric: MetricKind::Co2, .. }));
    }

    #[test]
    fn test_validator_rejects_out_of_order_per_metric() {
        let mut validator = SampleValidator::new();
        let temp = MetricReading::new(MetricKind::Temperature, 37.5);
        let co2 = MetricReading::new(MetricKind::Co2, 450.0);

        assert!(validator.validate(temp, t0()).is_ok());
        // Same instant for another metric is fine
        assert!(validator.validate(co2, t0()).is_ok());
        // Same metric must move forward
        assert!(matches!(
            validator.validate(temp, t0()),
            Err(SampleError::OutOfOrder { .. })
        ));
        assert!(validator.validate(temp, t0() - Duration::seconds(5)).is_err());

        let sample = validator.validate(temp, t0() + Duration::seconds(5)).unwrap();
        assert_eq!(sample.timestamp, t0() + Duration::seconds(5));
    }

    #[tokio::test]
    async fn test_simulated_source_cycles_metrics() {
        let source = SimulatedSource::new(Some(7)).with_critical_probability(0.0);

        let mut metrics = Vec::new();
        for _ in 0..6 {
            let reading = source.next_sample().await.unwrap();
            metrics.push(reading.metric);
            match reading.metric {
                MetricKind::Temperature => assert!((37.4..=37.6).contains(&reading.value)),
                MetricKind::Humidity => assert!((58.0..=62.0).contains(&reading.value)),
                MetricKind::Co2 => assert!((350.0..=550.0).contains(&reading.value)),
            }
        }

        assert_eq!(
            metrics,
            vec![
                MetricKind::Temperature,
                MetricKind::Humidity,
                MetricKind::Co2,
                MetricKind::Temperature,
                MetricKind::Humidity,
                MetricKind::Co2,
            ]
        );
    }

    #[tokio::test]
    async fn test_simulated_source_always_faulty() {
        let source = SimulatedSource::new(Some(42)).with_critical_probability(1.0);

        for _ in 0..30 {
            let temperature = source.next_sample().await.unwrap();
            let _humidity = source.next_sample().await.unwrap();
            let co2 = source.next_sample().await.unwrap();

            let faulty = temperature.value == 41.2 || temperature.value == 34.1 || co2.value == 650.0;
            assert!(faulty, "cycle without fault: {temperature:?} {co2:?}");
        }
    }

    #[tokio::test]
    async fn test_fault_scenario_replaces_whole_round() {
        let source = SimulatedSource::new(Some(5)).with_critical_probability(1.0);

        for _ in 0..30 {
            let round = [
                source.next_sample().await.unwrap().value,
                source.next_sample().await.unwrap().value,
                source.next_sample().await.unwrap().value,
            ];
            assert!(
                round == [41.2, 58.0, 450.0]
                    || round == [34.1, 62.0, 480.0]
                    || round == [37.8, 59.0, 650.0],
                "unexpected round: {round:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_nan_probability_disables_faults() {
        let source = SimulatedSource::new(Some(1)).with_critical_probability(f64::NAN);
        assert_eq!(source.critical_probability(), 0.0);

        for _ in 0..9 {
            let reading = source.next_sample().await.unwrap();
            if reading.metric == MetricKind::Temperature {
                assert!((37.4..=37.6).contains(&reading.value));
            }
        }

        let high = SimulatedSource::new(Some(1)).with_critical_probability(7.0);
        assert_eq!(high.critical_probability(), 1.0);
    }

    #[tokio::test]
    async fn test_simulated_telemetry_ranges() {
        let source = SimulatedSource::new(Some(3));
        let device = source.telemetry(t0()).await.unwrap();

        assert!((85.0..=100.0).contains(&device.battery_level));
        assert!((75.0..=100.0).contains(&device.wifi_strength));
        assert!(device.last_rotation <= t0());
        assert!(device.last_rotation >= t0() - Duration::hours(1));

        let scripted = ScriptedSource::new([]);
        assert!(scripted.telemetry(t0()).await.is_none());
    }

    #[tokio::test]
    async fn test_seeded_simulation_is_deterministic() {
        let a = SimulatedSource::new(Some(99));
        let b = SimulatedSource::new(Some(99));

        for _ in 0..12 {
            assert_eq!(a.next_sample().await.unwrap(), b.next_sample().await.unwrap());
        }
    }

    #[test]
    fn test_scripted_source_exhausts() {
        let source = ScriptedSource::new([MetricReading::new(MetricKind::Co2, 650.0)]);

        tokio_test::block_on(async {
            assert_eq!(source.remaining().await, 1);
            assert_eq!(source.next_sample().await.unwrap().value, 650.0);
            assert_eq!(source.next_sample().await, Err(SampleError::Exhausted));
        });
    }
}
