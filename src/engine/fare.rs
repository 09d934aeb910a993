use serde::Serialize;

pub const DEFAULT_BASE_FARE: f64 = 5.0;
const PER_KM_RATE: f64 = 1.5;
const PER_HOUR_RATE: f64 = 10.0;

/// Rates applied when a trip completes: `base + km * per_km + hours * per_hour`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FareSchedule {
    pub base_fare: f64,
    pub per_km: f64,
    pub per_hour: f64,
}

impl FareSchedule {
    pub fn with_base_fare(base_fare: f64) -> Self {
        Self {
            base_fare: base_fare.max(0.0),
            ..Self::default()
        }
    }

    pub fn fare(&self, distance_km: f64, duration_hours: f64) -> f64 {
        let raw = self.base_fare
            + distance_km.max(0.0) * self.per_km
            + duration_hours.max(0.0) * self.per_hour;

        round_cents(raw)
    }
}

impl Default for FareSchedule {
    fn default() -> Self {
        Self {
            base_fare: DEFAULT_BASE_FARE,
            per_km: PER_KM_RATE,
            per_hour: PER_HOUR_RATE,
        }
    }
}

pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
