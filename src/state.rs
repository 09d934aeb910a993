use std::sync::Arc;

use crate::config::Config;
use crate::engine::dispatch::SearchDefaults;
use crate::engine::fare::FareSchedule;
use crate::notify::{NotificationSink, StoreNotificationSink};
use crate::observability::metrics::Metrics;
use crate::realtime::channel::LocationChannel;
use crate::store::Store;

pub struct AppState {
    pub store: Arc<Store>,
    pub notifier: Arc<dyn NotificationSink>,
    pub location_channel: LocationChannel,
    pub fares: FareSchedule,
    pub search: SearchDefaults,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        let store = Arc::new(Store::new());
        let notifier = Arc::new(StoreNotificationSink::new(store.clone()));
        Self::with_notifier(config, store, notifier)
    }

    pub fn with_notifier(
        config: &Config,
        store: Arc<Store>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            location_channel: LocationChannel::new(store.clone(), config.listener_buffer_size),
            store,
            notifier,
            fares: FareSchedule::with_base_fare(config.base_fare),
            search: SearchDefaults {
                radius_km: config.default_search_radius_km,
                radius_search_limit: config.radius_search_limit,
            },
            metrics: Metrics::new(),
        }
    }
}
