use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use skygrid_shared::{Resource, ResourceMetrics};
use tracing::debug;
use uuid::Uuid;

/// Orders resource columns for display.
///
/// Total order: ascending explicit priority (missing sorts last), ties
/// broken by descending current-day booking count, then descending
/// open-slot count, then case-insensitive display name.
///
/// Memoized for reference stability: if the computed order is equal
/// (resource content included) to the previous call's result, the same
/// `Arc` is handed back, so consumers comparing with `Arc::ptr_eq` can
/// skip re-rendering.
#[derive(Default)]
pub struct ResourceRanker {
    cached: Option<Arc<Vec<Resource>>>,
}

impl ResourceRanker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rank(
        &mut self,
        resources: &[Resource],
        metrics: &HashMap<Uuid, ResourceMetrics>,
    ) -> Arc<Vec<Resource>> {
        let mut ordered: Vec<Resource> = resources.to_vec();
        ordered.sort_by(|a, b| Self::compare(a, b, metrics));

        if let Some(cached) = &self.cached {
            if cached.as_ref() == &ordered {
                debug!("ranking unchanged, reusing previous order");
                return Arc::clone(cached);
            }
        }

        let fresh = Arc::new(ordered);
        self.cached = Some(Arc::clone(&fresh));
        fresh
    }

    fn compare(a: &Resource, b: &Resource, metrics: &HashMap<Uuid, ResourceMetrics>) -> Ordering {
        let ma = metrics.get(&a.id).copied().unwrap_or_default();
        let mb = metrics.get(&b.id).copied().unwrap_or_default();

        a.priority
            .unwrap_or(u32::MAX)
            .cmp(&b.priority.unwrap_or(u32::MAX))
            .then_with(|| mb.bookings_today.cmp(&ma.bookings_today))
            .then_with(|| mb.open_slots_today.cmp(&ma.open_slots_today))
            .then_with(|| {
                a.display_name
                    .to_lowercase()
                    .cmp(&b.display_name.to_lowercase())
            })
    }
}
