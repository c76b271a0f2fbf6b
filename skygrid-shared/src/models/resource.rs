use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What kind of schedulable entity a column represents
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceKind {
    Pilot,
    Vehicle,
}

/// Capability flags attached to a resource profile
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceFlags {
    #[serde(default)]
    pub female_certified: bool,
    #[serde(default)]
    pub tandem_certified: bool,
}

/// A schedulable grid column (pilot or vehicle).
///
/// Created externally by profile registration; the engine only reorders
/// and annotates it, never deletes it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Resource {
    pub id: Uuid,
    pub display_name: String,
    pub kind: ResourceKind,
    pub flags: ResourceFlags,
    /// Explicit ordering hint; lower sorts first, missing sorts last.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,
}

impl Resource {
    pub fn new(display_name: String, kind: ResourceKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            display_name,
            kind,
            flags: ResourceFlags::default(),
            priority: None,
        }
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = Some(priority);
        self
    }
}

/// Per-day derived metrics, recomputed every render cycle
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceMetrics {
    pub bookings_today: u32,
    pub open_slots_today: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_defaults() {
        let resource = Resource::new("Mira".to_string(), ResourceKind::Pilot);

        assert_eq!(resource.priority, None);
        assert!(!resource.flags.female_certified);

        let ranked = resource.with_priority(1);
        assert_eq!(ranked.priority, Some(1));
    }
}
