//! The three moving-average slots shown by the viewer.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    error::PlayerError,
    indicators::moving_average::{MaKind, MovingAverageSpec},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotName {
    Short,
    Medium,
    Long,
}

impl SlotName {
    pub const ALL: [SlotName; 3] = [SlotName::Short, SlotName::Medium, SlotName::Long];
}

impl fmt::Display for SlotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SlotName::Short => "short",
            SlotName::Medium => "medium",
            SlotName::Long => "long",
        })
    }
}

/// User-facing settings of one slot; validated on use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MovingAverageSlot {
    pub enabled: bool,
    pub kind: MaKind,
    pub period: u16,
}

impl MovingAverageSlot {
    pub const fn new(enabled: bool, kind: MaKind, period: u16) -> Self {
        Self {
            enabled,
            kind,
            period,
        }
    }

    pub fn spec(&self) -> Result<MovingAverageSpec, PlayerError> {
        MovingAverageSpec::new(self.kind, self.period)
    }
}

/// Exactly three moving-average slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MovingAverageConfig {
    pub short: MovingAverageSlot,
    pub medium: MovingAverageSlot,
    pub long: MovingAverageSlot,
}

impl Default for MovingAverageConfig {
    fn default() -> Self {
        Self {
            short: MovingAverageSlot::new(true, MaKind::Sma, 20),
            medium: MovingAverageSlot::new(true, MaKind::Sma, 50),
            long: MovingAverageSlot::new(false, MaKind::Ema, 200),
        }
    }
}

impl MovingAverageConfig {
    /// All slots disabled.
    pub fn none() -> Self {
        let mut cfg = Self::default();
        for name in SlotName::ALL {
            cfg.slot_mut(name).enabled = false;
        }
        cfg
    }

    pub fn slot(&self, name: SlotName) -> &MovingAverageSlot {
        match name {
            SlotName::Short => &self.short,
            SlotName::Medium => &self.medium,
            SlotName::Long => &self.long,
        }
    }

    pub fn slot_mut(&mut self, name: SlotName) -> &mut MovingAverageSlot {
        match name {
            SlotName::Short => &mut self.short,
            SlotName::Medium => &mut self.medium,
            SlotName::Long => &mut self.long,
        }
    }

    /// Checks every slot, enabled or not, so a config cannot hide an invalid
    /// period until the slot is switched on.
    pub fn validate(&self) -> Result<(), PlayerError> {
        SlotName::ALL
            .iter()
            .try_for_each(|&name| self.slot(name).spec().map(|_| ()))
    }

    /// Enabled slots in display order with their overlay labels.
    pub fn active(&self) -> Result<Vec<(String, MovingAverageSpec)>, PlayerError> {
        SlotName::ALL
            .iter()
            .filter(|&&name| self.slot(name).enabled)
            .map(|&name| {
                let spec = self.slot(name).spec()?;
                Ok((label(name, &spec), spec))
            })
            .collect()
    }
}

/// Overlay label of a slot, e.g. `"short SMA(20)"`.
pub fn label(name: SlotName, spec: &MovingAverageSpec) -> String {
    format!("{name} {spec}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_two_active_slots() {
        let active = MovingAverageConfig::default().active().unwrap();
        let labels: Vec<_> = active.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(labels, ["short SMA(20)", "medium SMA(50)"]);
    }

    #[test]
    fn none_has_no_active_slots() {
        assert!(MovingAverageConfig::none().active().unwrap().is_empty());
    }

    #[test]
    fn invalid_disabled_slot_fails_validation_but_not_activation() {
        let mut cfg = MovingAverageConfig::default();
        cfg.long = MovingAverageSlot::new(false, MaKind::Ema, 500);
        assert_eq!(cfg.validate(), Err(PlayerError::InvalidPeriod(500)));
        assert_eq!(cfg.active().unwrap().len(), 2);
    }

    #[test]
    fn deserializes_partial_toml() {
        let cfg: MovingAverageConfig = toml::from_str(
            r#"
            [long]
            enabled = true
            kind = "vwma"
            period = 150
            "#,
        )
        .unwrap();
        assert_eq!(cfg.short, MovingAverageConfig::default().short);
        assert_eq!(cfg.long, MovingAverageSlot::new(true, MaKind::Vwma, 150));
    }
}
