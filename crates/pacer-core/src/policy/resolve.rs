//! Resolve family settings plus overlay into a `ConcurrencyPolicy`.

use crate::config::{ConcurrencyConfig, EnforcementOverlay, FamilyConcurrency};
use crate::job::Family;

use super::coerce::{to_bool, to_count, to_seconds};
use super::ConcurrencyPolicy;

/// Effective policy for `family`. Never fails.
pub fn resolve(config: &ConcurrencyConfig, family: Family) -> ConcurrencyPolicy {
    let local = match config.family(family) {
        Some(settings) => match local_policy(settings) {
            Some(policy) => policy,
            None => {
                tracing::warn!(%family, "invalid concurrency settings, using conservative defaults");
                return ConcurrencyPolicy::conservative();
            }
        },
        None => ConcurrencyPolicy::conservative(),
    };
    match &config.overlay {
        Some(overlay) => tighten(local, overlay, family),
        None => local,
    }
}

/// Policies for every family, in `Family::ALL` order.
pub fn resolve_all(config: &ConcurrencyConfig) -> Vec<(Family, ConcurrencyPolicy)> {
    Family::ALL
        .iter()
        .map(|family| (*family, resolve(config, *family)))
        .collect()
}

/// Absent keys take the conservative value; a present key that does not
/// coerce invalidates the whole family.
fn local_policy(settings: &FamilyConcurrency) -> Option<ConcurrencyPolicy> {
    let defaults = ConcurrencyPolicy::conservative();
    let enabled = match &settings.enabled {
        Some(v) => to_bool(v)?,
        None => defaults.enabled,
    };
    let max_concurrency = match &settings.max_concurrency {
        Some(v) => to_count(v)?,
        None => defaults.max_concurrency,
    };
    let launch_delay_seconds = match &settings.launch_delay_seconds {
        Some(v) => to_seconds(v)?,
        None => defaults.launch_delay_seconds,
    };
    Some(ConcurrencyPolicy::new(enabled, max_concurrency, launch_delay_seconds))
}

/// Apply the overlay when it is enforced. It can lower the cap and raise the
/// delay, never the reverse. An enforced overlay with a field that does not
/// coerce gives the conservative policy.
fn tighten(local: ConcurrencyPolicy, overlay: &EnforcementOverlay, family: Family) -> ConcurrencyPolicy {
    let enforce = overlay.enforce.as_ref().and_then(to_bool).unwrap_or(false);
    if !enforce {
        return local;
    }
    let cap = match overlay.max_concurrency_cap.as_ref().map(to_count) {
        Some(None) => {
            tracing::warn!(%family, "invalid overlay max_concurrency_cap, using conservative defaults");
            return ConcurrencyPolicy::conservative();
        }
        Some(cap) => cap,
        None => None,
    };
    let min_delay = match overlay.launch_delay_seconds_min.as_ref().map(to_seconds) {
        Some(None) => {
            tracing::warn!(%family, "invalid overlay launch_delay_seconds_min, using conservative defaults");
            return ConcurrencyPolicy::conservative();
        }
        Some(min) => min,
        None => None,
    };
    let policy = ConcurrencyPolicy::new(
        local.enabled,
        cap.map_or(local.max_concurrency, |cap| local.max_concurrency.min(cap)),
        min_delay.map_or(local.launch_delay_seconds, |min| local.launch_delay_seconds.max(min)),
    );
    if policy != local {
        tracing::debug!(%family, ?local, ?policy, "enforcement overlay tightened policy");
    }
    policy
}

#[cfg(test)]
mod tests {
    use super::*;
    use toml::Value;

    fn config_with(family: Family, settings: FamilyConcurrency) -> ConcurrencyConfig {
        let mut cfg = ConcurrencyConfig::default();
        cfg.set_family(family, settings);
        cfg
    }

    #[test]
    fn missing_family_is_conservative() {
        let cfg = ConcurrencyConfig::default();
        assert_eq!(resolve(&cfg, Family::Tiered), ConcurrencyPolicy::conservative());
    }

    #[test]
    fn reads_local_settings() {
        let cfg = config_with(Family::Independent, FamilyConcurrency::new(true, 5, 0.75));
        let policy = resolve(&cfg, Family::Independent);
        assert!(policy.enabled);
        assert_eq!(policy.max_concurrency, 5);
        assert!((policy.launch_delay_seconds - 0.75).abs() < 1e-9);
    }

    #[test]
    fn coerces_string_values() {
        let settings = FamilyConcurrency {
            enabled: Some(Value::String("on".into())),
            max_concurrency: Some(Value::String("3".into())),
            launch_delay_seconds: Some(Value::String("1.5".into())),
        };
        let policy = resolve(&config_with(Family::FirstDependent, settings), Family::FirstDependent);
        assert_eq!(policy, ConcurrencyPolicy::new(true, 3, 1.5));
    }

    #[test]
    fn coercion_failure_falls_back_to_conservative() {
        let settings = FamilyConcurrency {
            enabled: Some(Value::Boolean(true)),
            max_concurrency: Some(Value::String("lots".into())),
            launch_delay_seconds: Some(Value::Float(0.1)),
        };
        let policy = resolve(&config_with(Family::Tiered, settings), Family::Tiered);
        assert_eq!(policy, ConcurrencyPolicy::conservative());
    }

    #[test]
    fn overlay_caps_concurrency_and_raises_delay() {
        let mut cfg = config_with(Family::Tiered, FamilyConcurrency::new(true, 10, 0.0));
        cfg.overlay = Some(EnforcementOverlay::new(true, 3, 2.0));
        let policy = resolve(&cfg, Family::Tiered);
        assert_eq!(policy.max_concurrency, 3);
        assert!((policy.launch_delay_seconds - 2.0).abs() < 1e-9);
        assert!(policy.enabled);
    }

    #[test]
    fn overlay_never_loosens() {
        let mut cfg = config_with(Family::Tiered, FamilyConcurrency::new(true, 2, 5.0));
        cfg.overlay = Some(EnforcementOverlay::new(true, 8, 1.0));
        let policy = resolve(&cfg, Family::Tiered);
        assert_eq!(policy.max_concurrency, 2);
        assert!((policy.launch_delay_seconds - 5.0).abs() < 1e-9);
    }

    #[test]
    fn overlay_ignored_unless_enforced() {
        let mut cfg = config_with(Family::Tiered, FamilyConcurrency::new(true, 10, 0.0));
        cfg.overlay = Some(EnforcementOverlay::new(false, 1, 9.0));
        assert_eq!(resolve(&cfg, Family::Tiered), ConcurrencyPolicy::new(true, 10, 0.0));
    }

    #[test]
    fn overlay_cap_holds_for_every_requested_value() {
        for requested in 1..=20 {
            for cap in 1..=6 {
                let mut cfg = config_with(
                    Family::SecondDependent,
                    FamilyConcurrency::new(true, requested, 0.0),
                );
                cfg.overlay = Some(EnforcementOverlay::new(true, cap, 0.5));
                let policy = resolve(&cfg, Family::SecondDependent);
                assert!(policy.max_concurrency as i64 <= cap);
                assert!(policy.launch_delay_seconds >= 0.5);
            }
        }
    }

    #[test]
    fn invalid_enforced_overlay_is_conservative() {
        let mut cfg = config_with(Family::Tiered, FamilyConcurrency::new(true, 6, 0.0));
        cfg.overlay = Some(EnforcementOverlay {
            enforce: Some(Value::Boolean(true)),
            max_concurrency_cap: Some(Value::String("two".into())),
            launch_delay_seconds_min: Some(Value::Float(1.0)),
        });
        assert_eq!(resolve(&cfg, Family::Tiered), ConcurrencyPolicy::conservative());

        cfg.overlay = Some(EnforcementOverlay {
            enforce: Some(Value::Boolean(true)),
            max_concurrency_cap: Some(Value::Integer(2)),
            launch_delay_seconds_min: Some(Value::String("soon".into())),
        });
        assert_eq!(resolve(&cfg, Family::Tiered), ConcurrencyPolicy::conservative());
    }

    #[test]
    fn invalid_overlay_field_is_harmless_when_not_enforced() {
        let mut cfg = config_with(Family::Tiered, FamilyConcurrency::new(true, 6, 0.0));
        cfg.overlay = Some(EnforcementOverlay {
            enforce: Some(Value::Boolean(false)),
            max_concurrency_cap: Some(Value::String("two".into())),
            launch_delay_seconds_min: None,
        });
        assert_eq!(resolve(&cfg, Family::Tiered), ConcurrencyPolicy::new(true, 6, 0.0));
    }

    #[test]
    fn resolve_all_covers_every_family() {
        let all = resolve_all(&ConcurrencyConfig::default());
        assert_eq!(all.len(), Family::ALL.len());
        assert!(all.iter().all(|(_, p)| *p == ConcurrencyPolicy::conservative()));
    }
}
