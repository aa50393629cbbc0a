//! `pacer policy` – show what each family will actually run with.

use anyhow::Result;
use pacer_core::config::PacerConfig;
use pacer_core::job::Family;
use pacer_core::policy::{self, ConcurrencyPolicy};
use serde::Serialize;

#[derive(Serialize)]
struct PolicyRow<'a> {
    family: Family,
    #[serde(flatten)]
    policy: &'a ConcurrencyPolicy,
}

pub fn run_policy(cfg: &PacerConfig, json: bool) -> Result<()> {
    let resolved = policy::resolve_all(&cfg.concurrency);
    if json {
        let rows: Vec<PolicyRow<'_>> = resolved
            .iter()
            .map(|(family, policy)| PolicyRow {
                family: *family,
                policy,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        print!("{}", render_policies(&resolved));
    }
    Ok(())
}

/// One row per family: enabled flag, permit count, launch delay.
pub fn render_policies(resolved: &[(Family, ConcurrencyPolicy)]) -> String {
    let mut out = format!("{:<18} {:<8} {:<6} {}\n", "FAMILY", "ENABLED", "MAX", "DELAY");
    for (family, policy) in resolved {
        let max = if policy.enabled {
            policy.max_concurrency.to_string()
        } else {
            "1".to_string()
        };
        out.push_str(&format!(
            "{:<18} {:<8} {:<6} {:.2}s\n",
            family.as_str(),
            if policy.enabled { "yes" } else { "no" },
            max,
            policy.launch_delay_seconds
        ));
    }
    out
}
