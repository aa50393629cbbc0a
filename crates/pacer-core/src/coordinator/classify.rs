//! Split a unit's job list into families and compute tracker totals.

use crate::event::{Category, CategoryCounts, CategoryHints};
use crate::job::{Family, JobEntry};

/// A unit's jobs grouped by family, input order preserved within each group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FamilyPlan {
    pub primary: Vec<JobEntry>,
    pub secondary: Vec<JobEntry>,
    pub independent: Vec<JobEntry>,
    pub first_dependent: Vec<JobEntry>,
    pub second_dependent: Vec<JobEntry>,
    /// Planned runs per category for the tiered family (sum of iterations).
    pub totals: CategoryCounts,
}

impl FamilyPlan {
    pub fn len(&self) -> usize {
        self.primary.len()
            + self.secondary.len()
            + self.independent.len()
            + self.first_dependent.len()
            + self.second_dependent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Group `jobs` by family. Tiered jobs without an explicit category are
/// classified from provider/model and get the resolved category written back.
pub fn classify(jobs: Vec<JobEntry>, hints: &CategoryHints) -> FamilyPlan {
    let mut plan = FamilyPlan::default();
    for mut job in jobs {
        match job.family {
            Family::Tiered => {
                let category = job
                    .category
                    .unwrap_or_else(|| hints.classify(&job.provider, &job.model));
                job.category = Some(category);
                *plan.totals.get_mut(category) += job.iterations as usize;
                match category {
                    Category::Primary => plan.primary.push(job),
                    Category::Secondary => plan.secondary.push(job),
                }
            }
            Family::Independent => plan.independent.push(job),
            Family::FirstDependent => plan.first_dependent.push(job),
            Family::SecondDependent => plan.second_dependent.push(job),
        }
    }
    plan
}
