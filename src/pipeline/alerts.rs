//! Alert destination selection.
//!
//! Each broadcast group offers several candidate channels; exactly one
//! receives the alert. Selection is a pure function of the configured
//! priority table and the group's stable destination order.

use std::collections::HashMap;

use crate::error::{AppError, Result};
use crate::models::{ChannelPriority, Destination};

/// Picks one destination per broadcast group by configured priority.
pub struct ChannelSelector {
    priorities: HashMap<String, i32>,
}

impl ChannelSelector {
    pub fn new(priorities: &[ChannelPriority]) -> Self {
        Self {
            priorities: priorities
                .iter()
                .map(|p| (p.name.clone(), p.score))
                .collect(),
        }
    }

    /// Select the alert destination for one group.
    ///
    /// Destinations without a configured priority are ineligible. The
    /// highest score wins; ties go to the earliest destination in the
    /// input order, so repeated calls with the same input pick the same
    /// channel.
    pub fn select<'a>(&self, destinations: &'a [Destination]) -> Result<&'a Destination> {
        let mut best: Option<(&Destination, i32)> = None;

        for destination in destinations {
            let Some(&score) = self.priorities.get(&destination.name) else {
                continue;
            };
            match best {
                Some((_, best_score)) if best_score >= score => {}
                _ => best = Some((destination, score)),
            }
        }

        best.map(|(destination, _)| destination)
            .ok_or_else(|| AppError::no_target("no destination with a configured priority"))
    }
}
