//! Priority strategy (§4.3 steps 1-4): smooth weighted round-robin within the
//! highest-priority group of enabled candidates.

use std::sync::Mutex;

use config::PriorityRouterConfig;

use super::RouteResult;

struct Group {
    members: Vec<Member>,
}

struct Member {
    model: String,
    weight: i64,
    current_weight: i64,
}

/// Per-group mutex guards the round-robin counters (§4.3 Concurrency); a
/// single-member group short-circuits without touching the lock.
pub struct PriorityRouter {
    groups: Mutex<Vec<Group>>,
    fallback: Option<String>,
}

impl PriorityRouter {
    pub fn new(config: PriorityRouterConfig) -> Self {
        let mut by_priority: std::collections::BTreeMap<u32, Vec<Member>> = std::collections::BTreeMap::new();
        for c in config.candidates.iter().filter(|c| c.enabled) {
            by_priority.entry(c.priority).or_default().push(Member {
                model: c.model.clone(),
                weight: c.weight as i64,
                current_weight: 0,
            });
        }
        let groups = by_priority
            .into_iter()
            .map(|(_priority, members)| Group { members })
            .collect();
        Self {
            groups: Mutex::new(groups),
            fallback: config.fallback_model_name,
        }
    }

    pub fn select(&self) -> RouteResult {
        let mut groups = self.groups.lock().unwrap();
        if groups.is_empty() {
            let selected = self.fallback.clone().unwrap_or_default();
            return RouteResult {
                selected: selected.clone(),
                candidates: vec![selected],
                classification_input: None,
            };
        }

        let mut candidates = Vec::new();
        let top_selected = {
            let top = &mut groups[0];
            tick(&mut top.members)
        };
        {
            let top = &mut groups[0];
            candidates.push(top_selected.clone());
            let mut rest: Vec<&Member> = top.members.iter().filter(|m| m.model != top_selected).collect();
            rest.sort_by(|a, b| b.weight.cmp(&a.weight));
            candidates.extend(rest.into_iter().map(|m| m.model.clone()));
        }

        for group in groups.iter().skip(1) {
            let mut members: Vec<&Member> = group.members.iter().collect();
            members.sort_by(|a, b| b.weight.cmp(&a.weight));
            candidates.extend(members.into_iter().map(|m| m.model.clone()));
        }

        if let Some(fb) = &self.fallback {
            if !candidates.contains(fb) {
                candidates.push(fb.clone());
            }
        }

        RouteResult {
            selected: candidates[0].clone(),
            candidates,
            classification_input: None,
        }
    }
}

/// One smooth-weighted-round-robin tick: add each member's weight to its
/// running `current_weight`, pick the max, subtract the sum of weights from
/// the winner.
fn tick(members: &mut [Member]) -> String {
    if members.len() == 1 {
        return members[0].model.clone();
    }
    let total: i64 = members.iter().map(|m| m.weight).sum();
    for m in members.iter_mut() {
        m.current_weight += m.weight;
    }
    let winner_idx = members
        .iter()
        .enumerate()
        .max_by_key(|(_, m)| m.current_weight)
        .map(|(i, _)| i)
        .unwrap();
    members[winner_idx].current_weight -= total;
    members[winner_idx].model.clone()
}
