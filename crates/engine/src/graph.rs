// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fact dependency graph
//!
//! Dependencies are discovered by scanning each fact's command for
//! `{{facts.x}}` references before anything executes. Kahn's algorithm
//! yields the execution order and diagnoses cycles in one pass;
//! declaration order breaks ties.

use crate::error::EngineError;
use indexmap::IndexMap;
use sink_config::{references, FactDef};

/// Topological execution order for the fact definitions.
pub fn fact_order(facts: &IndexMap<String, FactDef>) -> Result<Vec<String>, EngineError> {
    // dependency edges: deps[i] lists the indices fact i waits on
    let mut deps: Vec<Vec<usize>> = Vec::with_capacity(facts.len());
    for (name, def) in facts {
        let mut indices = Vec::new();
        for reference in references(&def.command) {
            match facts.get_index_of(&reference) {
                Some(index) => indices.push(index),
                None => {
                    return Err(EngineError::UnknownReference {
                        fact: name.clone(),
                        reference,
                    });
                }
            }
        }
        deps.push(indices);
    }

    let mut done = vec![false; facts.len()];
    let mut order = Vec::with_capacity(facts.len());

    while order.len() < facts.len() {
        // First fact in declaration order whose dependencies are all done.
        let ready = (0..facts.len())
            .find(|&i| !done[i] && deps[i].iter().all(|&d| done[d]));
        match ready {
            Some(i) => {
                done[i] = true;
                if let Some((name, _)) = facts.get_index(i) {
                    order.push(name.clone());
                }
            }
            None => {
                let stuck: Vec<&str> = (0..facts.len())
                    .filter(|&i| !done[i])
                    .filter_map(|i| facts.get_index(i).map(|(name, _)| name.as_str()))
                    .collect();
                return Err(EngineError::CyclicFacts(stuck.join(", ")));
            }
        }
    }

    Ok(order)
}

#[cfg(test)]
#[path = "graph_tests.rs"]
mod tests;
