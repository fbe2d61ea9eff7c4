//! Prim oracle for maximum spanning forest verification.
//!
//! Uses a dense adjacency matrix and grows each tree from its lowest
//! unvisited node, which is independent of the Kruskal driver's edge
//! ordering. Only the total weight and component count are comparable
//! between the two when weights tie.

use crate::WeightedEdge;

pub(super) struct PrimResult {
    pub total_weight: f64,
    pub component_count: usize,
}

pub(super) fn maximum_prim(node_count: usize, edges: &[WeightedEdge]) -> PrimResult {
    let mut adjacency = vec![vec![None::<f32>; node_count]; node_count];
    for edge in edges {
        let (s, t) = (edge.source(), edge.target());
        if s == t {
            continue;
        }
        let best = adjacency[s][t].map_or(edge.weight(), |w: f32| w.max(edge.weight()));
        adjacency[s][t] = Some(best);
        adjacency[t][s] = Some(best);
    }

    let mut visited = vec![false; node_count];
    let mut total_weight = 0.0_f64;
    let mut component_count = 0;
    for start in 0..node_count {
        if visited[start] {
            continue;
        }
        component_count += 1;
        visited[start] = true;
        let mut best: Vec<Option<f32>> = adjacency[start].clone();
        loop {
            let next = (0..node_count)
                .filter(|&node| !visited[node])
                .filter_map(|node| best[node].map(|weight| (node, weight)))
                .max_by(|a, b| a.1.total_cmp(&b.1));
            let Some((node, weight)) = next else {
                break;
            };
            visited[node] = true;
            total_weight += f64::from(weight);
            for other in 0..node_count {
                if let Some(candidate) = adjacency[node][other] {
                    if best[other].is_none_or(|current| candidate > current) {
                        best[other] = Some(candidate);
                    }
                }
            }
        }
    }

    PrimResult {
        total_weight,
        component_count,
    }
}
