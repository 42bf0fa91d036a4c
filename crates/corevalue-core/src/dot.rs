//! Graphviz export of a preference graph.
//!
//! Edges point from the preferred value to the value it beat; the edge
//! label is the number of direct wins.

use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, NodeIndex};

use crate::error::GraphError;
use crate::graph::PreferenceGraph;

/// Convert to a petgraph `DiGraph` labelled with value names.
///
/// # Errors
///
/// Returns [`GraphError::InvalidSize`] if `names` does not have one entry
/// per graph item.
pub fn to_digraph<'a>(
    graph: &PreferenceGraph,
    names: &'a [String],
) -> Result<DiGraph<&'a str, u32>, GraphError> {
    graph.ensure_len(names.len())?;

    let mut digraph = DiGraph::with_capacity(graph.len(), 0);
    let nodes: Vec<NodeIndex> = names
        .iter()
        .map(|name| digraph.add_node(name.as_str()))
        .collect();

    for (u, &from) in nodes.iter().enumerate() {
        for v in graph.neighbours(u) {
            digraph.add_edge(from, nodes[v], graph.weight(u, v));
        }
    }

    Ok(digraph)
}

/// Render the graph in DOT format.
///
/// # Errors
///
/// Same as [`to_digraph`].
pub fn render_dot(graph: &PreferenceGraph, names: &[String]) -> Result<String, GraphError> {
    let digraph = to_digraph(graph, names)?;
    let body = Dot::with_config(&digraph, &[Config::GraphContentOnly]);
    Ok(format!("digraph preferences {{\n{body}}}\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn digraph_has_one_edge_per_pair_with_weight() {
        let mut graph = PreferenceGraph::new(3);
        graph.add_edge(0, 1).expect("edge");
        graph.add_edge(0, 1).expect("edge");
        graph.add_edge(2, 0).expect("edge");
        let labels = names(&["A", "B", "C"]);

        let digraph = to_digraph(&graph, &labels).expect("convert");
        assert_eq!(digraph.node_count(), 3);
        assert_eq!(digraph.edge_count(), 2);
        let ab = digraph
            .find_edge(NodeIndex::new(0), NodeIndex::new(1))
            .expect("A -> B");
        assert_eq!(digraph[ab], 2);
    }

    #[test]
    fn dot_output_is_wrapped_and_labelled() {
        let mut graph = PreferenceGraph::new(2);
        graph.add_edge(1, 0).expect("edge");

        let dot = render_dot(&graph, &names(&["Calm", "Grit"])).expect("render");
        assert!(dot.starts_with("digraph preferences {"));
        assert!(dot.contains("Calm"));
        assert!(dot.contains("Grit"));
        assert!(dot.contains("1 -> 0"));
        assert!(dot.trim_end().ends_with('}'));
    }

    #[test]
    fn name_count_must_match() {
        let graph = PreferenceGraph::new(2);
        assert!(render_dot(&graph, &names(&["only"])).is_err());
    }
}
