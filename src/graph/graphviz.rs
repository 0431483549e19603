//! Export render graphs in graphviz `dot` format.
//!
//! Passes are drawn as ellipses and resources as boxes. An edge from a resource to a pass is an input, an edge from a
//! pass to a resource is an output. Passes culled by the last compilation are drawn dashed and grey.

use std::fmt::{Display, Formatter};

use anyhow::Result;
use petgraph::dot::Dot;
use petgraph::graph::{EdgeReference, NodeIndex};
use petgraph::Graph;

use crate::device::traits::Device;
use crate::graph::desc::{RenderGraphDesc, ResourceKind};
use crate::graph::render_graph::RenderGraph;

/// Trait that can be implemented for graph objects to export them in `dot` format.
pub trait GraphViz {
    /// Get the string representation of this graph in `dot` format.
    fn dot(&self) -> Result<String>;
}

#[derive(Debug, Clone)]
enum Node {
    Pass {
        name: String,
        pass_type: String,
        enabled: bool,
    },
    Resource {
        name: String,
        kind: ResourceKind,
        output: bool,
    },
}

impl Display for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Node::Pass {
                name,
                pass_type,
                ..
            } => f.write_fmt(format_args!("{name} ({pass_type})")),
            Node::Resource {
                name,
                kind,
                ..
            } => f.write_fmt(format_args!("{name} [{kind:?}]")),
        }
    }
}

type DotGraph = Graph<Node, String>;

fn get_edge_attributes(_: &DotGraph, _: EdgeReference<String>) -> String {
    String::from("")
}

fn get_node_attributes(_: &DotGraph, node: (NodeIndex, &Node)) -> String {
    match node.1 {
        Node::Pass {
            enabled: true,
            ..
        } => String::from("style=filled fillcolor=\"#5e6df7\""),
        Node::Pass {
            enabled: false,
            ..
        } => String::from("style=dashed color=\"#a0a0a0\""),
        Node::Resource {
            output: true,
            ..
        } => String::from("shape=box style=filled fillcolor=\"#f7c65e\""),
        Node::Resource {
            ..
        } => String::from("shape=box"),
    }
}

fn build_graph(desc: &RenderGraphDesc, enabled: impl Fn(usize) -> bool) -> DotGraph {
    let mut graph = DotGraph::new();
    let passes = desc
        .passes
        .iter()
        .enumerate()
        .map(|(index, pass)| {
            graph.add_node(Node::Pass {
                name: pass.name.clone(),
                pass_type: pass.pass_type.clone(),
                enabled: enabled(index),
            })
        })
        .collect::<Vec<_>>();
    let resources = desc
        .resources
        .iter()
        .enumerate()
        .map(|(index, resource)| {
            graph.add_node(Node::Resource {
                name: resource.display_name(index),
                kind: resource.kind,
                output: resource.is_graph_output,
            })
        })
        .collect::<Vec<_>>();

    for connection in &desc.input_connections {
        if let (Some(resource), Some(pass)) = (resources.get(connection.resource), passes.get(connection.pass)) {
            graph.add_edge(*resource, *pass, connection.parameter.clone());
        }
    }
    for connection in &desc.output_connections {
        if let (Some(pass), Some(resource)) = (passes.get(connection.pass), resources.get(connection.resource)) {
            graph.add_edge(*pass, *resource, connection.parameter.clone());
        }
    }
    graph
}

fn to_dot(graph: &DotGraph) -> String {
    format!("{}", Dot::with_attr_getters(graph, &[], &get_edge_attributes, &get_node_attributes))
}

impl GraphViz for RenderGraphDesc {
    fn dot(&self) -> Result<String> {
        Ok(to_dot(&build_graph(self, |_| true)))
    }
}

impl<D: Device> GraphViz for RenderGraph<D> {
    /// Like the description's dot export, but passes culled by the last compilation are drawn differently.
    fn dot(&self) -> Result<String> {
        let compiled = self.is_compiled();
        Ok(to_dot(&build_graph(self.desc(), |index| !compiled || self.is_pass_enabled(index))))
    }
}
