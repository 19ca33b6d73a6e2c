// Copyright 2020 Xavier Gillard
//
// Permission is hereby granted, free of charge, to any person obtaining a copy of
// this software and associated documentation files (the "Software"), to deal in
// the Software without restriction, including without limitation the rights to
// use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of
// the Software, and to permit persons to whom the Software is furnished to do so,
// subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS
// FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR
// COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER
// IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN
// CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! The visualisation emitter. The core's contract is the structured
//! node/edge list (`TradeGraph`): participants as nodes, one labelled
//! directed edge per item movement. `as_html` wraps that list into a
//! self-contained document handing the actual drawing to the interactive
//! renderer it loads -- the renderer is an external collaborator, not part
//! of this crate.

use serde::Serialize;

use crate::{Error, Exchange, Instance};

/// One participant node of the exchange graph.
#[derive(Debug, Clone, Serialize)]
pub struct VizNode {
    pub id: String,
    pub label: String,
}

/// One item movement: `from` hands `label` over to `to`.
#[derive(Debug, Clone, Serialize)]
pub struct VizEdge {
    pub from: String,
    pub to: String,
    pub label: String,
    pub title: String,
}

/// The structured node/edge list of a solution's exchange graph.
#[derive(Debug, Clone, Serialize)]
pub struct TradeGraph {
    pub nodes: Vec<VizNode>,
    pub edges: Vec<VizEdge>,
}

/// This is how you configure the output visualisation, e.g. the canvas
/// height or whether the renderer runs its physics simulation.
#[derive(Debug, derive_builder::Builder)]
pub struct VizConfig {
    /// The height of the rendered canvas
    #[builder(default = "String::from(\"750px\")")]
    pub height: String,
    /// Whether the renderer animates the layout with its physics engine
    #[builder(default = "true")]
    pub physics: bool,
}

impl Default for VizConfig {
    fn default() -> Self {
        VizConfig {
            height: String::from("750px"),
            physics: true,
        }
    }
}

impl TradeGraph {
    /// Derives the exchange graph of a solution: one node per actual
    /// participant, one edge per item movement. The item named on an edge is
    /// the `received` item of the record: it flows from the receiver-side
    /// owner to the participant of the record.
    pub fn new(instance: &Instance, exchanges: &[Exchange]) -> Self {
        let nodes = (0..instance.nb_participants())
            .map(|u| VizNode {
                id: instance.participants[u].display.clone(),
                label: instance.participants[u].display.clone(),
            })
            .collect();
        let edges = exchanges
            .iter()
            .map(|exchange| {
                let from = instance.participant(exchange.receiver).display.clone();
                let to = instance.participant(exchange.giver).display.clone();
                let item = instance.item(exchange.received).name.clone();
                VizEdge {
                    title: format!("{} gives '{}' to {}", from, item, to),
                    label: format!("'{}'", item),
                    from,
                    to,
                }
            })
            .collect();
        TradeGraph { nodes, edges }
    }

    /// Renders the graph as a self-contained html document. The node/edge
    /// list is embedded as json; the interactive renderer is loaded by the
    /// document itself.
    pub fn as_html(&self, config: &VizConfig) -> Result<String, Error> {
        let nodes = serde_json::to_string(&self.nodes)?;
        let edges = serde_json::to_string(&self.edges)?;
        Ok(format!(
            r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>Trade graph</title>
  <script src="https://unpkg.com/vis-network/standalone/umd/vis-network.min.js"></script>
  <style type="text/css">
    #tradegraph {{ width: 100%; height: {height}; border: 1px solid lightgray; }}
  </style>
</head>
<body>
<div id="tradegraph"></div>
<script type="text/javascript">
  var nodes = new vis.DataSet({nodes});
  var edges = new vis.DataSet({edges});
  var container = document.getElementById("tradegraph");
  var options = {{
    nodes: {{ shape: "dot", size: 16, font: {{ size: 16 }} }},
    edges: {{ arrows: "to", font: {{ size: 12, align: "middle" }} }},
    physics: {{ enabled: {physics}, barnesHut: {{ gravitationalConstant: -30000 }} }}
  }};
  new vis.Network(container, {{ nodes: nodes, edges: edges }}, options);
</script>
</body>
</html>
"#,
            height = config.height,
            nodes = nodes,
            edges = edges,
            physics = config.physics,
        ))
    }
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################
