//! Feed-forward network built from a genome
//!
//! The enabled connections form a petgraph DAG; nodes that cannot reach an
//! output are dropped and the rest are evaluated in topological order.

use ahash::HashMap;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Dfs, EdgeRef, Reversed};
use petgraph::Direction;

use super::activation::ActivationFunction;
use super::config::GenomeConfig;
use super::genome::{Genome, NodeKey};
use crate::error::NeatError;

/// One node's evaluation step
#[derive(Debug, Clone)]
struct NodeEval {
    slot: usize,
    activation: ActivationFunction,
    bias: f64,
    /// (source slot, weight)
    inputs: Vec<(usize, f64)>,
}

/// Decision function produced from a genome
#[derive(Debug, Clone)]
pub struct FeedForwardNetwork {
    input_slots: Vec<usize>,
    output_slots: Vec<usize>,
    evals: Vec<NodeEval>,
    values: Vec<f64>,
}

impl FeedForwardNetwork {
    /// Build the network for `genome`
    pub fn create(genome: &Genome, config: &GenomeConfig) -> Result<Self, NeatError> {
        let input_keys = config.input_keys();
        let output_keys = config.output_keys();

        let mut graph: DiGraph<NodeKey, f64> = DiGraph::new();
        let mut index: HashMap<NodeKey, NodeIndex> = HashMap::default();
        for &key in input_keys
            .iter()
            .chain(output_keys.iter())
            .chain(genome.nodes.keys())
        {
            index.entry(key).or_insert_with(|| graph.add_node(key));
        }

        for gene in genome.connections.values().filter(|c| c.enabled) {
            let (input, output) = gene.key;
            if let (Some(&a), Some(&b)) = (index.get(&input), index.get(&output)) {
                graph.add_edge(a, b, gene.weight);
            }
        }

        let order = toposort(&graph, None).map_err(|_| NeatError::CyclicGenome(genome.key))?;

        // Nodes from which some output is reachable
        let reversed = Reversed(&graph);
        let mut required = vec![false; graph.node_count()];
        for key in &output_keys {
            let mut dfs = Dfs::new(reversed, index[key]);
            while let Some(node) = dfs.next(reversed) {
                required[node.index()] = true;
            }
        }

        let slot = |node: NodeIndex| node.index();
        let mut evals = Vec::new();
        for node in order {
            let key = graph[node];
            if input_keys.contains(&key) || !required[node.index()] {
                continue;
            }
            let (bias, activation) = match genome.nodes.get(&key) {
                Some(gene) => (gene.bias, gene.activation),
                None => (0.0, config.activation_default),
            };
            let inputs = graph
                .edges_directed(node, Direction::Incoming)
                .map(|edge| (slot(edge.source()), *edge.weight()))
                .collect();
            evals.push(NodeEval {
                slot: slot(node),
                activation,
                bias,
                inputs,
            });
        }

        Ok(Self {
            input_slots: input_keys.iter().map(|k| slot(index[k])).collect(),
            output_slots: output_keys.iter().map(|k| slot(index[k])).collect(),
            evals,
            values: vec![0.0; graph.node_count()],
        })
    }

    /// Number of inputs the network expects
    pub fn num_inputs(&self) -> usize {
        self.input_slots.len()
    }

    /// Run the network on `inputs`
    pub fn activate(&mut self, inputs: &[f64]) -> Result<Vec<f64>, NeatError> {
        if inputs.len() != self.input_slots.len() {
            return Err(NeatError::InputMismatch {
                expected: self.input_slots.len(),
                actual: inputs.len(),
            });
        }

        for (&slot, &value) in self.input_slots.iter().zip(inputs) {
            self.values[slot] = value;
        }

        for eval in &self.evals {
            let sum: f64 = eval
                .inputs
                .iter()
                .map(|&(source, weight)| self.values[source] * weight)
                .sum();
            self.values[eval.slot] = eval.activation.activate(eval.bias + sum);
        }

        Ok(self.output_slots.iter().map(|&s| self.values[s]).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neat::genome::{ConnectionGene, NodeGene};

    fn linear_config() -> GenomeConfig {
        GenomeConfig {
            num_inputs: 2,
            num_outputs: 1,
            activation_default: ActivationFunction::Linear,
            ..GenomeConfig::default()
        }
    }

    fn node(key: NodeKey, bias: f64) -> NodeGene {
        NodeGene {
            key,
            bias,
            activation: ActivationFunction::Linear,
        }
    }

    fn conn(input: NodeKey, output: NodeKey, weight: f64, enabled: bool) -> ConnectionGene {
        ConnectionGene {
            key: (input, output),
            weight,
            enabled,
        }
    }

    fn genome_with(nodes: Vec<NodeGene>, conns: Vec<ConnectionGene>) -> Genome {
        let mut genome = Genome::new(1);
        for n in nodes {
            genome.nodes.insert(n.key, n);
        }
        for c in conns {
            genome.connections.insert(c.key, c);
        }
        genome
    }

    #[test]
    fn test_weighted_sum_with_bias() {
        let genome = genome_with(
            vec![node(0, 0.5)],
            vec![conn(-1, 0, 2.0, true), conn(-2, 0, -1.0, true)],
        );
        let mut net = FeedForwardNetwork::create(&genome, &linear_config()).unwrap();
        let out = net.activate(&[3.0, 4.0]).unwrap();
        assert_eq!(out, vec![0.5 + 6.0 - 4.0]);
    }

    #[test]
    fn test_disabled_connections_are_ignored() {
        let genome = genome_with(
            vec![node(0, 0.0)],
            vec![conn(-1, 0, 2.0, true), conn(-2, 0, 100.0, false)],
        );
        let mut net = FeedForwardNetwork::create(&genome, &linear_config()).unwrap();
        assert_eq!(net.activate(&[1.0, 1.0]).unwrap(), vec![2.0]);
    }

    #[test]
    fn test_hidden_chain_evaluates_in_order() {
        // -1 -> 2 -> 1 -> 0, inserted out of order
        let genome = genome_with(
            vec![node(0, 0.0), node(1, 1.0), node(2, 0.0)],
            vec![
                conn(1, 0, 3.0, true),
                conn(2, 1, 2.0, true),
                conn(-1, 2, 1.0, true),
            ],
        );
        let mut net = FeedForwardNetwork::create(&genome, &linear_config()).unwrap();
        // ((x * 1) * 2 + 1) * 3
        assert_eq!(net.activate(&[2.0, 0.0]).unwrap(), vec![15.0]);
    }

    #[test]
    fn test_unconnected_output_yields_activation_of_bias() {
        let genome = genome_with(vec![node(0, 0.25)], vec![]);
        let mut net = FeedForwardNetwork::create(&genome, &linear_config()).unwrap();
        assert_eq!(net.activate(&[9.0, 9.0]).unwrap(), vec![0.25]);
    }

    #[test]
    fn test_cycle_is_rejected() {
        let genome = genome_with(
            vec![node(0, 0.0), node(1, 0.0)],
            vec![conn(1, 0, 1.0, true), conn(0, 1, 1.0, true)],
        );
        let err = FeedForwardNetwork::create(&genome, &linear_config()).unwrap_err();
        assert!(matches!(err, NeatError::CyclicGenome(1)));
    }

    #[test]
    fn test_input_length_is_checked() {
        let genome = genome_with(vec![node(0, 0.0)], vec![conn(-1, 0, 1.0, true)]);
        let mut net = FeedForwardNetwork::create(&genome, &linear_config()).unwrap();
        assert!(matches!(
            net.activate(&[1.0]),
            Err(NeatError::InputMismatch {
                expected: 2,
                actual: 1
            })
        ));
    }
}
