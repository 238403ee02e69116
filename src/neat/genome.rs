//! NEAT genome representation
//!
//! Node genes carry a bias and an activation function; connection genes are
//! keyed by their `(input, output)` node pair, which doubles as the
//! connection's innovation identity when aligning genes during crossover.

use std::collections::{BTreeMap, BTreeSet};
use std::f64::consts::PI;

use ahash::HashMap;
use rand::prelude::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::activation::ActivationFunction;
use super::config::{FloatAttribute, GenomeConfig};

pub type GenomeId = u64;
pub type NodeKey = i64;
pub type ConnectionKey = (NodeKey, NodeKey);

/// Node in the network (hidden or output; inputs have no gene)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeGene {
    pub key: NodeKey,
    pub bias: f64,
    pub activation: ActivationFunction,
}

/// Weighted connection between two nodes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConnectionGene {
    pub key: ConnectionKey,
    pub weight: f64,
    pub enabled: bool,
}

/// Hands out hidden node ids, shared by the whole population
///
/// Splitting the same connection twice within one generation yields the same
/// node id, so independently discovered structure lines up in crossover.
#[derive(Debug, Clone)]
pub struct InnovationTracker {
    next_node: NodeKey,
    splits: HashMap<ConnectionKey, NodeKey>,
}

impl InnovationTracker {
    /// Start handing out ids after `highest_key`
    pub fn new(highest_key: NodeKey) -> Self {
        Self {
            next_node: highest_key + 1,
            splits: HashMap::default(),
        }
    }

    /// Fresh node id
    pub fn next_node_key(&mut self) -> NodeKey {
        let key = self.next_node;
        self.next_node += 1;
        key
    }

    /// Node id for splitting `connection`, reused within a generation
    pub fn split_node_key(&mut self, connection: ConnectionKey) -> NodeKey {
        if let Some(&key) = self.splits.get(&connection) {
            return key;
        }
        let key = self.next_node_key();
        self.splits.insert(connection, key);
        key
    }

    /// Forget split history (called once per generation)
    pub fn end_generation(&mut self) {
        self.splits.clear();
    }
}

/// Normally distributed sample via Box-Muller
pub(crate) fn gaussian<R: Rng + ?Sized>(rng: &mut R, mean: f64, stdev: f64) -> f64 {
    let u1 = rng.random::<f64>().max(f64::MIN_POSITIVE);
    let u2 = rng.random::<f64>();
    mean + stdev * (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

impl FloatAttribute {
    /// Fresh value drawn from the init distribution
    pub fn init_value<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.clamp(gaussian(rng, self.init_mean, self.init_stdev))
    }

    /// Perturb, replace or keep `value`
    pub fn mutate_value<R: Rng + ?Sized>(&self, value: f64, rng: &mut R) -> f64 {
        let r = rng.random::<f64>();
        if r < self.mutate_rate {
            self.clamp(value + gaussian(rng, 0.0, self.mutate_power))
        } else if r < self.mutate_rate + self.replace_rate {
            self.init_value(rng)
        } else {
            value
        }
    }
}

/// One candidate controller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Genome {
    pub key: GenomeId,
    pub nodes: BTreeMap<NodeKey, NodeGene>,
    pub connections: BTreeMap<ConnectionKey, ConnectionGene>,
    /// Set by the fitness evaluation, `None` before it ran
    pub fitness: Option<f64>,
}

impl Genome {
    pub fn new(key: GenomeId) -> Self {
        Self {
            key,
            nodes: BTreeMap::new(),
            connections: BTreeMap::new(),
            fitness: None,
        }
    }

    fn new_node<R: Rng + ?Sized>(config: &GenomeConfig, key: NodeKey, rng: &mut R) -> NodeGene {
        NodeGene {
            key,
            bias: config.bias.init_value(rng),
            activation: config.activation_default,
        }
    }

    fn add_new_connection<R: Rng + ?Sized>(
        &mut self,
        config: &GenomeConfig,
        key: ConnectionKey,
        rng: &mut R,
    ) {
        self.connections.insert(
            key,
            ConnectionGene {
                key,
                weight: config.weight.init_value(rng),
                enabled: config.enabled_default,
            },
        );
    }

    /// Build a fresh fully connected genome
    ///
    /// Without hidden nodes every input feeds every output; with hidden nodes
    /// inputs feed the hidden layer and the hidden layer feeds the outputs.
    pub fn configure_new<R: Rng + ?Sized>(
        &mut self,
        config: &GenomeConfig,
        tracker: &mut InnovationTracker,
        rng: &mut R,
    ) {
        for key in config.output_keys() {
            self.nodes.insert(key, Self::new_node(config, key, rng));
        }

        let hidden: Vec<NodeKey> = (0..config.num_hidden)
            .map(|_| tracker.next_node_key())
            .collect();
        for &key in &hidden {
            self.nodes.insert(key, Self::new_node(config, key, rng));
        }

        let inputs = config.input_keys();
        let outputs = config.output_keys();
        if hidden.is_empty() {
            for &i in &inputs {
                for &o in &outputs {
                    self.add_new_connection(config, (i, o), rng);
                }
            }
        } else {
            for &i in &inputs {
                for &h in &hidden {
                    self.add_new_connection(config, (i, h), rng);
                }
            }
            for &h in &hidden {
                for &o in &outputs {
                    self.add_new_connection(config, (h, o), rng);
                }
            }
        }
    }

    /// Fill this genome with the offspring of two parents
    ///
    /// Matching genes take each attribute from a random parent; disjoint and
    /// excess genes come from the fitter parent only.
    pub fn configure_crossover<R: Rng + ?Sized>(
        &mut self,
        parent1: &Genome,
        parent2: &Genome,
        rng: &mut R,
    ) {
        let (fit, other) = if parent1.fitness.unwrap_or(f64::MIN)
            >= parent2.fitness.unwrap_or(f64::MIN)
        {
            (parent1, parent2)
        } else {
            (parent2, parent1)
        };

        for (key, gene) in &fit.connections {
            let child = match other.connections.get(key) {
                Some(other_gene) => {
                    let weight = if rng.random::<bool>() {
                        gene.weight
                    } else {
                        other_gene.weight
                    };
                    // A gene disabled in either parent stays disabled 75% of the time
                    let enabled = if !gene.enabled || !other_gene.enabled {
                        rng.random::<f64>() >= 0.75
                    } else {
                        true
                    };
                    ConnectionGene {
                        key: *key,
                        weight,
                        enabled,
                    }
                }
                None => gene.clone(),
            };
            self.connections.insert(*key, child);
        }

        for (key, node) in &fit.nodes {
            let child = match other.nodes.get(key) {
                Some(other_node) => NodeGene {
                    key: *key,
                    bias: if rng.random::<bool>() {
                        node.bias
                    } else {
                        other_node.bias
                    },
                    activation: if rng.random::<bool>() {
                        node.activation
                    } else {
                        other_node.activation
                    },
                },
                None => node.clone(),
            };
            self.nodes.insert(*key, child);
        }
    }

    /// Apply structural and attribute mutations
    pub fn mutate<R: Rng + ?Sized>(
        &mut self,
        config: &GenomeConfig,
        tracker: &mut InnovationTracker,
        rng: &mut R,
    ) {
        if rng.random::<f64>() < config.node_add_prob {
            self.mutate_add_node(config, tracker, rng);
        }
        if rng.random::<f64>() < config.node_delete_prob {
            self.mutate_delete_node(config, rng);
        }
        if rng.random::<f64>() < config.conn_add_prob {
            self.mutate_add_connection(config, rng);
        }
        if rng.random::<f64>() < config.conn_delete_prob {
            self.mutate_delete_connection(rng);
        }

        for gene in self.connections.values_mut() {
            gene.weight = config.weight.mutate_value(gene.weight, rng);
            if rng.random::<f64>() < config.enabled_mutate_rate {
                gene.enabled = !gene.enabled;
            }
        }
        for node in self.nodes.values_mut() {
            node.bias = config.bias.mutate_value(node.bias, rng);
            if rng.random::<f64>() < config.activation_mutate_rate {
                if let Some(&activation) = config.activation_options.choose(rng) {
                    node.activation = activation;
                }
            }
        }
    }

    /// Split a random enabled connection with a new hidden node
    /// Returns true if a node was added
    pub fn mutate_add_node<R: Rng + ?Sized>(
        &mut self,
        config: &GenomeConfig,
        tracker: &mut InnovationTracker,
        rng: &mut R,
    ) -> bool {
        let enabled: Vec<ConnectionKey> = self
            .connections
            .values()
            .filter(|c| c.enabled)
            .map(|c| c.key)
            .collect();
        let Some(&(input, output)) = enabled.choose(rng) else {
            return false;
        };

        let new_key = tracker.split_node_key((input, output));
        if self.nodes.contains_key(&new_key) {
            return false;
        }

        let old_weight = match self.connections.get_mut(&(input, output)) {
            Some(gene) => {
                gene.enabled = false;
                gene.weight
            }
            None => return false,
        };

        let mut node = Self::new_node(config, new_key, rng);
        node.bias = 0.0;
        self.nodes.insert(new_key, node);

        // Weight 1.0 into the new node and the old weight out of it preserve the signal
        self.connections.insert(
            (input, new_key),
            ConnectionGene {
                key: (input, new_key),
                weight: 1.0,
                enabled: true,
            },
        );
        self.connections.insert(
            (new_key, output),
            ConnectionGene {
                key: (new_key, output),
                weight: old_weight,
                enabled: true,
            },
        );
        true
    }

    /// Remove a random hidden node and every connection touching it
    pub fn mutate_delete_node<R: Rng + ?Sized>(
        &mut self,
        config: &GenomeConfig,
        rng: &mut R,
    ) -> bool {
        let outputs = config.output_keys();
        let hidden: Vec<NodeKey> = self
            .nodes
            .keys()
            .copied()
            .filter(|k| !outputs.contains(k))
            .collect();
        let Some(&victim) = hidden.choose(rng) else {
            return false;
        };

        self.connections
            .retain(|&(input, output), _| input != victim && output != victim);
        self.nodes.remove(&victim);
        true
    }

    /// Connect two random nodes that are not yet connected
    /// Returns true if a connection was added
    pub fn mutate_add_connection<R: Rng + ?Sized>(
        &mut self,
        config: &GenomeConfig,
        rng: &mut R,
    ) -> bool {
        let targets: Vec<NodeKey> = self.nodes.keys().copied().collect();
        let mut sources = targets.clone();
        sources.extend(config.input_keys());

        let (Some(&input), Some(&output)) = (sources.choose(rng), targets.choose(rng)) else {
            return false;
        };

        if self.connections.contains_key(&(input, output)) {
            return false;
        }

        let outputs = config.output_keys();
        if outputs.contains(&input) && outputs.contains(&output) {
            return false;
        }

        if creates_cycle(self.connections.keys().copied(), (input, output)) {
            return false;
        }

        self.add_new_connection(config, (input, output), rng);
        true
    }

    /// Remove a random connection
    pub fn mutate_delete_connection<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        let keys: Vec<ConnectionKey> = self.connections.keys().copied().collect();
        match keys.choose(rng) {
            Some(key) => self.connections.remove(key).is_some(),
            None => false,
        }
    }

    /// NEAT compatibility distance
    pub fn distance(&self, other: &Genome, config: &GenomeConfig) -> f64 {
        let c_disjoint = config.compatibility_disjoint_coefficient;
        let c_weight = config.compatibility_weight_coefficient;

        let mut node_distance = 0.0;
        if !self.nodes.is_empty() || !other.nodes.is_empty() {
            let mut disjoint = 0usize;
            for key in other.nodes.keys() {
                if !self.nodes.contains_key(key) {
                    disjoint += 1;
                }
            }
            for (key, node) in &self.nodes {
                match other.nodes.get(key) {
                    Some(other_node) => {
                        let mut d = (node.bias - other_node.bias).abs();
                        if node.activation != other_node.activation {
                            d += 1.0;
                        }
                        node_distance += d * c_weight;
                    }
                    None => disjoint += 1,
                }
            }
            let max_nodes = self.nodes.len().max(other.nodes.len());
            node_distance = (node_distance + c_disjoint * disjoint as f64) / max_nodes as f64;
        }

        let mut connection_distance = 0.0;
        if !self.connections.is_empty() || !other.connections.is_empty() {
            let mut disjoint = 0usize;
            for key in other.connections.keys() {
                if !self.connections.contains_key(key) {
                    disjoint += 1;
                }
            }
            for (key, gene) in &self.connections {
                match other.connections.get(key) {
                    Some(other_gene) => {
                        let mut d = (gene.weight - other_gene.weight).abs();
                        if gene.enabled != other_gene.enabled {
                            d += 1.0;
                        }
                        connection_distance += d * c_weight;
                    }
                    None => disjoint += 1,
                }
            }
            let max_conn = self.connections.len().max(other.connections.len());
            connection_distance =
                (connection_distance + c_disjoint * disjoint as f64) / max_conn as f64;
        }

        node_distance + connection_distance
    }

    /// (node count, enabled connection count)
    pub fn size(&self) -> (usize, usize) {
        let enabled = self.connections.values().filter(|c| c.enabled).count();
        (self.nodes.len(), enabled)
    }

    /// Highest node id in use (0 for an empty genome)
    pub fn max_node_key(&self) -> NodeKey {
        self.nodes.keys().next_back().copied().unwrap_or(0)
    }
}

/// True if adding `test` to `connections` would create a cycle
pub fn creates_cycle(
    connections: impl IntoIterator<Item = ConnectionKey>,
    test: ConnectionKey,
) -> bool {
    let (input, output) = test;
    if input == output {
        return true;
    }

    let connections: Vec<ConnectionKey> = connections.into_iter().collect();
    let mut visited = BTreeSet::from([output]);
    loop {
        let mut added = 0;
        for &(a, b) in &connections {
            if visited.contains(&a) && !visited.contains(&b) {
                if b == input {
                    return true;
                }
                visited.insert(b);
                added += 1;
            }
        }
        if added == 0 {
            return false;
        }
    }
}
