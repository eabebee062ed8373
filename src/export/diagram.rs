//! Relationship diagrams
//!
//! Builds a directed graph of models connected by their relational fields, starting at
//! one model and following relations breadth-first, then renders it as Mermaid or
//! PlantUML text.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::fmt;
use std::str::FromStr;

use petgraph::graph::NodeIndex;
use petgraph::{Directed, Graph};
use tracing::{debug, warn};

use super::{ExportError, ExportResult};
use crate::cache::{CacheOptions, MetadataCache};
use crate::client::SchemaClient;
use crate::models::RelationKind;
use crate::storage::StorageBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiagramFormat {
    #[default]
    Mermaid,
    PlantUml,
}

impl DiagramFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            DiagramFormat::Mermaid => "mmd",
            DiagramFormat::PlantUml => "puml",
        }
    }
}

impl FromStr for DiagramFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mermaid" | "mmd" => Ok(DiagramFormat::Mermaid),
            "plantuml" | "puml" => Ok(DiagramFormat::PlantUml),
            other => Err(ExportError::InvalidFormat(format!(
                "{} (expected mermaid or plantuml)",
                other
            ))),
        }
    }
}

impl fmt::Display for DiagramFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagramFormat::Mermaid => f.write_str("mermaid"),
            DiagramFormat::PlantUml => f.write_str("plantuml"),
        }
    }
}

/// Styling options; only PlantUML honours them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagramStyle {
    pub monochrome: bool,
    pub background_color: Option<String>,
}

impl DiagramStyle {
    pub fn with_monochrome(mut self, monochrome: bool) -> Self {
        self.monochrome = monochrome;
        self
    }

    pub fn with_background_color(mut self, color: impl Into<String>) -> Self {
        self.background_color = Some(color.into());
        self
    }
}

/// A relational field seen as a graph edge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationEdge {
    pub field: String,
    pub kind: RelationKind,
}

/// Models reachable from a root model, connected by relational fields
#[derive(Debug, Clone)]
pub struct RelationGraph {
    graph: Graph<String, RelationEdge, Directed>,
    nodes: HashMap<String, NodeIndex>,
}

impl RelationGraph {
    fn new() -> Self {
        Self {
            graph: Graph::new(),
            nodes: HashMap::new(),
        }
    }

    fn node(&mut self, model: &str) -> NodeIndex {
        if let Some(index) = self.nodes.get(model) {
            return *index;
        }
        let index = self.graph.add_node(model.to_string());
        self.nodes.insert(model.to_string(), index);
        index
    }

    /// Follow relations from `root` breadth-first; `depth` 1 covers the root's own fields
    pub fn build<C, S>(cache: &mut MetadataCache<C, S>, root: &str, depth: u32) -> Self
    where
        C: SchemaClient,
        S: StorageBackend,
    {
        let mut relation_graph = Self::new();
        let mut processed: BTreeSet<String> = BTreeSet::new();
        let mut queue: VecDeque<(String, u32)> = VecDeque::from([(root.to_string(), depth)]);

        while let Some((model, remaining)) = queue.pop_front() {
            if remaining == 0 || !processed.insert(model.clone()) {
                continue;
            }

            let fields = cache.fields(&model, CacheOptions::default());
            if fields.is_empty() {
                warn!("No fields for {}, leaving it as a leaf", model);
            }

            let source = relation_graph.node(&model);
            let mut related: BTreeSet<String> = BTreeSet::new();
            for (name, field) in &fields {
                let Some(relation) = field.relation() else {
                    continue;
                };
                let target = relation_graph.node(&relation.model);
                relation_graph.graph.add_edge(
                    source,
                    target,
                    RelationEdge {
                        field: name.clone(),
                        kind: relation.kind,
                    },
                );
                related.insert(relation.model.clone());
            }

            if remaining > 1 {
                for next in related {
                    if next != model {
                        debug!("Following {} -> {}", model, next);
                        queue.push_back((next, remaining - 1));
                    }
                }
            }
        }

        relation_graph
    }

    pub fn model_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, model: &str) -> bool {
        self.nodes.contains_key(model)
    }

    /// True when some chain of relations leads back to where it started
    pub fn has_cycle(&self) -> bool {
        petgraph::algo::is_cyclic_directed(&self.graph)
    }

    /// Edges as (from, to, edge) in discovery order
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, &RelationEdge)> {
        self.graph.edge_indices().filter_map(move |edge| {
            let (from, to) = self.graph.edge_endpoints(edge)?;
            Some((
                self.graph[from].as_str(),
                self.graph[to].as_str(),
                &self.graph[edge],
            ))
        })
    }
}

fn node_id(model: &str) -> String {
    model.replace('.', "_")
}

fn render_mermaid(graph: &RelationGraph) -> Vec<String> {
    let mut lines = vec!["graph TD".to_string()];
    for (from, to, edge) in graph.edges() {
        let (from, to) = (node_id(from), node_id(to));
        lines.push(match edge.kind {
            RelationKind::Many2one => format!("    {} -->|{}| {}", from, edge.field, to),
            RelationKind::One2many => format!("    {} -->|{} 1..n| {}", from, edge.field, to),
            RelationKind::Many2many => format!("    {} <-->|{}| {}", from, edge.field, to),
        });
    }
    lines
}

fn render_plantuml(graph: &RelationGraph, style: &DiagramStyle) -> Vec<String> {
    let mut lines = vec!["@startuml".to_string()];
    if style.monochrome {
        lines.push("skinparam monochrome true".to_string());
    }
    if let Some(color) = &style.background_color {
        lines.push(format!("skinparam backgroundColor {}", color));
    }
    for (from, to, edge) in graph.edges() {
        let (from, to) = (node_id(from), node_id(to));
        lines.push(match edge.kind {
            RelationKind::Many2one => format!("{} \"n\" --> \"1\" {} : {}", from, to, edge.field),
            RelationKind::One2many => format!("{} \"1\" --o \"n\" {} : {}", from, to, edge.field),
            RelationKind::Many2many => format!("{} \"n\" --* \"n\" {} : {}", from, to, edge.field),
        });
    }
    lines.push("@enduml".to_string());
    lines
}

#[derive(Debug, Clone, Default)]
pub struct DiagramExporter {
    format: DiagramFormat,
    style: DiagramStyle,
}

impl DiagramExporter {
    pub fn new(format: DiagramFormat) -> Self {
        Self {
            format,
            style: DiagramStyle::default(),
        }
    }

    pub fn with_style(mut self, style: DiagramStyle) -> Self {
        self.style = style;
        self
    }

    pub fn render(&self, graph: &RelationGraph) -> String {
        let lines = match self.format {
            DiagramFormat::Mermaid => render_mermaid(graph),
            DiagramFormat::PlantUml => render_plantuml(graph, &self.style),
        };
        lines.join("\n")
    }

    /// Diagram of `model` and the models reachable within `depth` relation hops
    pub fn export<C, S>(
        &self,
        cache: &mut MetadataCache<C, S>,
        model: &str,
        depth: u32,
    ) -> Result<ExportResult, ExportError>
    where
        C: SchemaClient,
        S: StorageBackend,
    {
        if !cache.is_known_model(model) {
            return Err(ExportError::ModelNotFound(model.to_string()));
        }
        if depth == 0 {
            warn!("Diagram depth is 0 for {}, nothing to draw", model);
            return Ok(ExportResult::new("", self.format.to_string()));
        }

        let graph = RelationGraph::build(cache, model, depth);
        debug!(
            "Diagram for {}: {} models, {} relations",
            model,
            graph.model_count(),
            graph.edge_count()
        );
        Ok(ExportResult::new(self.render(&graph), self.format.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::InMemorySchemaClient;
    use crate::models::{Field, FieldSchema, ModelInfo, ScalarType};
    use tempfile::TempDir;

    fn client() -> InMemorySchemaClient {
        let mut partner = FieldSchema::new();
        partner.insert("name".to_string(), Field::scalar(ScalarType::Char));
        partner.insert("country_id".to_string(), Field::many2one("res.country"));
        partner.insert("parent_id".to_string(), Field::many2one("res.partner"));
        partner.insert(
            "child_ids".to_string(),
            Field::one2many("res.partner", "parent_id"),
        );
        partner.insert(
            "category_id".to_string(),
            Field::many2many("res.partner.category"),
        );

        let mut country = FieldSchema::new();
        country.insert("currency_id".to_string(), Field::many2one("res.currency"));

        InMemorySchemaClient::default()
            .with_model(ModelInfo::new("res.partner"), partner)
            .with_model(ModelInfo::new("res.country"), country)
            .with_model(ModelInfo::new("res.currency"), FieldSchema::new())
            .with_model(ModelInfo::new("res.partner.category"), FieldSchema::new())
    }

    #[test]
    fn test_mermaid_depth_one() {
        let temp = TempDir::new().unwrap();
        let mut cache = MetadataCache::open_dir(client(), temp.path()).unwrap();

        let result = DiagramExporter::new(DiagramFormat::Mermaid)
            .export(&mut cache, "res.partner", 1)
            .unwrap();

        let expected = "\
graph TD
    res_partner <-->|category_id| res_partner_category
    res_partner -->|child_ids 1..n| res_partner
    res_partner -->|country_id| res_country
    res_partner -->|parent_id| res_partner";
        assert_eq!(result.content, expected);
    }

    #[test]
    fn test_plantuml_with_style_and_depth() {
        let temp = TempDir::new().unwrap();
        let mut cache = MetadataCache::open_dir(client(), temp.path()).unwrap();

        let style = DiagramStyle::default()
            .with_monochrome(true)
            .with_background_color("#FFFFFF");
        let result = DiagramExporter::new(DiagramFormat::PlantUml)
            .with_style(style)
            .export(&mut cache, "res.partner", 2)
            .unwrap();

        let lines: Vec<&str> = result.content.lines().collect();
        assert_eq!(lines[0], "@startuml");
        assert_eq!(lines[1], "skinparam monochrome true");
        assert_eq!(lines[2], "skinparam backgroundColor #FFFFFF");
        assert!(lines.contains(&"res_country \"n\" --> \"1\" res_currency : currency_id"));
        assert!(lines.contains(&"res_partner \"1\" --o \"n\" res_partner : child_ids"));
        assert_eq!(lines.last(), Some(&"@enduml"));
    }

    #[test]
    fn test_graph_structure() {
        let temp = TempDir::new().unwrap();
        let mut cache = MetadataCache::open_dir(client(), temp.path()).unwrap();

        let graph = RelationGraph::build(&mut cache, "res.partner", 2);
        assert_eq!(graph.model_count(), 4);
        assert_eq!(graph.edge_count(), 5);
        assert!(graph.contains("res.currency"));
        assert!(graph.has_cycle());
    }

    #[test]
    fn test_depth_zero_and_unknown_model() {
        let temp = TempDir::new().unwrap();
        let mut cache = MetadataCache::open_dir(client(), temp.path()).unwrap();
        let exporter = DiagramExporter::new(DiagramFormat::Mermaid);

        assert!(exporter.export(&mut cache, "res.partner", 0).unwrap().is_empty());
        assert!(matches!(
            exporter.export(&mut cache, "res.missing", 1),
            Err(ExportError::ModelNotFound(_))
        ));
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("PlantUML".parse::<DiagramFormat>().unwrap(), DiagramFormat::PlantUml);
        assert_eq!(DiagramFormat::Mermaid.extension(), "mmd");
        assert!(matches!(
            "dot".parse::<DiagramFormat>(),
            Err(ExportError::InvalidFormat(name)) if name.starts_with("dot")
        ));
    }
}
