//! Diagram builders: table neighbourhoods, schema summaries and orphans.
//!
//! Builders only read the schema. Implied constraints must already be
//! linked before any of them runs.

use super::columns::ColumnChain;
use super::edges::{compare_edges, edges_for, Edge, Scope};
use super::format::{
    Degrees, DiagramName, Digraph, DotEdge, DotHeader, DotNode, DotSettings, Element, NodeConfig,
};
use super::link::{table_link, SourceKind};
use crate::schema::{ColumnRef, ConstraintId, Schema, TableId};
use ahash::AHashSet;
use std::collections::BTreeSet;

/// A rendered diagram and what went into it
#[derive(Debug, Clone)]
pub struct DotDiagram {
    pub name: DiagramName,
    pub dot: String,
    /// Tables drawn as nodes, in output order
    pub tables_written: Vec<TableId>,
    /// Implied constraints that would have widened the diagram
    pub skipped_implied: Vec<ConstraintId>,
    /// Table diagrams: an implied edge was drawn. Summaries: some table is
    /// only connected through implied relationships.
    pub wrote_implied: bool,
}

impl DotDiagram {
    pub fn table_count(&self) -> usize {
        self.tables_written.len()
    }
}

fn sort_tables(schema: &Schema, tables: &mut [TableId]) {
    tables.sort_by(|&a, &b| schema.compare_tables(a, b));
}

/// Tables directly related to `table` through non-excluded columns.
///
/// Implied relationships are left out unless `include_implied`; the
/// constraints behind them are recorded in `skipped`.
fn immediate_relatives(
    schema: &Schema,
    table: TableId,
    include_excluded: bool,
    include_implied: bool,
    skipped: &mut BTreeSet<ConstraintId>,
) -> Vec<TableId> {
    let chain = ColumnChain::for_diagram(include_excluded);
    let mut related = AHashSet::new();

    let mut consider = |parent: ColumnRef, child: ColumnRef, other: TableId| {
        match schema.constraint_id_between(parent, child) {
            Some(id) if !include_implied && schema.is_implied(parent, child) => {
                skipped.insert(id);
            }
            _ => {
                related.insert(other);
            }
        }
    };

    for column in chain.table_columns(schema, table) {
        for child in chain.children(schema, column) {
            consider(column, child, child.table);
        }
        for parent in chain.parents(schema, column) {
            consider(parent, column, parent.table);
        }
    }

    related.remove(&table);
    let mut relatives: Vec<TableId> = related.into_iter().collect();
    sort_tables(schema, &mut relatives);
    relatives
}

/// Draw `focal` with its relatives, one or two degrees out.
pub fn table_diagram(
    schema: &Schema,
    settings: &DotSettings,
    focal: TableId,
    degrees: Degrees,
    include_implied: bool,
) -> DotDiagram {
    let name = DiagramName::Table {
        degrees,
        implied: include_implied,
    };
    let two_degrees = degrees == Degrees::Two;
    let mut skipped = BTreeSet::new();

    let relatives = immediate_relatives(schema, focal, true, include_implied, &mut skipped);
    let relative_set: AHashSet<TableId> = relatives.iter().copied().collect();

    let mut edges = edges_for(schema, Scope::Single(focal), false, include_implied);
    let mut written: AHashSet<TableId> = AHashSet::new();
    written.insert(focal);
    let mut nodes: Vec<(TableId, NodeConfig)> = Vec::new();

    for &relative in &relatives {
        if !written.insert(relative) {
            continue;
        }
        nodes.push((relative, NodeConfig::columns(false, false)));
        edges.extend(edges_for(
            schema,
            Scope::Pair(relative, focal),
            true,
            include_implied,
        ));
    }

    let mut all_cousins: AHashSet<TableId> = AHashSet::new();
    let mut cousin_edges: AHashSet<Edge> = AHashSet::new();

    if two_degrees {
        for &relative in &relatives {
            let cousins = immediate_relatives(schema, relative, false, include_implied, &mut skipped);
            for &cousin in &cousins {
                if !written.insert(cousin) {
                    continue;
                }
                cousin_edges.extend(edges_for(
                    schema,
                    Scope::Pair(cousin, relative),
                    false,
                    include_implied,
                ));
                nodes.push((cousin, NodeConfig::title_only()));
            }
            all_cousins.extend(cousins);
        }
    }

    // glue together participants that aren't connected yet
    let participants: Vec<TableId> = nodes.iter().map(|(id, _)| *id).collect();
    for (i, &a) in participants.iter().enumerate() {
        for &b in &participants[i + 1..] {
            let involves_cousin = all_cousins.contains(&a) || all_cousins.contains(&b);
            for edge in edges_for(schema, Scope::Pair(a, b), false, include_implied) {
                if two_degrees && involves_cousin {
                    cousin_edges.insert(edge);
                } else {
                    edges.insert(edge);
                }
            }
        }
    }

    nodes.push((focal, NodeConfig::columns(true, true)));

    let mut dot_edges: Vec<DotEdge> = Vec::with_capacity(edges.len() + cousin_edges.len());
    for &edge in &edges {
        let mut dot_edge = DotEdge::new(schema, edge);
        if edge.points_to(focal) {
            dot_edge.connect_to_parent_details(schema);
        }
        dot_edges.push(dot_edge);
    }
    // loose ends go to the title of second degree tables
    for &edge in cousin_edges.iter().filter(|e| !edges.contains(*e)) {
        let mut dot_edge = DotEdge::new(schema, edge);
        let is_outer = |t: TableId| all_cousins.contains(&t) && !relative_set.contains(&t);
        if is_outer(edge.parent_table()) {
            dot_edge.connect_to_parent_title();
        }
        if is_outer(edge.child_table()) {
            dot_edge.connect_to_child_title();
        }
        dot_edges.push(dot_edge);
    }
    dot_edges.sort_by(|a, b| compare_edges(schema, &a.edge, &b.edge));

    let mut implied_tables: AHashSet<TableId> = AHashSet::new();
    for dot_edge in dot_edges.iter().filter(|e| e.edge.implied) {
        implied_tables.insert(dot_edge.edge.parent_table());
        implied_tables.insert(dot_edge.edge.child_table());
    }

    nodes.sort_by(|a, b| schema.compare_tables(a.0, b.0));
    let dot_nodes: Vec<DotNode> = nodes
        .iter()
        .filter_map(|&(id, config)| {
            let table = schema.table(id)?;
            let link = table_link(SourceKind::TableDiagram, table, settings.relative_links);
            let mut node = DotNode::new(schema, settings, id, link, config);
            node.set_show_implied(implied_tables.contains(&id));
            Some(node)
        })
        .collect();

    let graph_name = name.graph_name();
    let header = DotHeader::new(settings, true);
    let mut graph = Digraph::new(&graph_name, &header);
    for dot_edge in &dot_edges {
        graph.push(dot_edge);
    }
    for node in &dot_nodes {
        graph.push(node);
    }

    log::debug!(
        "{} for {}: {} tables, {} edges",
        graph_name,
        schema.table(focal).map(|t| t.full_name()).unwrap_or_default(),
        dot_nodes.len(),
        dot_edges.len()
    );

    DotDiagram {
        dot: graph.render(),
        tables_written: dot_nodes.iter().map(|n| n.table_id()).collect(),
        skipped_implied: skipped.into_iter().collect(),
        wrote_implied: !implied_tables.is_empty(),
        name,
    }
}

/// Draw every related table of the schema plus remote tables.
///
/// Compact diagrams hide trivial columns.
pub fn summary_diagram(
    schema: &Schema,
    settings: &DotSettings,
    compact: bool,
    include_implied: bool,
) -> DotDiagram {
    let name = DiagramName::Summary {
        compact,
        implied: include_implied,
    };
    let config = NodeConfig::columns(!compact, false);

    let mut tables: Vec<TableId> = schema
        .local_tables()
        .filter(|t| !schema.is_orphan(t.id, include_implied))
        .chain(schema.remote_tables())
        .map(|t| t.id)
        .collect();
    sort_tables(schema, &mut tables);

    let mut edges: AHashSet<Edge> = AHashSet::new();
    for &table in &tables {
        edges.extend(edges_for(schema, Scope::Single(table), false, include_implied));
    }
    let mut edges: Vec<Edge> = edges.into_iter().collect();
    edges.sort_by(|a, b| compare_edges(schema, a, b));

    let graph_name = name.graph_name();
    let header = DotHeader::new(settings, true);
    let mut graph = Digraph::new(&graph_name, &header);
    for &id in &tables {
        if let Some(table) = schema.table(id) {
            let link = table_link(SourceKind::SummaryDiagram, table, settings.relative_links);
            graph.push(&DotNode::new(schema, settings, id, link, config));
        }
    }
    for &edge in &edges {
        graph.push(&DotEdge::new(schema, edge));
    }

    let wrote_implied = include_implied && tables.iter().any(|&t| schema.is_orphan(t, false));

    DotDiagram {
        dot: graph.render(),
        tables_written: tables,
        skipped_implied: Vec::new(),
        wrote_implied,
        name,
    }
}

/// Single-node diagram for a table without relationships
pub fn orphan_diagram(schema: &Schema, settings: &DotSettings, table: TableId) -> Option<DotDiagram> {
    let t = schema.table(table)?;
    let name = DiagramName::Orphan(t.name.clone());
    let link = table_link(SourceKind::SummaryDiagram, t, settings.relative_links);
    let node = DotNode::new(schema, settings, table, link, NodeConfig::columns(true, true));
    let header = DotHeader::new(settings, false);

    Some(DotDiagram {
        dot: Digraph::single_node(&name.graph_name(), &header, &node as &dyn Element),
        tables_written: vec![table],
        skipped_implied: Vec::new(),
        wrote_implied: false,
        name,
    })
}
