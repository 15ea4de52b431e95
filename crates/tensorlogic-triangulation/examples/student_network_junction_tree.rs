//! Junction tree construction example.
//!
//! Builds the moral graph of the classic "Student Network" Bayesian network and
//! triangulates it with the three elimination strategies.
//!
//! # Network Structure
//!
//! ```text
//!   Difficulty    Intelligence
//!          \      /       \
//!           v    v         v
//!           Grade         SAT
//!             |
//!             v
//!           Letter
//! ```
//!
//! Moralization marries Difficulty and Intelligence (the parents of Grade).

use tensorlogic_triangulation::{
    DefaultTriangulation, DomainSizes, NodeSet, OrderedTriangulation,
    PartialOrderedTriangulation, Triangulation, TriangulationConfig, UndirectedGraph,
};

const NAMES: [&str; 5] = ["Difficulty", "Intelligence", "Grade", "SAT", "Letter"];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Junction Tree Construction: Student Network ===\n");

    let (graph, sizes) = build_moral_graph()?;
    println!("Moral graph: {} nodes, {} edges", graph.size(), graph.size_edges());
    println!("Chordal: {}\n", graph.is_chordal());

    // Min-fill heuristic
    println!("--- Min-fill heuristic ---");
    let config = TriangulationConfig::new().with_fill_ins(true);
    let mut heuristic = DefaultTriangulation::with_graph(&graph, &sizes, config)?;
    report(&mut heuristic)?;

    // Imposed order: Grade first creates a large clique
    println!("--- Imposed order ---");
    let mut ordered = OrderedTriangulation::new(vec![2, 0, 1, 3, 4], config);
    ordered.set_graph(&graph, &sizes)?;
    report(&mut ordered)?;

    // Same order with recursive thinning of the fill-ins
    println!("--- Imposed order, minimal ---");
    ordered.set_config(config.with_minimality(true))?;
    report(&mut ordered)?;

    // Leaves of the network first, free order inside each group
    println!("--- Partial order ---");
    let mut partial = PartialOrderedTriangulation::new(
        vec![NodeSet::from([3, 4]), NodeSet::from([0, 1, 2])],
        config,
    );
    partial.set_graph(&graph, &sizes)?;
    report(&mut partial)?;

    Ok(())
}

fn build_moral_graph() -> Result<(UndirectedGraph, DomainSizes), Box<dyn std::error::Error>> {
    // Difficulty=0, Intelligence=1, Grade=2, SAT=3, Letter=4
    let graph = UndirectedGraph::from_edges(
        0..5,
        &[
            (0, 2), // Difficulty -> Grade
            (1, 2), // Intelligence -> Grade
            (1, 3), // Intelligence -> SAT
            (2, 4), // Grade -> Letter
            (0, 1), // married parents of Grade
        ],
    )?;
    // Grade has three values (A, B, C), the others two
    let sizes: DomainSizes = [(0, 2), (1, 2), (2, 3), (3, 2), (4, 2)].into_iter().collect();
    Ok((graph, sizes))
}

fn names(nodes: &NodeSet) -> Vec<&'static str> {
    nodes.iter().map(|&n| NAMES[n]).collect()
}

fn report(triangulation: &mut impl Triangulation) -> Result<(), Box<dyn std::error::Error>> {
    let order: Vec<&str> = triangulation
        .elimination_order()?
        .iter()
        .map(|&n| NAMES[n])
        .collect();
    println!("Elimination order: {:?}", order);

    let fill_ins: Vec<String> = triangulation
        .fill_ins()?
        .iter()
        .map(|e| format!("{}~{}", NAMES[e.first()], NAMES[e.second()]))
        .collect();
    println!("Fill-ins: {:?}", fill_ins);

    let tree = triangulation.junction_tree()?.clone();
    println!("Junction tree: {} cliques, treewidth {}", tree.size(), tree.treewidth());
    for (id, clique) in tree.cliques() {
        println!("  Clique {}: {:?}", id, names(clique));
    }
    for edge in tree.edges() {
        let separator = tree.separator(edge.first(), edge.second())?;
        println!(
            "  Separator {} - {}: {:?}",
            edge.first(),
            edge.second(),
            names(&separator)
        );
    }
    println!(
        "Running intersection property: {}",
        tree.verify_running_intersection_property()
    );
    println!(
        "Largest clique table: 10^{:.2} entries\n",
        triangulation.max_log10_clique_domain_size()?
    );
    Ok(())
}
