// CAUSEWAY DEMO DRIVER
// External caller over the core: builds scenarios, invokes the public
// operations, and prints their results. No protocol logic lives here.

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;

use causeway_net::{is_linearizable, required_quorum, NodeSpec, Propagator, Topology};

#[derive(Parser)]
#[command(name = "causeway")]
#[command(about = "Causal ordering and Byzantine quorum demo driver", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the seven-node regional partition scenario
    Simulate,

    /// Compute the minimum verification quorum for n nodes and f faults
    Quorum {
        /// Total number of nodes
        n: i64,
        /// Maximum Byzantine faults to tolerate
        f: i64,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate => simulate_partition(),
        Commands::Quorum { n, f } => {
            let k = required_quorum(n, f)?;
            println!(
                "Minimum k = n - f + 1 = {} - {} + 1 = {}: at least {} nodes must verify a clock update",
                n, f, k, k
            );
            Ok(())
        }
    }
}

/// The regional scenario: A,B,C (us-east), D,E (eu-west), F,G (ap-south).
/// E is fully isolated, D can receive from us-east but not send back, and
/// F is Byzantine.
fn simulate_partition() -> Result<()> {
    println!("=== Network Partition Simulation ===");
    println!("Nodes: A,B,C (us-east), D,E (eu-west), F,G (ap-south)");
    println!("Node D has a unidirectional link: receives from us-east but cannot send");
    println!("Node E is fully isolated; node F is Byzantine");
    println!();

    let mut topology = Topology::new(vec![
        NodeSpec::new("A", true, &["B", "C", "D"]),
        NodeSpec::new("B", true, &["A", "C", "D"]),
        NodeSpec::new("C", true, &["A", "B", "D"]),
        NodeSpec::new("D", true, &["A", "B", "C", "E"]),
        NodeSpec::new("E", true, &["D"]),
        NodeSpec::new("F", false, &["G"]),
        NodeSpec::new("G", true, &["F"]),
    ])?;

    topology.set_leader("A");
    topology.set_partition("E", true);
    for target in ["A", "B", "C"] {
        topology.set_edge_blocked("D", target, true);
    }

    println!("Leader set to: {}", topology.leader_id().unwrap_or("<none>"));
    println!();

    let propagator = Propagator::new();

    println!("Client submits write W1 to A (leader)");
    let w1 = topology
        .node("A")
        .expect("node A registered above")
        .emit_update();
    let report = propagator.propagate(&topology, "A", &w1)?;
    info!("W1 fan-out: {:?}", report.deliveries);
    println!(
        "W1 timestamp {}: {} accepted, {} dropped",
        w1.timestamp,
        report.accepted_count(),
        report.dropped_count()
    );

    println!("Stale client submits write W2 to E (isolated partition)");
    let w2 = topology
        .node("E")
        .expect("node E registered above")
        .emit_update();
    let report = propagator.propagate(&topology, "E", &w2)?;
    println!(
        "W2 timestamp {}: {} accepted, {} dropped",
        w2.timestamp,
        report.accepted_count(),
        report.dropped_count()
    );
    println!();

    println!("Vector Clocks:");
    for id in topology.node_ids() {
        let snapshot = topology
            .node(&id)
            .expect("id came from the topology")
            .vector_clock_snapshot();
        println!("Node {}: {}", id, serde_json::to_string(&snapshot)?);
    }
    println!();

    println!("Cryptographic Attestation:");
    println!("W1 (from A, honest): {}", w1);
    let w3 = topology
        .node("F")
        .expect("node F registered above")
        .emit_update();
    println!("W3 (from F, Byzantine): {}", w3);
    println!();

    println!("BFT Protocol Analysis:");
    let n = topology.len() as i64;
    let f = 2;
    let k = required_quorum(n, f)?;
    println!("Total nodes n = {}", n);
    println!("Byzantine faults f = {}", f);
    println!("Minimum k = n - f + 1 = {}", k);
    println!(
        "W1 verified by {} of the required {} nodes -> trusted: {}",
        propagator.verified_count(&w1.origin_id, w1.timestamp),
        k,
        propagator.is_trusted(&topology, &w1, f)?
    );
    println!();

    println!("=== Analysis ===");
    if is_linearizable(&topology) {
        println!("Linearizability: guaranteed in this scenario");
    } else {
        println!("Linearizability: NOT guaranteed in this scenario");
        println!("Contributing conditions:");
        println!("1. Isolated partitions preventing consensus");
        println!("2. Byzantine node F able to lie about vector clock timestamps");
        println!("3. Unidirectional link preventing proper coordination");
    }

    Ok(())
}
