use anyhow::{Context, Result};

use dagedit::prelude::*;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("dagedit=debug")),
        )
        .init();

    let mut service = GraphService::new();

    let graph = service.create_graph(CreateGraphPayload {
        name: "build pipeline".to_string(),
        initial_text: Some("checkout: build\nbuild: test, lint\ntest: package\nlint: package\npackage:".to_string()),
    })?;
    println!("created graph '{}' ({})", graph.name, graph.id);
    println!("{}\n", graph.adjacency_text);

    let package = graph
        .node_by_label("package")
        .context("package node should exist")?
        .id;
    let checkout = graph
        .node_by_label("checkout")
        .context("checkout node should exist")?
        .id;

    match service.add_edge(
        graph.id,
        AddEdgePayload {
            source_id: package,
            target_id: checkout,
        },
    ) {
        Ok(_) => println!("unexpected: back-edge was accepted"),
        Err(err) => {
            println!("rejected: {}", err.public);
            for violation in &err.violations {
                println!("  - {}", violation.public_message());
            }
        }
    }

    let graph = service.add_node(
        graph.id,
        AddNodePayload {
            x: 850.0,
            y: 100.0,
            label: Some("deploy".to_string()),
        },
    )?;
    let deploy = graph
        .node_by_label("deploy")
        .context("deploy node should exist")?
        .id;
    let graph = service.add_edge(
        graph.id,
        AddEdgePayload {
            source_id: package,
            target_id: deploy,
        },
    )?;
    println!("\nafter adding a deploy stage:");
    println!("{}", graph.adjacency_text);

    let graph = service.replace_from_text(
        graph.id,
        ReplaceFromTextPayload {
            text: "plan: execute\nexecute: review\nreview:".to_string(),
        },
    )?;
    println!("\nafter replacing from text:");
    println!("{}", graph.adjacency_text);
    println!("valid: {}", graph.is_valid);

    Ok(())
}
