//! Command-line driver for papas.
//!
//! Builds blocks and reconstructs particles for events described in JSON,
//! or for a built-in demonstration event.

use clap::{Parser, Subcommand};
use log::{info, warn};
use papas_algorithms::{process_event, BlockBuilderConfig, EventSummary, PipelineConfig};
use papas_core::ruler::{from_fn, require_elements};
use papas_core::{
    Category, Cluster, Event, Identifier, IdentifierRegistry, Link, LinkKind, ObjectRef,
    SimParticle, Subtype, Track, CHARGED_HADRON, PHOTON,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;
use std::time::Instant;
use thiserror::Error;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Core error: {0}")]
    Core(#[from] papas_core::Error),

    #[error("unknown element name: {0}")]
    UnknownName(String),

    #[error("duplicate element name: {0}")]
    DuplicateName(String),
}

/// Block building and rule-based particle reconstruction.
#[derive(Parser)]
#[command(name = "papas")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconstruct events described in a JSON file
    Run {
        /// Input JSON file holding a list of events
        input: PathBuf,

        /// Evaluate element pairs in parallel
        #[arg(long)]
        parallel: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Reconstruct the built-in two-hadron, one-photon event
    Demo {
        /// Number of copies of the event to process in one run
        #[arg(short, long, default_value = "1")]
        events: usize,

        /// Evaluate element pairs in parallel
        #[arg(long)]
        parallel: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Named detector element in an input event.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ElementSpec {
    name: String,
    #[serde(default)]
    energy: f64,
}

/// Simulated particle and the elements it produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SimSpec {
    name: String,
    pdg_id: i32,
    #[serde(default)]
    produced: Vec<String>,
}

/// One event: elements, truth particles and the linked element pairs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct EventSpec {
    #[serde(default)]
    tracks: Vec<ElementSpec>,
    #[serde(default)]
    ecal: Vec<ElementSpec>,
    #[serde(default)]
    hcal: Vec<ElementSpec>,
    #[serde(default)]
    sim_particles: Vec<SimSpec>,
    #[serde(default)]
    links: Vec<(String, String)>,
}

#[derive(Debug, Serialize)]
struct BlockReport {
    id: String,
    signature: String,
    active: bool,
    elements: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ParticleReport {
    id: String,
    pdg_id: i32,
    parents: Vec<String>,
    origin: Vec<String>,
}

#[derive(Debug, Serialize)]
struct EventReport {
    event: usize,
    blocks: Vec<BlockReport>,
    particles: Vec<ParticleReport>,
    unmatched_blocks: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Commands::Run {
            input,
            parallel,
            json,
        } => {
            let text = std::fs::read_to_string(&input)?;
            let specs: Vec<EventSpec> = serde_json::from_str(&text)?;
            info!("read {} events from {}", specs.len(), input.display());
            run(&specs, parallel, json)
        }
        Commands::Demo {
            events,
            parallel,
            json,
        } => {
            let specs = vec![demo_event(); events];
            run(&specs, parallel, json)
        }
    }
}

/// Processes every event with one registry, as one run.
fn run(specs: &[EventSpec], parallel: bool, json: bool) -> Result<()> {
    let registry = IdentifierRegistry::new();
    let config =
        PipelineConfig::new().with_builder(BlockBuilderConfig::new().with_parallel(parallel));
    let start = Instant::now();

    let mut reports = Vec::with_capacity(specs.len());
    for (index, spec) in specs.iter().enumerate() {
        let (mut event, names) = populate(spec, &registry)?;
        let links = resolve_links(spec, &names)?;
        let ruler = from_fn(move |a: ObjectRef<'_>, b: ObjectRef<'_>| {
            require_elements(a, b)?;
            let linked = links.contains(&ordered(a.id(), b.id()));
            Ok(Link::new(
                LinkKind::between(a.category(), b.category()),
                linked,
                if linked { 0.0 } else { 1.0 },
            ))
        });

        let summary = process_event(&mut event, ruler, &registry, &config)?;
        if summary.statistics.unmatched_blocks > 0 {
            warn!(
                "event {index}: {} blocks matched no reconstruction rule",
                summary.statistics.unmatched_blocks
            );
        }
        reports.push(report(index, &event, &summary, &names)?);
    }

    info!(
        "processed {} events in {:.2?}",
        specs.len(),
        start.elapsed()
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            print_report(report);
        }
    }
    Ok(())
}

/// Creates identifiers and objects for every named entry of `spec`.
fn populate(
    spec: &EventSpec,
    registry: &IdentifierRegistry,
) -> Result<(Event, BTreeMap<String, Identifier>)> {
    let mut event = Event::new();
    let mut names = BTreeMap::new();
    let mut register = |name: &str, id: Identifier| -> Result<Identifier> {
        if names.insert(name.to_string(), id).is_some() {
            return Err(CliError::DuplicateName(name.to_string()));
        }
        Ok(id)
    };

    for track in &spec.tracks {
        let id = register(&track.name, registry.make_id(Category::Track, Subtype::Detector)?)?;
        event.add_track(Track::new(id, track.energy))?;
    }
    for cluster in &spec.ecal {
        let id = register(
            &cluster.name,
            registry.make_id(Category::EcalCluster, Subtype::Detector)?,
        )?;
        event.add_ecal_cluster(Cluster::new(id, cluster.energy))?;
    }
    for cluster in &spec.hcal {
        let id = register(
            &cluster.name,
            registry.make_id(Category::HcalCluster, Subtype::Detector)?,
        )?;
        event.add_hcal_cluster(Cluster::new(id, cluster.energy))?;
    }
    for particle in &spec.sim_particles {
        let id = register(
            &particle.name,
            registry.make_id(Category::Particle, Subtype::Generated)?,
        )?;
        event.add_sim_particle(SimParticle::new(id, particle.pdg_id))?;
    }

    for particle in &spec.sim_particles {
        let parent = lookup(&names, &particle.name)?;
        for produced in &particle.produced {
            event.add_history_link(parent, lookup(&names, produced)?)?;
        }
    }

    Ok((event, names))
}

fn lookup(names: &BTreeMap<String, Identifier>, name: &str) -> Result<Identifier> {
    names
        .get(name)
        .copied()
        .ok_or_else(|| CliError::UnknownName(name.to_string()))
}

fn ordered(a: Identifier, b: Identifier) -> (Identifier, Identifier) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn resolve_links(
    spec: &EventSpec,
    names: &BTreeMap<String, Identifier>,
) -> Result<HashSet<(Identifier, Identifier)>> {
    spec.links
        .iter()
        .map(|(a, b)| Ok(ordered(lookup(names, a)?, lookup(names, b)?)))
        .collect()
}

fn report(
    index: usize,
    event: &Event,
    summary: &EventSummary,
    names: &BTreeMap<String, Identifier>,
) -> Result<EventReport> {
    let labels: HashMap<Identifier, &str> = names
        .iter()
        .map(|(name, id)| (*id, name.as_str()))
        .collect();
    let label = |id: Identifier| {
        labels
            .get(&id)
            .map_or_else(|| id.to_string(), |name| (*name).to_string())
    };

    let blocks = event
        .blocks
        .values()
        .map(|block| BlockReport {
            id: block.id().to_string(),
            signature: block.signature(),
            active: block.is_active(),
            elements: block.element_ids().iter().map(|id| label(*id)).collect(),
        })
        .collect();

    let mut particles = Vec::with_capacity(summary.particles.len());
    for &id in &summary.particles {
        let particle = match event.get_object(id)? {
            ObjectRef::ReconstructedParticle(particle) => *particle,
            _ => return Err(papas_core::Error::UnknownIdentifier(id).into()),
        };
        let node = event
            .history
            .node(id)
            .ok_or(papas_core::Error::UnknownIdentifier(id))?;
        let origin = event
            .history
            .breadth_first_search(id, papas_core::Traversal::Parents)?
            .into_iter()
            .filter(|ancestor| ancestor.subtype() == Subtype::Generated)
            .map(label)
            .collect();
        particles.push(ParticleReport {
            id: id.to_string(),
            pdg_id: particle.pdg_id,
            parents: node.parents().map(label).collect(),
            origin,
        });
    }

    Ok(EventReport {
        event: index,
        blocks,
        particles,
        unmatched_blocks: summary.statistics.unmatched_blocks,
    })
}

fn print_report(report: &EventReport) {
    println!("Event {}", report.event);
    for block in &report.blocks {
        println!(
            "  block {:<8} {:<8} [{}]{}",
            block.id,
            block.signature,
            block.elements.join(", "),
            if block.active { "" } else { " (split)" }
        );
    }
    for particle in &report.particles {
        println!(
            "  particle {:<8} pdg {:>4} from [{}] origin [{}]",
            particle.id,
            particle.pdg_id,
            particle.parents.join(", "),
            particle.origin.join(", ")
        );
    }
}

/// Two charged hadrons and a photon: a track-ecal pair, a track-ecal-hcal
/// triple and a lone ecal cluster.
fn demo_event() -> EventSpec {
    let element = |name: &str, energy: f64| ElementSpec {
        name: name.to_string(),
        energy,
    };
    let sim = |name: &str, pdg_id: i32, produced: &[&str]| SimSpec {
        name: name.to_string(),
        pdg_id,
        produced: produced.iter().map(|p| (*p).to_string()).collect(),
    };
    let link = |a: &str, b: &str| (a.to_string(), b.to_string());

    EventSpec {
        tracks: vec![element("track1", 10.0), element("track2", 20.0)],
        ecal: vec![
            element("ecal101", 8.0),
            element("ecal102", 5.0),
            element("ecal103", 3.0),
        ],
        hcal: vec![element("hcal202", 14.0)],
        sim_particles: vec![
            sim("sim301", CHARGED_HADRON, &["track1", "ecal101"]),
            sim("sim302", CHARGED_HADRON, &["track2", "ecal102", "hcal202"]),
            sim("sim303", PHOTON, &["ecal103"]),
        ],
        links: vec![
            link("track1", "ecal101"),
            link("track2", "ecal102"),
            link("track2", "hcal202"),
            link("ecal102", "hcal202"),
        ],
    }
}
