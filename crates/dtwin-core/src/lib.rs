//! dtwin core -- a discrete-event simulator for manufacturing digital twins.
//!
//! This crate turns a node/arc model of a production line into a frozen
//! topology and runs machines, queues and conveyors over simulated time
//! with deterministic, fixed-point event ordering.
//!
//! # Topology pipeline
//!
//! A [`model::ModelSpec`] passes through consuming stages, each owning its
//! slotmap arenas:
//!
//! 1. **Build** -- one machine per node, one queue per arc.
//! 2. **Merge** -- several input queues of a machine collapse into one.
//! 3. **Clusters** -- stage numbers propagate forward from the first machine.
//! 4. **Conveyors** -- one conveyor per output queue, wired both ways.
//! 5. **Branches** -- machines with several outbound conveyors become
//!    routing points.
//!
//! ```rust,ignore
//! let topology = Topology::from_spec(&spec, &config)?;
//! let mut engine = SimulationEngine::new(topology, config);
//! let summary = engine.run();
//! ```
//!
//! # Key Types
//!
//! - [`topology::Topology`] -- read-only result of the pipeline.
//! - [`engine::SimulationEngine`] -- scheduler plus lane/conveyor processes.
//! - [`sim::RunConfig`] -- loop type, stop condition, routing, seed.
//! - [`event::EventSink`] -- receives one record per part transition;
//!   [`event::EventLog`] keeps them in memory.
//! - [`fixed::SimTime`] -- Q32.32 fixed-point simulated time.

pub mod branch;
pub mod conveyor;
#[cfg(feature = "data-loader")]
pub mod data_loader;
pub mod engine;
pub mod event;
pub mod fixed;
pub mod generator;
pub mod id;
pub mod machine;
pub mod model;
pub mod part;
pub mod queue;
pub mod rng;
pub mod scheduler;
pub mod sim;
pub mod terminator;
pub mod topology;
pub mod validation;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
