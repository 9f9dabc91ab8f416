// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # cerebro
//!
//! A conversational reasoning agent that keeps its knowledge in a weighted
//! concept graph, answers by graph traversal, and adapts from user feedback.
//!
//! ## Architecture
//!
//! - **Concept graph** (`graph`): undirected, weighted, keyed by normalized text (petgraph)
//! - **Consciousness** (`consciousness`): identity, decision impacts, restrictions
//! - **Reasoning** (`reason`): path inference with fallback linking
//! - **Policy** (`policy`): tabular Q-learning over query states
//! - **Coordinator** (`coordinator`): the query → answer → feedback cycle
//! - **Storage** (`store`): write-through JSON files, one per store
//!
//! ## Library usage
//!
//! ```no_run
//! use cerebro::config::CerebroConfig;
//! use cerebro::coordinator::FeedbackCoordinator;
//! use cerebro::language::LexicalLanguageService;
//!
//! let mut cerebro = FeedbackCoordinator::open(
//!     CerebroConfig::with_data_dir("/tmp/cerebro"),
//!     Box::new(LexicalLanguageService::new()),
//! )
//! .unwrap();
//! cerebro.remember("tigre", "felino", 1.0);
//! cerebro.remember("felino", "carnivoro", 1.0);
//! let interaction = cerebro.handle_query("tigre es carnivoro");
//! println!("{}", interaction.answer);
//! ```

pub mod config;
pub mod consciousness;
pub mod coordinator;
pub mod error;
pub mod feedback;
pub mod graph;
pub mod language;
pub mod normalize;
pub mod paths;
pub mod policy;
pub mod reason;
pub mod store;
