pub mod cell_id;
pub mod dep_graph;
pub mod error;
pub mod events;
pub mod item;
pub mod model;
pub mod question;
pub mod ranking;
pub mod sheet;
pub mod status;

#[cfg(test)]
pub mod harness;
