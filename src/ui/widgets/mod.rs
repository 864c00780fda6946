//! Reusable UI widgets for devcyclesim.

pub mod help;
pub mod queue_table;
pub mod story_list;
pub mod throughput_chart;
