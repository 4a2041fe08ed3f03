pub mod dataset;
pub mod emissions;
pub mod kpi;
pub mod output;
pub mod pipeline;
pub mod schema;
pub mod scoring;
