pub mod aggregator;
pub mod chart;
pub mod excel;
pub mod report;
