pub mod margin;
pub mod report;
