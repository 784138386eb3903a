pub mod charts;
pub mod kpis;
pub mod preview;
