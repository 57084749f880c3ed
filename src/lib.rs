// Module declarations for the emissions report builder

// Core pipeline modules
pub mod core {
    pub mod dataset;
    pub mod dispatch;
    pub mod transform;
}

// Configuration modules
pub mod config {
    pub mod constants;
    pub mod report_config;
}

// Model definitions
pub mod models {
    pub mod record;
    pub mod scenario;
}

// Data loaders
pub mod data {
    pub mod mappings_loader;
    pub mod raw_loader;
}

// Chart catalogue and shared plotting plumbing
pub mod charts {
    pub mod context;
    pub mod registry;
    pub mod style;

    pub mod methodology {
        pub mod carbon_budget_ladder;
        pub mod coverage_by_family;
        pub mod scenario_matrix;
    }

    pub mod results {
        pub mod budget_lines;
        pub mod budget_scatter;
        pub mod family_bands;
        pub mod milestone_bars;
        pub mod sector_breakdown;
        pub mod total_emissions;
    }

    #[cfg(test)]
    pub mod test_fixtures;
}

// Utility functions
pub mod utils {
    pub mod logging;
}

// CLI interface
pub mod cli {
    pub mod cli;
}

// Re-export commonly used types
pub use crate::core::dataset::Dataset;
pub use crate::core::transform::transform;
pub use crate::data::mappings_loader::MappingTables;
pub use crate::models::record::{ProcessedRecord, RawRecord};
