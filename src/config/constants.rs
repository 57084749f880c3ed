// Time Constants
pub const YEAR_MIN: u32 = 1990;
pub const YEAR_MAX: u32 = 2100;

// Milestone years picked out by the comparison charts (intersected with the
// years actually present in the dataset)
pub const MILESTONE_YEARS: [u32; 3] = [2030, 2040, 2050];

// Processed Dataset Conventions
pub const CO2EQ_INDICATOR: &str = "CO2eq";
pub const NO_BUDGET_LABEL: &str = "NoBudget";
pub const PROCESSED_CSV: &str = "processed_dataset.csv";
pub const PROCESSED_PARQUET: &str = "processed_dataset.parquet";

// Raw Export Conventions
pub const EPS_SENTINEL: &str = "Eps";            // solver sentinel for "present but negligible"

// Chart Output Conventions
pub const DATA_EXTRACT_FILE: &str = "data.csv";
pub const GALLERY_DIR: &str = "gallery";
pub const RUN_REPORT_FILE: &str = "run_report.json";

// Carbon Budget Thresholds
pub const LOW_BUDGET_MAX_GT: f64 = 8.0;          // budget_lines keeps scenarios at or below this

// Render Scaling
pub const BASE_RENDER_WIDTH: u32 = 1200;         // scale 1.0 reference width
pub const BASE_RENDER_HEIGHT: u32 = 800;

// Unit Conversions
pub const KT_PER_GT: f64 = 1_000_000.0;
