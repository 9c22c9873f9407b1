pub mod export;
/// Reading import from source CSV files.
pub mod import;
