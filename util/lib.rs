pub mod finite;
pub mod progress_counter;
