pub mod day_filter;
pub mod name_cache;
