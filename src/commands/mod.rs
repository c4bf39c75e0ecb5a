pub mod colour;
pub mod combine;
pub mod dpo_filter;
pub mod dpo_html;
pub mod extract;
pub mod retrieve;
pub mod summaries;
