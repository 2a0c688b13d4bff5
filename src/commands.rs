pub mod evaluate;
pub mod tsv;
