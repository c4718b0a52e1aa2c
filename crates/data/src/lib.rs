pub mod database;
pub mod models;
pub mod repositories;

pub use database::DatabaseClient;
pub use models::{shard_table, ArticleRecord, IndexRecord, LexiconRow, PriceRecord};
pub use repositories::{
    ArticleRepository, IndexRepository, LexiconSourceRepository, PriceRepository,
};
