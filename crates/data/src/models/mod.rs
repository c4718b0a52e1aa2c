pub mod article;
pub mod index;
pub mod lexicon;
pub mod price;

pub use article::ArticleRecord;
pub use index::IndexRecord;
pub use lexicon::LexiconRow;
pub use price::{shard_table, PriceRecord};
