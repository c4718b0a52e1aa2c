pub mod article_repo;
pub mod index_repo;
pub mod lexicon_repo;
pub mod price_repo;

pub use article_repo::ArticleRepository;
pub use index_repo::IndexRepository;
pub use lexicon_repo::LexiconSourceRepository;
pub use price_repo::PriceRepository;
