/// 杜拜金融市場
pub mod dfm;

pub use dfm::quote::QuoteExtractor;
