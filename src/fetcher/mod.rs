pub mod news;
pub mod prices;
pub mod rss;
