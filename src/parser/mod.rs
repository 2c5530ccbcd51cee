pub mod olx_parser;

pub use olx_parser::OlxParser;
