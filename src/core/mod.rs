pub mod clues;
pub mod narrative;
pub mod persona;
pub mod play;
pub mod props;
pub mod similarity;
pub mod template;
pub mod vocabulary;
