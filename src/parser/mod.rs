pub mod explodes;
pub mod subparser;

pub use explodes::{explode_link, parse_link};
pub use subparser::{extract_nodes_from_content, ExtractedLink};
