pub mod fragment;
pub mod parser;

pub use fragment::{parse_hex_u64, validate_fragment_name, FragmentDescriptor};
pub use parser::{parse, try_parse, ManifestParser};
