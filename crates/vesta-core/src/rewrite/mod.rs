//! Source rewrites applied to JavaScript cells before they are wrapped in a
//! cell function.

mod files;
mod imports;

pub use files::rewrite_file_expressions;
pub use imports::{
    has_import_declaration, resolve_import_source, rewrite_import_declarations,
    rewrite_import_expressions,
};
