pub mod file_kind;
