pub mod output;
pub mod scoring;
pub mod settings;
pub mod workdir;
