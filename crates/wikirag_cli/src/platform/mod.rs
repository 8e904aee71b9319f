pub mod commands;
pub mod fs_wiki;
pub mod logging;
pub mod markup;
pub mod settings;
pub mod table;
