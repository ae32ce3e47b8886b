//! Subcommand handlers.

pub mod archive;
pub mod proof;
pub mod verify;

pub use archive::{cmd_export, cmd_import};
pub use proof::{
    cmd_clear, cmd_create, cmd_delete, cmd_edit, cmd_list, cmd_show, cmd_stats, CreateArgs,
    EditArgs,
};
pub use verify::{cmd_audit, cmd_verify};
