//! Job lifecycle: launch, poll, harvest, list

pub mod harvester;
pub mod launcher;
pub mod listing;
pub mod poller;

/// Command every inventory job runs on its hosts
pub const PATCH_COMMAND: &str = "rpm -qa --last";

/// Description Satellite gives jobs running [`PATCH_COMMAND`]
pub const PATCH_JOB_DESCRIPTION: &str = "Run rpm -qa --last";
