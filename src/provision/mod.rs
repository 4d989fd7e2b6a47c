//! Asset provisioning: guarantee a local copy of the seed database exists
//! before anything opens it.

mod location;
mod provisioner;
mod transfer;

pub use location::DbLocation;
pub use provisioner::{ProvisionReport, Provisioned, Provisioner, StagingOutcome};
pub use transfer::{FsTransfer, Transfer};
