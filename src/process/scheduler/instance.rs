/*!
 * Global Scheduler Instance
 * Installed once at boot for code that cannot carry a handle (interrupt handlers)
 */

use super::ProcessScheduler;
use crate::core::errors::{SchedulerError, SchedulerResult};
use std::sync::{Arc, OnceLock};
use tracing::info;

static INSTANCE: OnceLock<Arc<ProcessScheduler>> = OnceLock::new();

/// Install the system-wide scheduler. Fails if one is already installed.
pub fn install(scheduler: Arc<ProcessScheduler>) -> SchedulerResult<&'static Arc<ProcessScheduler>> {
    let mut installed = false;
    let instance = INSTANCE.get_or_init(|| {
        installed = true;
        scheduler
    });

    if installed {
        info!("Global process scheduler installed");
        Ok(instance)
    } else {
        Err(SchedulerError::AlreadyInstalled)
    }
}

/// The installed scheduler, if any
pub fn instance() -> Option<&'static Arc<ProcessScheduler>> {
    INSTANCE.get()
}
