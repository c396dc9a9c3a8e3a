/*!
 * Process Core
 * Process and thread control blocks
 */

mod process;
mod thread;

pub use process::Process;
pub use thread::Thread;
