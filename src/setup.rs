//! Interactive permission setup.

use crate::permissions::{print_instructions, Permissions};
use std::thread;
use std::time::Duration;

const MAX_ATTEMPTS: u32 = 60;
const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Wait for the operator to grant device access. Returns true once granted.
pub fn run_setup(permissions: &Permissions) -> bool {
    println!("ThreeFingers setup");
    println!();

    let report = permissions.check();
    if report.is_granted() {
        println!("Permissions were already granted!");
        println!("Setup complete! ThreeFingers is ready to use.");
        return true;
    }

    print_instructions(&report);
    println!("Waiting for you to grant permissions...");
    println!("   (Press Ctrl+C to cancel)");

    for attempt in 1..=MAX_ATTEMPTS {
        thread::sleep(POLL_INTERVAL);
        if permissions.is_trusted() {
            println!("Permissions granted successfully!");
            println!();
            println!("Next steps:");
            println!("   - Test it: threefingers");
            println!("   - View help: threefingers --help");
            return true;
        }
        if attempt % 10 == 0 {
            println!("   Still waiting... ({}s remaining)", MAX_ATTEMPTS - attempt);
        }
    }

    println!("Timed out waiting for permissions.");
    println!("If you granted them, log out and back in, then run: threefingers setup");
    false
}
