//! Access checks for the device nodes we read from and inject into.

use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

pub const UINPUT_PATH: &str = "/dev/uinput";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionReport {
    pub unreadable: Vec<PathBuf>,
    pub uinput_writable: bool,
}

impl PermissionReport {
    pub fn is_granted(&self) -> bool {
        self.unreadable.is_empty() && self.uinput_writable
    }
}

pub struct Permissions {
    input_nodes: Vec<PathBuf>,
    uinput: PathBuf,
}

impl Permissions {
    pub fn new(input_nodes: Vec<PathBuf>) -> Self {
        Self {
            input_nodes,
            uinput: PathBuf::from(UINPUT_PATH),
        }
    }

    pub fn check(&self) -> PermissionReport {
        PermissionReport {
            unreadable: self
                .input_nodes
                .iter()
                .filter(|path| !can_access(path, libc::R_OK))
                .cloned()
                .collect(),
            uinput_writable: can_access(&self.uinput, libc::W_OK),
        }
    }

    pub fn is_trusted(&self) -> bool {
        self.check().is_granted()
    }

    /// Same as [`is_trusted`](Self::is_trusted), but tells the operator how
    /// to grant access when it is missing.
    pub fn is_trusted_with_prompt(&self) -> bool {
        let report = self.check();
        if !report.is_granted() {
            print_instructions(&report);
        }
        report.is_granted()
    }
}

fn can_access(path: &Path, mode: libc::c_int) -> bool {
    match CString::new(path.as_os_str().as_bytes()) {
        Ok(c_path) => unsafe { libc::access(c_path.as_ptr(), mode) == 0 },
        Err(_) => false,
    }
}

pub fn print_instructions(report: &PermissionReport) {
    println!("Input device permissions required!");
    println!();
    for path in &report.unreadable {
        println!("   cannot read {}", path.display());
    }
    if !report.uinput_writable {
        println!("   cannot write {}", UINPUT_PATH);
    }
    println!();
    println!("Steps to enable:");
    println!("   1. sudo usermod -aG input $USER");
    println!("   2. echo 'KERNEL==\"uinput\", GROUP=\"input\", MODE=\"0660\"' \\");
    println!("        | sudo tee /etc/udev/rules.d/99-threefingers.rules");
    println!("   3. sudo udevadm control --reload && sudo udevadm trigger");
    println!("   4. Log out and back in, then restart threefingers");
    println!();
}
