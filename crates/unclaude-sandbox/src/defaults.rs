//! Hardcoded denylists that every sandbox policy carries regardless of
//! preset (spec §3 Sandbox Policy: "The denied lists always contain
//! well-known secret locations ... and dangerous commands").

/// Secret-bearing paths denied in every profile.
pub const ALWAYS_DENIED_PATHS: &[&str] = &[
    "~/.ssh/*",
    "~/.gnupg/*",
    "~/.aws/*",
    "**/.env*",
    "**/*.pem",
    "**/id_rsa*",
];

/// Dangerous shell commands denied in every profile.
pub const ALWAYS_DENIED_COMMANDS: &[&str] = &[
    "rm -rf /*",
    "mkfs*",
    "dd if=/dev/*",
    ":(){:|:&};:",
    "sudo *",
    "curl * | bash",
];
