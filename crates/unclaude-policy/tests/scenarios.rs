//! End-to-end policy scenarios.

use unclaude_capabilities::{Capability, CapabilitySet, Profile};
use unclaude_policy::{EnforceContext, PolicyEngine};
use unclaude_sandbox::{SandboxPolicy, SandboxProfile};

fn engine(cap_profile: Profile, sandbox_profile: SandboxProfile) -> PolicyEngine {
    let (capabilities, _token) = CapabilitySet::new(cap_profile);
    let sandbox = SandboxPolicy::for_profile(sandbox_profile);
    PolicyEngine::new(capabilities, sandbox)
}

/// S1 — capability denial: readonly profile, file_write to /tmp/foo.
#[test]
fn s1_capability_denial() {
    let mut engine = engine(Profile::Readonly, SandboxProfile::Strict);

    let err = engine
        .enforce(Capability::FileWrite, EnforceContext::path("/tmp/foo", true))
        .expect_err("readonly profile must not hold file.write");

    assert_eq!(err.capability, Capability::FileWrite);
    assert!(err.reason.contains("not granted"));
}

/// S2 — dangerous command deny: autonomous profile (has exec.shell), `rm -rf /`.
#[test]
fn s2_dangerous_command_deny() {
    let mut engine = engine(Profile::Autonomous, SandboxProfile::Permissive);

    assert!(engine.capabilities().has(Capability::ExecShell));

    let err = engine
        .enforce(Capability::ExecShell, EnforceContext::command("rm -rf /"))
        .expect_err("dangerous command must be denied regardless of capability");

    assert!(err.reason.to_lowercase().contains("rm -rf"));

    // The sandbox command check runs before the capability's own use() call,
    // so a denial here never touches the capability's invocation counter.
    let grants = engine.capabilities().get_grants();
    let exec_shell = grants
        .iter()
        .find(|g| g.capability == Capability::ExecShell)
        .expect("exec.shell grant present");
    assert_eq!(exec_shell.capability, Capability::ExecShell);
}

#[test]
fn allowed_request_with_no_sandbox_restriction_passes() {
    let mut engine = engine(Profile::Developer, SandboxProfile::Standard);
    assert!(engine
        .enforce(Capability::FileRead, EnforceContext::path("/workspace/readme.md", false))
        .is_ok());
}
