//! Build driver tests against a stubbed solc toolchain.

#![cfg(unix)]

use std::{fs, path::PathBuf};

use solbuild::{config::ProjectPathsConfig, Project, Solc};
use tempfile::TempDir;

/// A temp project with a stub `solc`/`solc-select` pair. The solc stub
/// reports version 0.8.0, emits a fixed combined-json document and appends
/// every compile invocation to a log file.
struct TestProject {
    _root: TempDir,
    project: Project,
    contracts: PathBuf,
    log: PathBuf,
}

impl TestProject {
    fn new() -> Self {
        let root = TempDir::new().unwrap();
        let contracts = root.path().join("contracts");
        let output = root.path().join("output");
        let bin = root.path().join("bin");
        fs::create_dir_all(&contracts).unwrap();
        fs::create_dir_all(&output).unwrap();
        fs::create_dir_all(&bin).unwrap();

        let log = root.path().join("solc-invocations.log");
        let solc = bin.join("solc");
        fs::write(
            &solc,
            format!(
                r#"#!/bin/sh
if [ "$1" = "--version" ]; then
  echo "solc, the solidity compiler commandline interface"
  echo "Version: 0.8.0+commit.c7dfd78e.Linux.g++"
  exit 0
fi
echo "$@" >> "{}"
echo "{{\"contracts\":{{}},\"version\":\"0.8.0\"}}"
"#,
                log.display()
            ),
        )
        .unwrap();
        let solc_select = bin.join("solc-select");
        fs::write(&solc_select, "#!/bin/sh\nexit 0\n").unwrap();
        for script in [&solc, &solc_select] {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(script, fs::Permissions::from_mode(0o755)).unwrap();
        }

        let paths = ProjectPathsConfig::new(&contracts, &output).unwrap();
        let mut project = Project::new(paths);
        project.solc = Solc { solc, solc_select };
        Self { _root: root, project, contracts, log }
    }

    fn add_source(&self, name: &str, content: &str) {
        fs::write(self.contracts.join(name), content).unwrap();
    }

    fn compile_invocations(&self) -> usize {
        fs::read_to_string(&self.log).map(|log| log.lines().count()).unwrap_or(0)
    }

    fn artifact(&self, name: &str) -> PathBuf {
        self.project.paths.artifact(name)
    }
}

fn simple_dapp() -> TestProject {
    let project = TestProject::new();
    project.add_source(
        "A.sol",
        "pragma solidity 0.8.0;\nimport \"./B.sol\";\ncontract A {}\n",
    );
    project.add_source("B.sol", "pragma solidity 0.8.0;\ncontract B {}\n");
    project
}

#[test]
fn compiles_every_file_once() {
    let project = simple_dapp();
    project.project.compile_all().unwrap();

    assert_eq!(project.compile_invocations(), 2);
    for name in ["A.sol", "B.sol"] {
        let artifact = project.artifact(name);
        assert!(artifact.exists());
        assert!(fs::metadata(&artifact).unwrap().len() > 0);
    }
}

#[test]
fn rerun_skips_existing_artifacts() {
    let project = simple_dapp();
    project.project.compile_all().unwrap();
    assert_eq!(project.compile_invocations(), 2);

    // everything already built, solc must not run again
    project.project.compile_all().unwrap();
    assert_eq!(project.compile_invocations(), 2);

    // a deleted artifact is rebuilt
    fs::remove_file(project.artifact("A.sol")).unwrap();
    project.project.compile_all().unwrap();
    assert_eq!(project.compile_invocations(), 3);

    // an empty artifact does not count as built
    fs::write(project.artifact("A.sol"), "").unwrap();
    project.project.compile_all().unwrap();
    assert_eq!(project.compile_invocations(), 4);
}

#[test]
fn leaf_driver_compiles_only_unimported_files() {
    let project = simple_dapp();
    project.project.compile_leaves().unwrap();

    // B is imported by A, so only A has fan-in zero
    assert_eq!(project.compile_invocations(), 1);
    assert!(project.artifact("A.sol").exists());
    assert!(!project.artifact("B.sol").exists());
}

#[test]
fn named_driver_compiles_exactly_one_file() {
    let project = simple_dapp();
    project.project.compile_contract("B").unwrap();

    assert_eq!(project.compile_invocations(), 1);
    assert!(project.artifact("B.sol").exists());
    assert!(!project.artifact("A.sol").exists());

    assert!(project.project.compile_contract("Nope").is_err());
}

#[test]
fn unknown_version_skips_file_but_not_run() {
    let project = TestProject::new();
    project.add_source("NoPragma.sol", "contract NoPragma {}\n");
    project.add_source("B.sol", "pragma solidity 0.8.0;\ncontract B {}\n");

    project.project.compile_all().unwrap();
    assert_eq!(project.compile_invocations(), 1);
    assert!(project.artifact("B.sol").exists());
    assert!(!project.artifact("NoPragma.sol").exists());
}

#[test]
fn version_mismatch_after_switch_skips_file_but_not_run() {
    let project = TestProject::new();
    // the stub toolchain only ever reports 0.8.0, so switching to 0.6.12
    // appears to succeed but does not take effect
    project.add_source("Old.sol", "pragma solidity 0.6.12;\ncontract Old {}\n");
    project.add_source("B.sol", "pragma solidity 0.8.0;\ncontract B {}\n");

    project.project.compile_all().unwrap();
    assert_eq!(project.compile_invocations(), 1);
    assert!(project.artifact("B.sol").exists());
    assert!(!project.artifact("Old.sol").exists());
}

#[test]
fn external_imports_become_remappings() {
    let project = TestProject::new();
    project.add_source(
        "A.sol",
        "pragma solidity 0.8.0;\nimport \"@lib/Token.sol\";\ncontract A {}\n",
    );

    project.project.compile_all().unwrap();
    // the library dir is created next to the input root
    assert!(project.project.paths.libraries.is_dir());
    let log = fs::read_to_string(&project.log).unwrap();
    let expected = format!("@lib={}", project.project.paths.libraries.join("@lib").display());
    assert!(log.contains(&expected), "expected remapping in {log}");
}

#[test]
fn packs_resolvable_files_and_abandons_broken_ones() {
    let project = simple_dapp();
    project.add_source(
        "C.sol",
        "pragma solidity 0.8.0;\nimport \"./missing.sol\";\ncontract C {}\n",
    );

    project.project.pack_all().unwrap();

    let packed_a = fs::read_to_string(project.project.paths.packed("A.sol")).unwrap();
    assert!(packed_a.contains("contract B {}"));
    assert!(packed_a.contains("contract A {}"));
    assert!(project.project.paths.packed("B.sol").exists());
    // C's import is unresolvable, so no packed output may exist for it
    assert!(!project.project.paths.packed("C.sol").exists());
}

#[test]
fn packing_abandons_circular_imports() {
    let project = TestProject::new();
    project.add_source(
        "Ping.sol",
        "pragma solidity 0.8.0;\nimport \"./Pong.sol\";\ncontract Ping {}\n",
    );
    project.add_source(
        "Pong.sol",
        "pragma solidity 0.8.0;\nimport \"./Ping.sol\";\ncontract Pong {}\n",
    );
    project.add_source("Solo.sol", "pragma solidity 0.8.0;\ncontract Solo {}\n");

    // the cycle must not take down the run, only its own packed output
    project.project.pack_all().unwrap();
    assert!(!project.project.paths.packed("Ping.sol").exists());
    assert!(!project.project.paths.packed("Pong.sol").exists());
    assert!(project.project.paths.packed("Solo.sol").exists());
}
